use log::debug;

use super::Person;
use crate::core::item::{ItemProcessor, ItemProcessorResult};

/// Processor handing every person to the writer unchanged.
#[derive(Default)]
pub struct PersonItemProcessor;

impl ItemProcessor<Person, Person> for PersonItemProcessor {
    fn process(&self, item: Person) -> ItemProcessorResult<Person> {
        debug!("Processing person {}", item.id);
        Ok(item)
    }
}
