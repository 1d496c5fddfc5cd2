//! Mock version of a person writer
use batch_xml_to_db::{
    core::item::{ItemWriter, ItemWriterResult},
    person::Person,
};
use mockall::mock;

mock! {
    pub PersonWriter {}
    impl ItemWriter<Person> for PersonWriter {
        fn write(&self, items: &[Person]) -> ItemWriterResult;
    }
}
