//! Person records imported from XML into the `person` table.
//!
//! A `person` fragment carries its fields as child elements or attributes:
//!
//! ```xml
//! <person>
//!     <id>1</id>
//!     <firstName>Ann</firstName>
//!     <lastName>Lee</lastName>
//!     <email>ann@example.com</email>
//!     <age>30</age>
//! </person>
//! <person id="2" firstName="Bob" lastName="Ray" email="bob@example.com" age="41"/>
//! ```

use serde::Deserialize;

/// Binds person fields to the `person` INSERT statement.
pub mod binder;

/// Assembly of the `importPersonJob` job.
pub mod job;

/// Identity processor for persons.
pub mod processor;

pub use binder::{PersonBinder, INSERT_PERSON_SQL};
pub use job::{run_import_person_job, JOB_NAME, STEP_NAME};
pub use processor::PersonItemProcessor;

/// A person record, as read from one `person` fragment.
///
/// Every field is required; a fragment missing one fails the read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(alias = "personId", alias = "@id", alias = "@personId")]
    pub id: i32,
    #[serde(alias = "@firstName")]
    pub first_name: String,
    #[serde(alias = "@lastName")]
    pub last_name: String,
    #[serde(alias = "@email")]
    pub email: String,
    #[serde(alias = "@age")]
    pub age: i32,
}

#[cfg(test)]
mod tests {
    use super::Person;
    use crate::core::item::ItemReader;
    use crate::item::xml::XmlItemReaderBuilder;
    use crate::BatchError;

    fn read_all(xml: &'static str) -> Result<Vec<Person>, BatchError> {
        let reader = XmlItemReaderBuilder::<Person>::new()
            .tag("person")
            .from_reader(xml.as_bytes());

        let mut persons = Vec::new();
        while let Some(person) = reader.read()? {
            persons.push(person);
        }
        Ok(persons)
    }

    fn ann() -> Person {
        Person {
            id: 1,
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: "ann@example.com".to_string(),
            age: 30,
        }
    }

    #[test]
    fn reads_child_elements() {
        let persons = read_all(
            r#"<persons>
                <person>
                    <id>1</id>
                    <firstName>Ann</firstName>
                    <lastName>Lee</lastName>
                    <email>ann@example.com</email>
                    <age>30</age>
                </person>
            </persons>"#,
        )
        .unwrap();

        assert_eq!(persons, vec![ann()]);
    }

    #[test]
    fn reads_attributes() {
        let persons = read_all(
            r#"<persons>
                <person id="1" firstName="Ann" lastName="Lee" email="ann@example.com" age="30"/>
            </persons>"#,
        )
        .unwrap();

        assert_eq!(persons, vec![ann()]);
    }

    #[test]
    fn accepts_person_id_alias() {
        let persons = read_all(
            r#"<persons><person><personId>1</personId><firstName>Ann</firstName><lastName>Lee</lastName><email>ann@example.com</email><age>30</age></person></persons>"#,
        )
        .unwrap();

        assert_eq!(persons, vec![ann()]);
    }

    #[test]
    fn keeps_spaces_between_entity_references() {
        let persons = read_all(
            r#"<persons><person><id>1</id><firstName>Ann</firstName><lastName>Smith &amp; &amp; Jones</lastName><email>&lt; &gt;</email><age>30</age></person></persons>"#,
        )
        .unwrap();

        assert_eq!(persons[0].last_name, "Smith & & Jones");
        assert_eq!(persons[0].email, "< >");
    }

    #[test]
    fn malformed_attributes_are_errors() {
        let duplicate = read_all(
            r#"<persons><person id="1" id="2" firstName="Ann" lastName="Lee" email="ann@example.com" age="30"/></persons>"#,
        );
        assert!(matches!(duplicate, Err(BatchError::ItemReader(_))));

        let unquoted = read_all(
            r#"<persons><person id=1><id>5</id><firstName>Ann</firstName><lastName>Lee</lastName><email>ann@example.com</email><age>30</age></person></persons>"#,
        );
        assert!(matches!(unquoted, Err(BatchError::ItemReader(_))));
    }

    #[test]
    fn missing_field_is_an_error() {
        let result = read_all(
            r#"<persons><person><id>1</id><firstName>Ann</firstName><lastName>Lee</lastName><age>30</age></person></persons>"#,
        );

        assert!(matches!(result, Err(BatchError::ItemReader(_))));
    }

    #[test]
    fn non_numeric_age_is_an_error() {
        let result = read_all(
            r#"<persons><person><id>1</id><firstName>Ann</firstName><lastName>Lee</lastName><email>ann@example.com</email><age>thirty</age></person></persons>"#,
        );

        assert!(matches!(result, Err(BatchError::ItemReader(_))));
    }
}
