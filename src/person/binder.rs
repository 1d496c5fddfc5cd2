use sqlx::Sqlite;

use super::Person;
use crate::item::rdbc::{DatabaseItemBinder, DatabaseQuery};

pub const INSERT_PERSON_SQL: &str =
    "INSERT INTO person(person_id, first_name, last_name, email, age) VALUES (?, ?, ?, ?, ?)";

/// Binds a [`Person`] to [`INSERT_PERSON_SQL`], one parameter per column in
/// statement order.
pub struct PersonBinder;

impl DatabaseItemBinder<Person, Sqlite> for PersonBinder {
    fn bind<'q>(
        &self,
        item: &'q Person,
        query: DatabaseQuery<'q, Sqlite>,
    ) -> DatabaseQuery<'q, Sqlite> {
        query
            .bind(item.id)
            .bind(item.first_name.as_str())
            .bind(item.last_name.as_str())
            .bind(item.email.as_str())
            .bind(item.age)
    }
}
