use sqlx::{query::Query, Database};

/// This module contains the SQLite writer implementation.
pub mod sqlite_writer;

/// A parameterized statement ready to receive bind values.
pub type DatabaseQuery<'q, DB> = Query<'q, DB, <DB as Database>::Arguments<'q>>;

/// Trait for binding item data to the parameters of a statement.
///
/// Parameters are positional: the n-th call to `bind` fills the n-th `?`
/// placeholder of the statement. The trait is generic over the SQLx database
/// type so a binder can be written once per item type and database.
///
/// # Example
///
/// ```no_run
/// use batch_xml_to_db::item::rdbc::{DatabaseItemBinder, DatabaseQuery};
/// use sqlx::Sqlite;
///
/// struct User {
///     id: i32,
///     name: String,
/// }
///
/// struct UserBinder;
///
/// impl DatabaseItemBinder<User, Sqlite> for UserBinder {
///     fn bind<'q>(&self, item: &'q User, query: DatabaseQuery<'q, Sqlite>) -> DatabaseQuery<'q, Sqlite> {
///         query.bind(item.id).bind(item.name.as_str())
///     }
/// }
/// ```
pub trait DatabaseItemBinder<O, DB: Database> {
    /// Binds the properties of an item to the statement parameters, in order.
    ///
    /// # Arguments
    ///
    /// * `item` - The item whose properties should be bound.
    /// * `query` - The statement to bind parameters to.
    fn bind<'q>(&self, item: &'q O, query: DatabaseQuery<'q, DB>) -> DatabaseQuery<'q, DB>;
}

pub use sqlite_writer::{insert_statement, SqliteItemWriter, SqliteItemWriterBuilder};
