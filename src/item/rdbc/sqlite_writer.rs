use std::cell::RefCell;

use log::{debug, error};
use sqlx::{pool::PoolConnection, Connection, Pool, Sqlite, SqliteConnection};

use crate::core::item::{ItemWriter, ItemWriterResult};
use crate::core::block_on;
use crate::item::rdbc::DatabaseItemBinder;
use crate::BatchError;

/// Builds `INSERT INTO table(c1, c2) VALUES (?, ?)` for the given columns.
pub fn insert_statement(table: &str, columns: &[&str]) -> String {
    format!(
        "INSERT INTO {}({}) VALUES ({})",
        table,
        columns.join(", "),
        vec!["?"; columns.len()].join(", ")
    )
}

/// A writer inserting items into a SQLite database using SQLx.
///
/// # Design
///
/// - Executes one parameterized statement per item, parameters filled by a
///   [`DatabaseItemBinder`]
/// - Every call to `write` runs in its own transaction: the chunk is committed as
///   a whole, or rolled back and the error returned
/// - Between `open` and `close` all chunks run on the same pooled connection;
///   outside of them each `write` borrows a connection for its own duration
/// - Database errors (constraint violations, lost connections) are returned as
///   [`BatchError::Database`] without translation; there is no upsert
pub struct SqliteItemWriter<'a, O> {
    pool: &'a Pool<Sqlite>,
    sql: String,
    item_binder: &'a dyn DatabaseItemBinder<O, Sqlite>,
    connection: RefCell<Option<PoolConnection<Sqlite>>>,
}

impl<O> SqliteItemWriter<'_, O> {
    /// The statement executed for every item.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    async fn insert_chunk(
        &self,
        connection: &mut SqliteConnection,
        items: &[O],
    ) -> Result<(), sqlx::Error> {
        let mut tx = Connection::begin(connection).await?;

        for item in items {
            self.item_binder
                .bind(item, sqlx::query(&self.sql))
                .execute(&mut *tx)
                .await?;
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit().await
    }
}

impl<O> ItemWriter<O> for SqliteItemWriter<'_, O> {
    fn write(&self, items: &[O]) -> ItemWriterResult {
        if items.is_empty() {
            return Ok(());
        }

        let mut held = self.connection.borrow_mut();

        let result = block_on(async {
            let mut transient;
            let connection: &mut SqliteConnection = match held.as_mut() {
                Some(connection) => &mut **connection,
                None => {
                    transient = self.pool.acquire().await?;
                    &mut *transient
                }
            };
            self.insert_chunk(connection, items).await
        })?;

        match result {
            Ok(()) => {
                debug!("Successfully wrote {} items with: {}", items.len(), self.sql);
                Ok(())
            }
            Err(e) => {
                error!("Failed to write {} items with {}: {}", items.len(), self.sql, e);
                Err(BatchError::Database(e))
            }
        }
    }

    /// Acquires the connection used by every chunk until `close`.
    fn open(&self) -> ItemWriterResult {
        let connection = block_on(self.pool.acquire())??;
        *self.connection.borrow_mut() = Some(connection);
        debug!("SQLite writer opened");
        Ok(())
    }

    /// Returns the connection to the pool.
    fn close(&self) -> ItemWriterResult {
        self.connection.borrow_mut().take();
        debug!("SQLite writer closed");
        Ok(())
    }
}

/// Builder for [`SqliteItemWriter`].
///
/// The statement is either given as is with `sql`, or generated from `table`
/// and the columns added with `add_column`.
///
/// ```no_run
/// use batch_xml_to_db::item::rdbc::{DatabaseItemBinder, DatabaseQuery, SqliteItemWriterBuilder};
/// use sqlx::{Sqlite, SqlitePool};
///
/// struct Product {
///     id: i32,
///     name: String,
/// }
///
/// struct ProductBinder;
///
/// impl DatabaseItemBinder<Product, Sqlite> for ProductBinder {
///     fn bind<'q>(&self, item: &'q Product, query: DatabaseQuery<'q, Sqlite>) -> DatabaseQuery<'q, Sqlite> {
///         query.bind(item.id).bind(item.name.as_str())
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = SqlitePool::connect("sqlite://products.db").await?;
///
/// let writer = SqliteItemWriterBuilder::<Product>::new()
///     .pool(&pool)
///     .table("products")
///     .add_column("id")
///     .add_column("name")
///     .item_binder(&ProductBinder)
///     .build()?;
///
/// assert_eq!(writer.sql(), "INSERT INTO products(id, name) VALUES (?, ?)");
/// # Ok(())
/// # }
/// ```
pub struct SqliteItemWriterBuilder<'a, O> {
    pool: Option<&'a Pool<Sqlite>>,
    sql: Option<String>,
    table: Option<&'a str>,
    columns: Vec<&'a str>,
    item_binder: Option<&'a dyn DatabaseItemBinder<O, Sqlite>>,
}

impl<O> Default for SqliteItemWriterBuilder<'_, O> {
    fn default() -> Self {
        Self {
            pool: None,
            sql: None,
            table: None,
            columns: Vec::new(),
            item_binder: None,
        }
    }
}

impl<'a, O> SqliteItemWriterBuilder<'a, O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database connection pool for the writer. Required.
    pub fn pool(mut self, pool: &'a Pool<Sqlite>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Sets the statement executed for every item. Takes precedence over `table`.
    pub fn sql(mut self, sql: &str) -> Self {
        self.sql = Some(sql.to_string());
        self
    }

    pub fn table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    /// Adds a column to the generated statement. Columns are bound in the order
    /// they are added.
    pub fn add_column(mut self, column: &'a str) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the item binder for the writer. Required.
    pub fn item_binder(mut self, item_binder: &'a dyn DatabaseItemBinder<O, Sqlite>) -> Self {
        self.item_binder = Some(item_binder);
        self
    }

    pub fn build(self) -> Result<SqliteItemWriter<'a, O>, BatchError> {
        let pool = self
            .pool
            .ok_or_else(|| BatchError::Configuration("Pool is mandatory".to_string()))?;

        let item_binder = self
            .item_binder
            .ok_or_else(|| BatchError::Configuration("Item binder is mandatory".to_string()))?;

        let sql = match self.sql {
            Some(sql) => sql,
            None => {
                let table = self.table.ok_or_else(|| {
                    BatchError::Configuration("Either sql or table is mandatory".to_string())
                })?;

                if self.columns.is_empty() {
                    return Err(BatchError::Configuration(
                        "One or more columns are required".to_string(),
                    ));
                }

                insert_statement(table, &self.columns)
            }
        };

        Ok(SqliteItemWriter {
            pool,
            sql,
            item_binder,
            connection: RefCell::new(None),
        })
    }
}
