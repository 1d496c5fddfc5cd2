use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    /// The input resource of a reader does not exist.
    #[error("Resource not found: {resource}")]
    ResourceNotFound {
        resource: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ItemReader from: {0}")]
    ItemReader(String),

    #[error("ItemProcessor from: {0}")]
    ItemProcessor(String),

    #[error("ItemWriter from: {0}")]
    ItemWriter(String),

    /// Error raised by the database, kept as is so callers can inspect it.
    #[cfg(feature = "rdbc-sqlite")]
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Configuration: {0}")]
    Configuration(String),
}
