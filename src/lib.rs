#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 # Batch XML to DB

 A chunk-oriented batch that imports person records from an XML document into a
 SQLite table, built on the classic batch building blocks: a job made of steps,
 each step reading, processing and writing items chunk by chunk.

 ## Core Concepts

- **Job:** The entire batch process. Every run of a `Job` gets a new run id from a `JobRepository`, which also records whether the run completed or failed.
- **Step:** An independent, sequential phase of a job. The chunk-oriented step reads items, processes them and hands them to the writer a chunk at a time.
- **ItemReader:** Retrieval of the input of a step, one item at a time.
- **ItemProcessor:** The business logic applied to each item between reading and writing.
- **ItemWriter:** The output of a step, one chunk of items at a time. The SQLite writer commits one transaction per chunk.

 ## Features

| **Feature**   | **Description**                                               |
|---------------|---------------------------------------------------------------|
| xml           | Enables the XML `ItemReader`                                  |
| rdbc-sqlite   | Enables the SQLite `ItemWriter` and job repository            |
| full          | Enables all available features and the person import job     |

 ## Getting Started

```rust,no_run
# use batch_xml_to_db::{
#     config::ImportConfig,
#     core::repository::SqliteJobRepository,
#     person::run_import_person_job,
# };
# use sqlx::sqlite::SqlitePoolOptions;
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ImportConfig::from_env()?;

    let pool = SqlitePoolOptions::new()
        .connect(&config.database_url)
        .await?;

    let repository = SqliteJobRepository::new(&pool);
    repository.initialize()?;

    let execution = run_import_person_job(&config, &pool, &repository)?;
    println!("run {} is {}", execution.run_id, execution.status);

    Ok(())
}
```

 */

/// Settings of the import job, read from the environment
pub mod config;

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Item readers and writers (XML reader, SQLite writer)
pub mod item;

#[cfg(all(feature = "xml", feature = "rdbc-sqlite"))]
/// The person import: record type, processor, statement binder and job.
pub mod person;
