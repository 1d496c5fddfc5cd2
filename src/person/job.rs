use log::info;
use sqlx::{Pool, Sqlite};

use super::{Person, PersonBinder, PersonItemProcessor, INSERT_PERSON_SQL};
use crate::{
    config::ImportConfig,
    core::{
        job::{Job, JobBuilder, JobExecution},
        repository::JobRepository,
        step::StepBuilder,
    },
    item::{rdbc::SqliteItemWriterBuilder, xml::XmlItemReaderBuilder},
    BatchError,
};

/// Default name of the import job.
pub const JOB_NAME: &str = "importPersonJob";

/// Name of the single step of the import job.
pub const STEP_NAME: &str = "step1";

/// Runs the person import once: every `person` fragment of the input document
/// is inserted into the `person` table, `chunk_size` records per transaction.
///
/// The run gets a new run id from `repository` and its outcome is recorded
/// there. On failure the error of the failing stage is returned unchanged;
/// chunks committed before the failure stay in the table.
///
/// Must be called from a multi-thread Tokio runtime.
pub fn run_import_person_job(
    config: &ImportConfig,
    pool: &Pool<Sqlite>,
    repository: &dyn JobRepository,
) -> Result<JobExecution, BatchError> {
    config.validate()?;

    info!(
        "Importing persons from {} into {}",
        config.input_path.display(),
        config.database_url
    );

    let reader = XmlItemReaderBuilder::<Person>::new()
        .tag(&config.fragment_tag)
        .from_path(&config.input_path);

    let processor = PersonItemProcessor;

    let writer = SqliteItemWriterBuilder::<Person>::new()
        .pool(pool)
        .sql(INSERT_PERSON_SQL)
        .item_binder(&PersonBinder)
        .build()?;

    let step = StepBuilder::new(STEP_NAME)
        .chunk::<Person, Person>(usize::from(config.chunk_size))
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .build()?;

    let job = JobBuilder::new()
        .name(config.job_name.clone())
        .repository(repository)
        .start(&step)
        .build();

    job.run()
}
