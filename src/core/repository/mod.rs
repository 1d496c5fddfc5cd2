use std::{cell::RefCell, fmt, str::FromStr};

use crate::BatchError;

/// Job repository stored in a SQLite database.
#[cfg(feature = "rdbc-sqlite")]
pub mod sqlite;

#[cfg(feature = "rdbc-sqlite")]
pub use sqlite::SqliteJobRepository;

/// Status of a job execution.
///
/// A run starts in `Starting`, moves to `Started` once it has been assigned a
/// run id and ends in one of the terminal statuses `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Status of a job prior to its execution.
    Starting,
    /// Status of a job that is running.
    Started,
    /// The job has successfully completed its execution.
    Completed,
    /// The job has failed during its execution.
    Failed,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Starting => "STARTING",
            BatchStatus::Started => "STARTED",
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STARTING" => Ok(BatchStatus::Starting),
            "STARTED" => Ok(BatchStatus::Started),
            "COMPLETED" => Ok(BatchStatus::Completed),
            "FAILED" => Ok(BatchStatus::Failed),
            other => Err(BatchError::Configuration(format!(
                "Unknown batch status: {}",
                other
            ))),
        }
    }
}

/// A job execution as stored by a [`JobRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobExecutionRecord {
    pub run_id: i64,
    pub job_name: String,
    pub status: BatchStatus,
    /// Message of the error that failed the run
    pub exit_message: Option<String>,
}

/// Storage of job executions.
///
/// The repository hands out run ids: every call to `create_job_execution`
/// returns an id that has never been returned before, greater than all
/// previous ones.
pub trait JobRepository {
    /// Registers a new run of `job_name` with status `Started` and returns its run id.
    fn create_job_execution(&self, job_name: &str) -> Result<i64, BatchError>;

    fn update_job_execution(
        &self,
        run_id: i64,
        status: BatchStatus,
        exit_message: Option<&str>,
    ) -> Result<(), BatchError>;

    fn find_job_execution(&self, run_id: i64) -> Result<Option<JobExecutionRecord>, BatchError>;

    /// Returns the most recent run of `job_name`.
    fn last_job_execution(&self, job_name: &str)
        -> Result<Option<JobExecutionRecord>, BatchError>;
}

/// Repository keeping executions in memory for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryJobRepository {
    executions: RefCell<Vec<JobExecutionRecord>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobRepository for InMemoryJobRepository {
    fn create_job_execution(&self, job_name: &str) -> Result<i64, BatchError> {
        let mut executions = self.executions.borrow_mut();
        let run_id = executions.last().map_or(1, |last| last.run_id + 1);

        executions.push(JobExecutionRecord {
            run_id,
            job_name: job_name.to_string(),
            status: BatchStatus::Started,
            exit_message: None,
        });

        Ok(run_id)
    }

    fn update_job_execution(
        &self,
        run_id: i64,
        status: BatchStatus,
        exit_message: Option<&str>,
    ) -> Result<(), BatchError> {
        let mut executions = self.executions.borrow_mut();
        let execution = executions
            .iter_mut()
            .find(|execution| execution.run_id == run_id)
            .ok_or_else(|| {
                BatchError::Configuration(format!("Unknown job execution: {}", run_id))
            })?;

        execution.status = status;
        execution.exit_message = exit_message.map(str::to_string);

        Ok(())
    }

    fn find_job_execution(&self, run_id: i64) -> Result<Option<JobExecutionRecord>, BatchError> {
        Ok(self
            .executions
            .borrow()
            .iter()
            .find(|execution| execution.run_id == run_id)
            .cloned())
    }

    fn last_job_execution(
        &self,
        job_name: &str,
    ) -> Result<Option<JobExecutionRecord>, BatchError> {
        Ok(self
            .executions
            .borrow()
            .iter()
            .rev()
            .find(|execution| execution.job_name == job_name)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_increase_and_are_never_reused() {
        let repository = InMemoryJobRepository::new();

        let first = repository.create_job_execution("importPersonJob").unwrap();
        let second = repository.create_job_execution("importPersonJob").unwrap();
        let other = repository.create_job_execution("otherJob").unwrap();

        assert_eq!(first, 1);
        assert!(second > first);
        assert!(other > second);
    }

    #[test]
    fn update_records_terminal_status() {
        let repository = InMemoryJobRepository::new();
        let run_id = repository.create_job_execution("importPersonJob").unwrap();

        let started = repository.find_job_execution(run_id).unwrap().unwrap();
        assert_eq!(started.status, BatchStatus::Started);

        repository
            .update_job_execution(run_id, BatchStatus::Failed, Some("boom"))
            .unwrap();

        let failed = repository.find_job_execution(run_id).unwrap().unwrap();
        assert_eq!(failed.status, BatchStatus::Failed);
        assert_eq!(failed.exit_message.as_deref(), Some("boom"));
    }

    #[test]
    fn last_execution_is_per_job_name() {
        let repository = InMemoryJobRepository::new();
        repository.create_job_execution("a").unwrap();
        let last_a = repository.create_job_execution("a").unwrap();
        repository.create_job_execution("b").unwrap();

        let record = repository.last_job_execution("a").unwrap().unwrap();
        assert_eq!(record.run_id, last_a);
        assert!(repository.last_job_execution("c").unwrap().is_none());
    }

    #[test]
    fn updating_unknown_run_fails() {
        let repository = InMemoryJobRepository::new();

        let result = repository.update_job_execution(42, BatchStatus::Completed, None);

        assert!(result.is_err());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            BatchStatus::Starting,
            BatchStatus::Started,
            BatchStatus::Completed,
            BatchStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<BatchStatus>().unwrap(), status);
        }
        assert!("RUNNING".parse::<BatchStatus>().is_err());
        assert!(BatchStatus::Failed.is_terminal());
        assert!(!BatchStatus::Started.is_terminal());
    }
}
