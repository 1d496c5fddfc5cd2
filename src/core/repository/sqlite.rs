use log::debug;
use sqlx::{Pool, Sqlite};

use super::{BatchStatus, JobExecutionRecord, JobRepository};
use crate::{core::block_on, BatchError};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS batch_job_execution (
    run_id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_name TEXT NOT NULL,
    status TEXT NOT NULL,
    exit_message TEXT,
    start_time TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    end_time TEXT
)
"#;

type ExecutionRow = (i64, String, String, Option<String>);

/// A [`JobRepository`] persisting executions in the `batch_job_execution` table.
///
/// Run ids come from an `AUTOINCREMENT` key, so an id is never handed out twice
/// for the lifetime of the database, across process restarts included.
pub struct SqliteJobRepository<'a> {
    pool: &'a Pool<Sqlite>,
}

impl<'a> SqliteJobRepository<'a> {
    pub fn new(pool: &'a Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Creates the `batch_job_execution` table if it does not exist yet.
    pub fn initialize(&self) -> Result<(), BatchError> {
        block_on(sqlx::query(CREATE_TABLE).execute(self.pool))??;
        debug!("Job repository table ready");
        Ok(())
    }

    fn to_record(row: ExecutionRow) -> Result<JobExecutionRecord, BatchError> {
        let (run_id, job_name, status, exit_message) = row;
        Ok(JobExecutionRecord {
            run_id,
            job_name,
            status: status.parse()?,
            exit_message,
        })
    }
}

impl JobRepository for SqliteJobRepository<'_> {
    fn create_job_execution(&self, job_name: &str) -> Result<i64, BatchError> {
        let result = block_on(
            sqlx::query("INSERT INTO batch_job_execution(job_name, status) VALUES (?, ?)")
                .bind(job_name)
                .bind(BatchStatus::Started.as_str())
                .execute(self.pool),
        )??;

        Ok(result.last_insert_rowid())
    }

    fn update_job_execution(
        &self,
        run_id: i64,
        status: BatchStatus,
        exit_message: Option<&str>,
    ) -> Result<(), BatchError> {
        let end_time = if status.is_terminal() {
            "CURRENT_TIMESTAMP"
        } else {
            "NULL"
        };
        let sql = format!(
            "UPDATE batch_job_execution SET status = ?, exit_message = ?, end_time = {} WHERE run_id = ?",
            end_time
        );

        let result = block_on(
            sqlx::query(&sql)
                .bind(status.as_str())
                .bind(exit_message)
                .bind(run_id)
                .execute(self.pool),
        )??;

        if result.rows_affected() == 0 {
            return Err(BatchError::Configuration(format!(
                "Unknown job execution: {}",
                run_id
            )));
        }

        Ok(())
    }

    fn find_job_execution(&self, run_id: i64) -> Result<Option<JobExecutionRecord>, BatchError> {
        let row: Option<ExecutionRow> = block_on(
            sqlx::query_as(
                "SELECT run_id, job_name, status, exit_message FROM batch_job_execution WHERE run_id = ?",
            )
            .bind(run_id)
            .fetch_optional(self.pool),
        )??;

        row.map(Self::to_record).transpose()
    }

    fn last_job_execution(
        &self,
        job_name: &str,
    ) -> Result<Option<JobExecutionRecord>, BatchError> {
        let row: Option<ExecutionRow> = block_on(
            sqlx::query_as(
                "SELECT run_id, job_name, status, exit_message FROM batch_job_execution \
                 WHERE job_name = ? ORDER BY run_id DESC LIMIT 1",
            )
            .bind(job_name)
            .fetch_optional(self.pool),
        )??;

        row.map(Self::to_record).transpose()
    }
}
