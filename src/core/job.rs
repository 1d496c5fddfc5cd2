use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::BatchError;

use super::{
    build_name,
    repository::{BatchStatus, InMemoryJobRepository, JobRepository},
    step::{Step, StepExecution},
};

/// Type alias for job execution results.
///
/// A `JobResult` is a `Result` that contains either:
/// - A successful `JobExecution` with execution details
/// - The `BatchError` that failed the run, as raised by the failing component
type JobResult<T> = Result<T, BatchError>;

/// Represents a job that can be executed.
///
/// A job is a container for a sequence of steps executed in order. Every call to
/// `run` is a new run with its own run id.
pub trait Job {
    /// Runs the job and returns the result of the job execution.
    ///
    /// # Returns
    /// - `Ok(JobExecution)` when every step completed
    /// - `Err(BatchError)` with the error of the failing step; the run is
    ///   recorded as `Failed` in the job repository
    ///
    /// A failed run returns no `JobExecution`: its record in the job
    /// repository (status and error text) is the only trace kept of it, and the
    /// failing step's status and counts are only logged.
    fn run(&self) -> JobResult<JobExecution>;
}

/// Represents a completed run of a job.
///
/// Only successful runs produce one, so `status` is always `Completed`; failed
/// runs are looked up through [`JobRepository::find_job_execution`].
#[derive(Debug)]
pub struct JobExecution {
    /// Run id assigned by the job repository, unique per execution
    pub run_id: i64,
    pub job_name: String,
    pub status: BatchStatus,
    /// The time when the job started executing
    pub start: Instant,
    /// The time when the job finished executing
    pub end: Instant,
    /// The total duration of the job execution
    pub duration: Duration,
    /// Executions of the job's steps, in execution order
    pub step_executions: Vec<StepExecution>,
}

/// Represents an instance of a job.
///
/// It contains a name, the steps to be executed and the repository recording
/// its runs.
pub struct JobInstance<'a> {
    /// Human-readable name for the job
    name: String,
    /// Collection of steps that make up this job, in execution order
    steps: Vec<&'a dyn Step>,
    repository: Option<&'a dyn JobRepository>,
    default_repository: InMemoryJobRepository,
}

impl JobInstance<'_> {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// The repository recording the runs of this job.
    pub fn repository(&self) -> &dyn JobRepository {
        match self.repository {
            Some(repository) => repository,
            None => &self.default_repository,
        }
    }

    fn fail(&self, run_id: i64, error: &BatchError) {
        error!("Job {} (run id: {}) failed: {}", self.name, run_id, error);

        if let Err(update_error) =
            self.repository()
                .update_job_execution(run_id, BatchStatus::Failed, Some(&error.to_string()))
        {
            warn!(
                "Unable to record failure of job {} (run id: {}): {}",
                self.name, run_id, update_error
            );
        }
    }
}

impl Job for JobInstance<'_> {
    fn run(&self) -> JobResult<JobExecution> {
        let start = Instant::now();

        let run_id = self.repository().create_job_execution(&self.name)?;

        info!("Start of job: {}, run id: {}", self.name, run_id);

        let mut step_executions = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let mut step_execution = StepExecution::new(step.get_name());
            let result = step.execute(&mut step_execution);
            step_executions.push(step_execution);

            if let Err(error) = result {
                self.fail(run_id, &error);
                return Err(error);
            }
        }

        if let Err(error) =
            self.repository()
                .update_job_execution(run_id, BatchStatus::Completed, None)
        {
            self.fail(run_id, &error);
            return Err(error);
        }

        info!("End of job: {}, run id: {}", self.name, run_id);

        Ok(JobExecution {
            run_id,
            job_name: self.name.clone(),
            status: BatchStatus::Completed,
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            step_executions,
        })
    }
}

/// Builder for creating a job instance.
///
/// # Example
///
/// ```rust,no_run,compile_fail
/// use batch_xml_to_db::core::job::JobBuilder;
///
/// let job = JobBuilder::new()
///     .name("importPersonJob".to_string())
///     .repository(&repository)
///     .start(&step)
///     .build();
/// ```
#[derive(Default)]
pub struct JobBuilder<'a> {
    /// Optional name for the job (generated randomly if not specified)
    name: Option<String>,
    /// Collection of steps to be executed, in order
    steps: Vec<&'a dyn Step>,
    repository: Option<&'a dyn JobRepository>,
}

impl<'a> JobBuilder<'a> {
    pub fn new() -> Self {
        Self {
            name: None,
            steps: Vec::new(),
            repository: None,
        }
    }

    pub fn name(mut self, name: String) -> JobBuilder<'a> {
        self.name = Some(name);
        self
    }

    /// Sets the repository recording runs and handing out run ids.
    ///
    /// Without one, runs are recorded in memory by the job instance itself.
    pub fn repository(mut self, repository: &'a dyn JobRepository) -> JobBuilder<'a> {
        self.repository = Some(repository);
        self
    }

    /// Sets the first step of the job.
    pub fn start(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    /// Adds a step to the job. Steps are executed in the order they are added.
    pub fn next(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    pub fn build(self) -> JobInstance<'a> {
        JobInstance {
            name: self.name.unwrap_or_else(build_name),
            steps: self.steps,
            repository: self.repository,
            default_repository: InMemoryJobRepository::new(),
        }
    }
}
