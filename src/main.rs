use std::str::FromStr;

use anyhow::Context;
use batch_xml_to_db::{
    config::ImportConfig, core::repository::SqliteJobRepository, person::run_import_person_job,
};
use env_logger::Env;
use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ImportConfig::from_env()?;

    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("Invalid DATABASE_URL: {}", config.database_url))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to connect to {}", config.database_url))?;

    let repository = SqliteJobRepository::new(&pool);
    repository.initialize()?;

    let result = run_import_person_job(&config, &pool, &repository);

    pool.close().await;

    match result {
        Ok(execution) => {
            let written: usize = execution
                .step_executions
                .iter()
                .map(|step| step.write_count)
                .sum();
            info!(
                "Job {} (run id: {}) {} in {:?}: {} persons written",
                execution.job_name, execution.run_id, execution.status, execution.duration, written
            );
            Ok(())
        }
        Err(e) => {
            error!("Job {} failed: {}", config.job_name, e);
            Err(e.into())
        }
    }
}
