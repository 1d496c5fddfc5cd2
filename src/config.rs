use std::path::PathBuf;

use crate::BatchError;

/// Settings of the person import job.
///
/// Values start from [`ImportConfig::default`] and are overridden by the
/// environment:
///
/// | Variable                   | Field        | Default               |
/// |----------------------------|--------------|-----------------------|
/// | `DATABASE_URL`             | database_url | `sqlite://persons.db` |
/// | `PERSON_BATCH_INPUT`       | input_path   | `resources/persons.xml` |
/// | `PERSON_BATCH_FRAGMENT`    | fragment_tag | `person`              |
/// | `PERSON_BATCH_CHUNK_SIZE`  | chunk_size   | `1`                   |
/// | `PERSON_BATCH_JOB_NAME`    | job_name     | `importPersonJob`     |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub database_url: String,
    pub input_path: PathBuf,
    pub fragment_tag: String,
    pub chunk_size: u16,
    pub job_name: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://persons.db".to_string(),
            input_path: PathBuf::from("resources/persons.xml"),
            fragment_tag: "person".to_string(),
            chunk_size: 1,
            job_name: "importPersonJob".to_string(),
        }
    }
}

impl ImportConfig {
    pub fn from_env() -> Result<Self, BatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(database_url) = lookup("DATABASE_URL") {
            config.database_url = database_url;
        }

        if let Some(input) = lookup("PERSON_BATCH_INPUT") {
            config.input_path = PathBuf::from(input);
        }

        if let Some(tag) = lookup("PERSON_BATCH_FRAGMENT") {
            if tag.trim().is_empty() {
                return Err(BatchError::Configuration(
                    "Invalid fragment tag: empty".to_string(),
                ));
            }
            config.fragment_tag = tag;
        }

        if let Some(chunk_size) = lookup("PERSON_BATCH_CHUNK_SIZE") {
            config.chunk_size = chunk_size.trim().parse().map_err(|e| {
                BatchError::Configuration(format!("Invalid chunk_size: {e}"))
            })?;
        }

        if let Some(job_name) = lookup("PERSON_BATCH_JOB_NAME") {
            config.job_name = job_name;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(
                "Invalid chunk_size: must be greater than 0".to_string(),
            ));
        }
        if self.job_name.is_empty() {
            return Err(BatchError::Configuration(
                "Invalid job_name: empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ImportConfig, BatchError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ImportConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config, ImportConfig::default());
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.fragment_tag, "person");
    }

    #[test]
    fn overrides_from_environment() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PERSON_BATCH_INPUT", "/tmp/people.xml"),
            ("PERSON_BATCH_CHUNK_SIZE", "50"),
            ("PERSON_BATCH_JOB_NAME", "nightlyImport"),
        ])
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.input_path, PathBuf::from("/tmp/people.xml"));
        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.job_name, "nightlyImport");
    }

    #[test]
    fn rejects_invalid_chunk_size() {
        for value in ["0", "-1", "ten"] {
            let result = config_from(&[("PERSON_BATCH_CHUNK_SIZE", value)]);
            assert!(
                matches!(result, Err(BatchError::Configuration(_))),
                "chunk size {value} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_empty_fragment_tag() {
        let result = config_from(&[("PERSON_BATCH_FRAGMENT", "  ")]);
        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }
}
