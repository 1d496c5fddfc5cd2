use rand::distr::{Alphanumeric, SampleString};

pub mod item;

pub mod job;

pub mod repository;

pub mod step;

/// Generates a random name consisting of alphanumeric characters.
///
/// # Returns
///
/// A `String` containing the generated random name.
fn build_name() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 8)
}

/// Runs `future` to completion from synchronous batch code.
///
/// Item readers and writers are synchronous while SQLx is async: the future is
/// driven on the current Tokio runtime, which must be a multi-thread runtime.
#[cfg(feature = "rdbc-sqlite")]
pub(crate) fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, crate::BatchError> {
    let handle = tokio::runtime::Handle::try_current().map_err(|e| {
        crate::BatchError::Configuration(format!("A Tokio runtime is required: {}", e))
    })?;

    Ok(tokio::task::block_in_place(|| handle.block_on(future)))
}
