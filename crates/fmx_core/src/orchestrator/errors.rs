//! Error types for batch runs.
//!
//! A failed job never stops the batch; `BatchError` values are logged as the
//! batch moves on. The only error that ends a run early is a panic on the
//! worker thread, which is caught at the join and handed to the caller.

use thiserror::Error;

use crate::encoder::EncodeError;

/// Error raised while running a batch.
#[derive(Error, Debug)]
pub enum BatchError {
    /// One job could not be run to the end.
    #[error("Job '{job_name}' failed: {source}")]
    JobFailed {
        job_name: String,
        #[source]
        source: EncodeError,
    },

    /// The batch worker thread panicked.
    #[error("Batch worker panicked: {0}")]
    WorkerPanicked(String),
}

impl BatchError {
    /// Create a job failed error.
    pub fn job_failed(job_name: impl Into<String>, source: EncodeError) -> Self {
        Self::JobFailed {
            job_name: job_name.into(),
            source,
        }
    }

    /// Create a worker panic error from a join payload.
    pub fn worker_panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::WorkerPanicked(message)
    }
}

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;
