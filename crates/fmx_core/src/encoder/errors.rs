//! Error types for encoder launches and sub-job preparation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error raised while running one encoder invocation.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The configured encoder executable does not exist.
    #[error("Encoder not found: {path}")]
    EncoderNotFound { path: String },

    /// The operating system refused to start the encoder.
    #[error("Failed to launch '{path}': {source}")]
    LaunchFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A redirected stream was not available on the child.
    #[error("Encoder {0} pipe was not captured")]
    MissingPipe(&'static str),

    /// Waiting for the encoder to exit failed.
    #[error("Failed waiting for encoder: {0}")]
    WaitFailed(#[source] io::Error),

    /// An output reader thread panicked.
    #[error("Encoder {0} reader thread panicked")]
    ReaderPanicked(&'static str),

    /// A progress pattern failed to compile.
    #[error("Invalid progress pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// File I/O while preparing or cleaning up a sub-job.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl EncodeError {
    /// Create a launch failure error.
    pub fn launch_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::LaunchFailed {
            path: path.into(),
            source,
        }
    }

    /// Create an I/O error with operation context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for encoder operations.
pub type EncodeResult<T> = Result<T, EncodeError>;
