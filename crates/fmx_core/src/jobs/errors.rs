//! Error types for job analysis.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a dropped path could not be analyzed.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// The path does not exist (or is not the expected kind).
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// A folder could not be listed.
    #[error("Cannot read folder '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Nothing encodable was found.
    #[error("No usable input: {0}")]
    NoUsableInput(String),
}

impl AnalyzeError {
    pub fn read_dir(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ReadDir {
            path: path.into(),
            source,
        }
    }
}

/// Result type for job analysis.
pub type AnalyzeResult<T> = Result<T, AnalyzeError>;
