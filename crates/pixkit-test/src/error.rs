//! Error types for the test framework

use thiserror::Error;

/// Errors raised while producing or checking test artifacts
#[derive(Debug, Error)]
pub enum TestError {
    /// An artifact image could not be encoded
    #[error("cannot encode '{path}': {source}")]
    Encode {
        path: String,
        #[source]
        source: pixkit_io::IoError,
    },

    /// Reading or writing an artifact or golden file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
