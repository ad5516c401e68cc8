//! Error taxonomy shared by every Focal crate.

use thiserror::Error;

/// Main error type for focal-core and the crates built on it.
#[derive(Error, Debug)]
pub enum Error {
    /// A write request was rejected before touching the log.
    #[error("invalid session data: {0}")]
    Validation(#[from] ValidationError),

    /// Log or cache-file I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A log line could not be decoded (strict reads only).
    #[error("corrupt session record on line {line}: {message}")]
    Decode { line: usize, message: String },

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a submitted session was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("sessionType must be a non-empty string")]
    MissingSessionType,

    #[error("actualDuration must be a non-negative number")]
    InvalidActualDuration,

    #[error("{field} must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// Result type alias for focal-core.
pub type Result<T> = std::result::Result<T, Error>;
