//! Error types for term lists, cursors and scorers.

use thiserror::Error;

/// The error type used throughout the crate.
#[derive(Error, Debug)]
pub enum IrisError {
    /// A binary field was truncated or overflowed while decoding.
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// No encoded term list exists for the requested document.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation is not valid for this object in its current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Serialised scorer parameters were malformed or had trailing bytes.
    #[error("Serialisation error: {0}")]
    Serialisation(String),

    /// Collection statistics contradict each other.
    #[error("Inconsistent statistics: {0}")]
    Consistency(String),

    /// A caller supplied an unusable argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for operations that may fail.
pub type Result<T> = std::result::Result<T, IrisError>;

impl IrisError {
    pub fn corrupt_data(msg: impl Into<String>) -> Self {
        IrisError::CorruptData(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        IrisError::NotFound(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        IrisError::InvalidOperation(msg.into())
    }

    pub fn serialisation(msg: impl Into<String>) -> Self {
        IrisError::Serialisation(msg.into())
    }

    pub fn consistency(msg: impl Into<String>) -> Self {
        IrisError::Consistency(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        IrisError::InvalidArgument(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        IrisError::Other(msg.into())
    }
}
