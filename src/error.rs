//! Error types for the compliance lifecycle engine.

use thiserror::Error;

/// Result type alias for compliance operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for compliance lifecycle operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing input (bad identity, unknown enum value, malformed email)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown request, user or policy
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness constraint violation
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Illegal state transition
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Notification delivery failure (transient, retried by the scheduler)
    #[error("Notification error: {0}")]
    Notify(String),

    /// Persistence store failure (transient, job fails and is retried at next run)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV rendering error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Whether a retry may succeed. Validation and state errors never
    /// become valid by waiting; delivery and storage failures can.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Notify(_) | Error::Storage(_) | Error::Io(_))
    }
}
