//! Error types for the ttsync ecosystem.

use thiserror::Error;

/// Errors that can occur in ttsync operations.
#[derive(Error, Debug)]
pub enum TtError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed recurrence rule: {0}")]
    MalformedRule(String),

    #[error("Invalid event record: {0}")]
    Validation(String),

    #[error("Recurring master event '{0}' is not held by this calendar")]
    ParentNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ttsync operations.
pub type TtResult<T> = Result<T, TtError>;
