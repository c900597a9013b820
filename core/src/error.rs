//! Error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),

    /// Response body did not match the expected API shape
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
