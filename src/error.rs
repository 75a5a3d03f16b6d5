//! Error types for StarCache
//!
//! Defines the error enum covering storage, upstream and configuration failures.
//! Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for StarCache operations
pub type Result<T> = std::result::Result<T, StarCacheError>;

/// Error type for StarCache operations
#[derive(Error, Debug)]
pub enum StarCacheError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage errors that are not raw SQLite failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Entity already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Upstream API failures surfaced to the caller
    #[error("Upstream error: {0}")]
    Upstream(#[from] crate::upstream::UpstreamError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl StarCacheError {
    /// Whether this error means the requested entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StarCacheError::NotFound(_))
    }
}
