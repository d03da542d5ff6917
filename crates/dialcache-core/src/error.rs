//! Error types for dialcache.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // Validation errors
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Too many cache keys: {count} (max {max})")]
    TooManyKeys { count: usize, max: usize },

    #[error("No files matched path pattern: {0}")]
    NoMatchingPaths(String),

    #[error("Invalid path pattern: {0}")]
    InvalidPattern(String),

    // Entry errors
    #[error("Cache entry corrupted ({key}): {reason}")]
    CorruptEntry { key: String, reason: String },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Compression error: {0}")]
    Compression(String),

    // Infrastructure errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// Whether this error comes from validating caller input rather than
    /// from the storage backend.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingConfig(_)
                | Error::InvalidKey(_)
                | Error::TooManyKeys { .. }
                | Error::NoMatchingPaths(_)
                | Error::InvalidPattern(_)
        )
    }
}
