use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying technology.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    #[error("document `{key}` not found")]
    NotFound { key: String },
    #[error("document `{key}` already exists")]
    AlreadyExists { key: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Missing document error for `key`.
    pub fn not_found(key: impl Into<String>) -> Self {
        StorageError::NotFound { key: key.into() }
    }

    /// Collision error for `key`.
    pub fn already_exists(key: impl Into<String>) -> Self {
        StorageError::AlreadyExists { key: key.into() }
    }
}

/// Marker source used when no backend is installed at all.
#[derive(Debug, Error)]
#[error("no storage backend installed")]
pub struct NoBackend;
