//! Error types for the sync engine.

use thiserror::Error;

/// Errors that can occur during export and import.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The dataset name is empty.
    #[error("invalid name: dataset name cannot be empty")]
    InvalidName,

    /// The importer's local directory is empty.
    #[error("invalid directory: importer directory cannot be empty")]
    InvalidDirectory,

    /// Key or segment metadata failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] logferry_core::ValidationError),

    /// The remote store failed.
    #[error("remote error: {0}")]
    Remote(String),

    /// The requested key does not exist remotely.
    #[error("remote key not found: {0}")]
    NotFound(String),

    /// A downloaded segment's `created_at` disagrees with its key.
    #[error("segment under {key} was created at {created_at}")]
    KeyMismatch { key: String, created_at: i64 },

    /// The local log failed.
    #[error("log error: {0}")]
    Log(#[from] logferry_log::LogError),

    /// A downloaded or exported segment could not be decoded.
    #[error("segment error: {0}")]
    Core(#[from] logferry_core::CoreError),

    /// Staging file or blocking task failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The background task panicked or was aborted.
    #[error("task failed: {0}")]
    Task(String),

    /// The operation observed cancellation.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }
}

impl From<object_store::Error> for SyncError {
    fn from(e: object_store::Error) -> Self {
        match e {
            object_store::Error::NotFound { path, .. } => SyncError::NotFound(path),
            other => SyncError::Remote(other.to_string()),
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
