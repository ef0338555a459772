//! Error types for the local log.

use logferry_core::{CoreError, ValidationError};
use thiserror::Error;

/// Errors that can occur during log operations.
#[derive(Debug, Error)]
pub enum LogError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Segment arrived with a `created_at` that does not follow the log head.
    #[error("segment out of order: created_at {got} does not follow {last}")]
    OutOfOrder { last: i64, got: i64 },

    /// Invalid log name or segment metadata.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Segment encoding error.
    #[error("segment error: {0}")]
    Core(#[from] CoreError),

    /// Stored data no longer matches its checksum.
    #[error("corrupt log: {0}")]
    Corrupt(String),

    /// The log refused the merge.
    #[error("merge rejected: {0}")]
    Rejected(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The blocking worker could not run to completion.
    #[error("blocking task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogError {
    /// Check that `got` strictly follows the log head `last`.
    pub(crate) fn ensure_order(last: i64, got: i64) -> Result<()> {
        logferry_core::validate_merge_order(last, got).map_err(|e| match e {
            ValidationError::OutOfOrder { last, got } => LogError::OutOfOrder { last, got },
            other => LogError::Validation(other),
        })
    }
}

/// Result type for log operations.
pub type Result<T> = std::result::Result<T, LogError>;
