//! Error types for the logferry facade.

use logferry_core::{CoreError, ValidationError};
use logferry_log::LogError;
use logferry_sync::SyncError;
use thiserror::Error;

/// Errors that can occur while wiring or running a ferry.
#[derive(Debug, Error)]
pub enum FerryError {
    /// Validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Local log error.
    #[error("log error: {0}")]
    Log(#[from] LogError),

    /// Export or import error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Segment encoding error.
    #[error("segment error: {0}")]
    Segment(#[from] CoreError),
}

/// Result type for ferry operations.
pub type Result<T> = std::result::Result<T, FerryError>;
