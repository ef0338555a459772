//! Error types for logferry core.

use thiserror::Error;

/// Errors raised while encoding, decoding or reading segments.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported segment version: {0}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("malformed segment: {0}")]
    MalformedSegment(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation errors for names, timestamps and merge ordering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("dataset name cannot be empty")]
    EmptyName,

    #[error("invalid dataset name {0:?}: use ASCII letters, digits, '.', '_' or '-'")]
    InvalidName(String),

    #[error("created_at must be positive, got {0}")]
    InvalidCreatedAt(i64),

    #[error("segment out of order: created_at {got} does not follow {last}")]
    OutOfOrder { last: i64, got: i64 },
}
