//! # Logferry Log
//!
//! The local append-only log that importers merge downloaded segments into.
//!
//! ## Overview
//!
//! The sync engine talks to the log through the [`SegmentLog`] trait, so the
//! watcher is storage-agnostic. The durable implementation is [`SqliteLog`],
//! with [`MemoryLog`] for tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use logferry_core::SegmentBuilder;
//! use logferry_log::{SegmentLog, SqliteLog};
//!
//! async fn example() -> logferry_log::Result<()> {
//!     let log = SqliteLog::open("/var/lib/logferry", "orders")?;
//!     log.merge(&SegmentBuilder::new(1_736_870_400).record(&b"row"[..]).seal()).await?;
//!     assert_eq!(log.meta().await?.created_at, 1_736_870_400);
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Ordered merges**: `created_at` must strictly increase across merges
//! - **Head metadata**: `meta().created_at` is `0` for an empty log

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{LogError, Result};
pub use memory::MemoryLog;
pub use sqlite::SqliteLog;
pub use traits::{LogMeta, SegmentLog};

/// Current time in milliseconds, `0` if the clock is before the epoch.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
