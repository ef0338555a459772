//! # Logferry
//!
//! Replicates an append-only log between hosts through an object store.
//!
//! ## Overview
//!
//! - **Export**: sealed local segments are uploaded under
//!   `<dataset>.<created_at>.seg`
//! - **Import**: a background watcher polls the store for keys after its
//!   cursor and merges each segment into a local SQLite log, in order
//! - **Resume**: the cursor is rebuilt from the local log's newest segment,
//!   so no checkpoint file is kept
//!
//! ## Usage
//!
//! ```rust,no_run
//! use logferry::{Ferry, FerryConfig};
//! use logferry::sync::{ExporterOptions, ImporterOptions};
//! use logferry::core::{SegmentBuilder, SegmentReader};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example() -> logferry::Result<()> {
//!     let ferry = Ferry::open(&FerryConfig::default())?;
//!
//!     // Upload a sealed segment
//!     let exporter = ferry.exporter(ExporterOptions::new("orders"))?;
//!     let bytes = SegmentBuilder::new(1_736_870_400).record(&b"row"[..]).seal().to_bytes();
//!     let mut reader = SegmentReader::new(std::io::Cursor::new(bytes))?;
//!     exporter.export(&mut reader).await?;
//!
//!     // Replicate it into a local log
//!     let token = CancellationToken::new();
//!     let mut importer = ferry
//!         .importer(ImporterOptions::new("orders", "/var/lib/orders"), &token)
//!         .await?;
//!     importer.on_import().recv().await;
//!     importer.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `logferry::core` - Key naming, segments and readers
//! - `logferry::log` - The local segment log
//! - `logferry::sync` - Exporter, importer, rate gate and remotes

pub mod error;
pub mod ferry;

// Re-export component crates
pub use logferry_core as core;
pub use logferry_log as log;
pub use logferry_sync as sync;

pub use error::{FerryError, Result};
pub use ferry::{Ferry, FerryConfig};

// Re-export commonly used types
pub use logferry_core::{Cursor, KeyPrefix, Segment, SegmentBuilder, SegmentKey, SegmentReader};
pub use logferry_sync::{
    Exporter, ExporterOptions, Importer, ImporterOptions, RemoteConfig, WatcherState,
    WatcherStatus,
};
