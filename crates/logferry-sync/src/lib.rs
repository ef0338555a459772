//! # Logferry Sync
//!
//! Synchronization engine between a local segment log and a remote object
//! store.
//!
//! ## Overview
//!
//! One side runs an [`Exporter`] that uploads sealed segments under
//! deterministic keys. The other side runs an [`Importer`] whose background
//! watcher polls the remote for the first key after its cursor, stages and
//! merges each segment into the local log, and advances the cursor.
//!
//! ## Key Properties
//!
//! - **Ordered**: segments are merged one at a time, in key order
//! - **Resumable**: the cursor is rebuilt from the local log on startup
//! - **Persistent**: failed downloads and merges retry the same key
//! - **Rate limited**: a [`RateGate`] bounds remote calls per side
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use logferry_log::SqliteLog;
//! use logferry_sync::{Importer, ImporterOptions, ObjectStoreRemote, RemoteConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example() -> logferry_sync::Result<()> {
//!     let remote = Arc::new(ObjectStoreRemote::from_config(&RemoteConfig::InMemory)?);
//!     let log = Arc::new(SqliteLog::open("/var/lib/orders", "orders")?);
//!     let token = CancellationToken::new();
//!
//!     let mut importer =
//!         Importer::spawn(ImporterOptions::new("orders", "/var/lib/orders"), remote, log, &token)
//!             .await?;
//!     importer.on_import().recv().await;
//!     importer.shutdown().await
//! }
//! ```

pub mod bucket;
pub mod config;
pub mod error;
pub mod exporter;
pub mod gate;
pub mod importer;
pub mod notify;
pub mod remote;

pub use bucket::ObjectStoreRemote;
pub use config::{
    AwsRemoteConfig, ExporterOptions, ImporterOptions, LocalRemoteConfig, RemoteConfig,
    DEFAULT_ERROR_BACKOFF, DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_DELAY,
};
pub use error::{Result, SyncError};
pub use exporter::Exporter;
pub use gate::RateGate;
pub use importer::{Importer, WatcherState, WatcherStatus};
pub use notify::{ImportSignal, Notifier};
pub use remote::{memory::MemoryRemote, Remote};
