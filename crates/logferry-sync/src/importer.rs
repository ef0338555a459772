//! Import watcher: polls the remote store and merges new segments locally.
//!
//! One background task per importer runs the loop
//!
//! ```text
//! Idle -> Listing -> Downloading -> Merging -> Advanced -> Idle
//!   \________\___________\____________\___________> Closed
//! ```
//!
//! - Listing asks for the first key strictly after the cursor.
//! - No newer key: sleep for the poll interval.
//! - Listing error: log, sleep for the error backoff, list again.
//! - Download or merge error: log with the key, keep the cursor, and retry
//!   the same key on the next iteration. There is no skip policy. A segment
//!   whose `created_at` differs from its key's is a merge error, since the
//!   cursor rebuilt after a restart comes from the merged `created_at`.
//! - Merge success: advance the cursor to the merged key and notify.
//!
//! Cancellation is checked at the top of every iteration and races every
//! sleep and listing call. A download or merge in flight runs to completion.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use logferry_core::{Cursor, KeyPrefix, Segment, SegmentKey, SegmentReader};
use logferry_log::SegmentLog;

use crate::config::ImporterOptions;
use crate::error::{Result, SyncError};
use crate::gate::RateGate;
use crate::notify::{self, ImportSignal, Notifier};
use crate::remote::Remote;

/// Where the watcher loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatcherState {
    Idle,
    Listing,
    Downloading,
    Merging,
    Advanced,
    Closed,
}

/// Snapshot of an importer's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherStatus {
    pub state: WatcherState,
    /// Last successfully merged key.
    pub cursor: Cursor,
    /// Segments merged since the watcher started.
    pub imported: u64,
    /// Failed download or merge attempts.
    pub failures: u64,
    /// Failed listing calls.
    pub list_errors: u64,
}

/// A running import watcher.
///
/// Dropping the importer cancels its watcher.
pub struct Importer {
    name: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
    signal: ImportSignal,
    status: watch::Receiver<WatcherStatus>,
    _guard: DropGuard,
}

impl Importer {
    /// Validate options, rebuild the cursor from the log and start watching.
    ///
    /// The watcher stops when `token` (or this importer) is cancelled.
    /// Nothing is spawned if validation fails.
    pub async fn spawn(
        options: ImporterOptions,
        remote: Arc<dyn Remote>,
        log: Arc<dyn SegmentLog>,
        token: &CancellationToken,
    ) -> Result<Self> {
        options.validate()?;
        let gate = RateGate::new(options.rate_per_second);
        Self::spawn_with_gate(options, remote, log, gate, token).await
    }

    /// Like [`Importer::spawn`], sharing an existing rate gate.
    pub async fn spawn_with_gate(
        options: ImporterOptions,
        remote: Arc<dyn Remote>,
        log: Arc<dyn SegmentLog>,
        gate: RateGate,
        token: &CancellationToken,
    ) -> Result<Self> {
        options.validate()?;
        let options = options.fill();
        let prefix = KeyPrefix::for_dataset(&options.name)?;
        let staging_dir = options.staging_dir();
        tokio::fs::create_dir_all(&staging_dir).await?;

        let meta = log.meta().await?;
        let cursor = Cursor::from_log(&prefix, meta.created_at);

        let (notifier, signal) = notify::channel();
        let initial = WatcherStatus {
            state: WatcherState::Idle,
            cursor: cursor.clone(),
            imported: 0,
            failures: 0,
            list_errors: 0,
        };
        let (status_tx, status) = watch::channel(initial);
        let token = token.child_token();

        let watcher = Watcher {
            name: options.name.clone(),
            prefix,
            cursor,
            poll_interval: options.poll_interval(),
            error_backoff: options.error_backoff(),
            retry_delay: options.retry_delay(),
            staging_dir,
            remote,
            log,
            gate,
            notifier,
            status: status_tx,
            token: token.clone(),
            imported: 0,
            failures: 0,
            list_errors: 0,
        };
        let handle = tokio::spawn(watcher.run());

        Ok(Self {
            name: options.name,
            _guard: token.clone().drop_guard(),
            token,
            handle,
            signal,
            status,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Best-effort signal that at least one merge happened.
    pub fn on_import(&mut self) -> &mut ImportSignal {
        &mut self.signal
    }

    /// Subscribe to status snapshots.
    pub fn status(&self) -> watch::Receiver<WatcherStatus> {
        self.status.clone()
    }

    /// The last successfully merged key.
    pub fn cursor(&self) -> Cursor {
        self.status.borrow().cursor.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the watcher to stop without cancelling it.
    pub async fn closed(&self) {
        let mut status = self.status.clone();
        // An error means the watcher dropped its sender, so it has exited.
        let _ = status.wait_for(|s| s.state == WatcherState::Closed).await;
    }

    /// Cancel the watcher and wait for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        let Importer { token, handle, name, .. } = self;
        token.cancel();
        handle
            .await
            .map_err(|e| SyncError::Task(format!("importer {} failed: {}", name, e)))
    }
}

struct Watcher {
    name: String,
    prefix: KeyPrefix,
    cursor: Cursor,
    poll_interval: Duration,
    error_backoff: Duration,
    retry_delay: Duration,
    staging_dir: PathBuf,
    remote: Arc<dyn Remote>,
    log: Arc<dyn SegmentLog>,
    gate: RateGate,
    notifier: Notifier,
    status: watch::Sender<WatcherStatus>,
    token: CancellationToken,
    imported: u64,
    failures: u64,
    list_errors: u64,
}

impl Watcher {
    async fn run(mut self) {
        info!(importer = %self.name, cursor = %self.cursor, "import watcher started");

        while !self.token.is_cancelled() {
            self.publish(WatcherState::Listing);
            let next = match self.next_key().await {
                Ok(next) => next,
                Err(e) if e.is_cancelled() => break,
                Err(e) => {
                    self.list_errors += 1;
                    error!(
                        importer = %self.name,
                        error = %e,
                        backoff = ?self.error_backoff,
                        "error getting next key, backing off"
                    );
                    self.publish(WatcherState::Idle);
                    self.sleep(self.error_backoff).await;
                    continue;
                }
            };

            let Some(key) = next else {
                debug!(importer = %self.name, cursor = %self.cursor, "caught up");
                self.publish(WatcherState::Idle);
                self.sleep(self.poll_interval).await;
                continue;
            };

            self.check_order(&key);

            if let Err(e) = self.process(&key).await {
                self.failures += 1;
                error!(importer = %self.name, key = %key, error = %e, "error processing segment");
                self.publish(WatcherState::Idle);
                self.pause(self.retry_delay).await;
                continue;
            }

            self.cursor.advance(key);
            self.imported += 1;
            self.notifier.notify();
            debug!(importer = %self.name, cursor = %self.cursor, "imported segment");
            self.publish(WatcherState::Advanced);
        }

        self.publish(WatcherState::Closed);
        info!(
            importer = %self.name,
            cursor = %self.cursor,
            imported = self.imported,
            "import watcher closed"
        );
    }

    /// List the first key after the cursor, racing cancellation.
    async fn next_key(&self) -> Result<Option<SegmentKey>> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(SyncError::Cancelled),
            next = async {
                self.gate.acquire().await;
                self.remote.next_key_after(&self.prefix, &self.cursor).await
            } => next,
        }
    }

    /// Download, stage, decode and merge one segment.
    async fn process(&self, key: &SegmentKey) -> Result<()> {
        self.publish(WatcherState::Downloading);
        self.gate.acquire().await;
        let body = self.remote.get(key).await?;

        let staging_dir = self.staging_dir.clone();
        let name = self.name.clone();
        let segment = tokio::task::spawn_blocking(move || stage(&staging_dir, &name, &body))
            .await
            .map_err(|e| SyncError::Task(format!("staging failed: {}", e)))??;

        if key.created_at() != Some(segment.created_at()) {
            return Err(SyncError::KeyMismatch {
                key: key.to_string(),
                created_at: segment.created_at(),
            });
        }

        self.publish(WatcherState::Merging);
        self.log.merge(&segment).await?;
        Ok(())
    }

    /// Warn when listing order disagrees with creation order.
    fn check_order(&self, key: &SegmentKey) {
        let last = self.cursor.key().and_then(SegmentKey::created_at);
        if let (Some(last), Some(next)) = (last, key.created_at()) {
            if next <= last {
                warn!(
                    importer = %self.name,
                    cursor = %self.cursor,
                    key = %key,
                    "listed key is not newer than the cursor; timestamps may differ in digit count"
                );
            }
        }
    }

    async fn sleep(&self, duration: Duration) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }

    /// Pause before retrying a key. Zero only yields to the scheduler.
    async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            tokio::task::yield_now().await;
        } else {
            self.sleep(duration).await;
        }
    }

    fn publish(&self, state: WatcherState) {
        self.status.send_replace(WatcherStatus {
            state,
            cursor: self.cursor.clone(),
            imported: self.imported,
            failures: self.failures,
            list_errors: self.list_errors,
        });
    }
}

/// Write a download to a private temp file and open it as a segment.
///
/// The file is named after the importer and removed when this returns,
/// whatever the outcome.
fn stage(dir: &std::path::Path, name: &str, body: &Bytes) -> Result<Segment> {
    let mut file = tempfile::Builder::new()
        .prefix(&format!("{}.", name))
        .suffix(".seg")
        .tempfile_in(dir)?;
    file.write_all(body)?;
    file.flush()?;

    let mut reader = SegmentReader::new(&mut file)?;
    Ok(reader.segment()?)
}
