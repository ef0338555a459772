//! SegmentLog trait: the abstract interface for the local append-only log.
//!
//! The sync engine only needs three things from a local log: merge a sealed
//! segment, report the `created_at` of the last merged segment, and name the
//! file it lives in. Read-back queries exist for callers and tests.

use std::path::Path;

use async_trait::async_trait;
use logferry_core::Segment;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata describing the head of a local log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMeta {
    /// `created_at` of the most recently merged segment, `0` when empty.
    pub created_at: i64,
}

impl LogMeta {
    pub fn is_empty(&self) -> bool {
        self.created_at == 0
    }
}

/// Async interface for an order-sensitive local segment log.
///
/// # Design Notes
///
/// - **Ordered merges**: a segment must have a `created_at` strictly greater
///   than the current head, otherwise `merge` fails with `OutOfOrder`.
/// - **Atomic merges**: a failed merge leaves the log unchanged.
/// - **Single writer**: the log is owned by one importer; implementations
///   serialize merges but do not coordinate across processes.
#[async_trait]
pub trait SegmentLog: Send + Sync {
    /// The log's dataset name.
    fn name(&self) -> &str;

    /// Backing file, if the log is persisted.
    fn filename(&self) -> Option<&Path>;

    /// Incorporate a sealed segment's records.
    async fn merge(&self, segment: &Segment) -> Result<()>;

    /// Head metadata, used to rebuild an importer's cursor.
    async fn meta(&self) -> Result<LogMeta>;

    /// All merged segments in merge order.
    async fn segments(&self) -> Result<Vec<Segment>>;

    /// Number of merged segments.
    async fn segment_count(&self) -> Result<u64>;
}
