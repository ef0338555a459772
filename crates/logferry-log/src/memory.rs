//! In-memory implementation of the SegmentLog trait.
//!
//! This is primarily for testing. It has the same ordering semantics as
//! SQLite but keeps everything in memory with no persistence.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use logferry_core::Segment;

use crate::error::{LogError, Result};
use crate::traits::{LogMeta, SegmentLog};

/// In-memory segment log.
///
/// All data is lost when the log is dropped.
pub struct MemoryLog {
    name: String,
    inner: Mutex<MemoryLogInner>,
}

#[derive(Default)]
struct MemoryLogInner {
    segments: Vec<Segment>,
    /// Number of upcoming merges to reject.
    reject_merges: usize,
    /// Total merge calls, including rejected ones.
    merge_calls: usize,
}

impl MemoryLog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(MemoryLogInner::default()),
        }
    }

    /// Reject the next `n` merges with [`LogError::Rejected`].
    pub fn reject_next_merges(&self, n: usize) {
        self.lock().reject_merges = n;
    }

    /// Total merge attempts, successful or not.
    pub fn merge_calls(&self) -> usize {
        self.lock().merge_calls
    }

    fn lock(&self) -> MutexGuard<'_, MemoryLogInner> {
        // A poisoned lock only means a test panicked mid-merge; the data is
        // still a valid prefix of merged segments.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SegmentLog for MemoryLog {
    fn name(&self) -> &str {
        &self.name
    }

    fn filename(&self) -> Option<&Path> {
        None
    }

    async fn merge(&self, segment: &Segment) -> Result<()> {
        let mut inner = self.lock();
        inner.merge_calls += 1;

        if inner.reject_merges > 0 {
            inner.reject_merges -= 1;
            return Err(LogError::Rejected(format!(
                "segment {} rejected by {}",
                segment.created_at(),
                self.name
            )));
        }

        let last = inner.segments.last().map_or(0, Segment::created_at);
        LogError::ensure_order(last, segment.created_at())?;
        inner.segments.push(segment.clone());
        Ok(())
    }

    async fn meta(&self) -> Result<LogMeta> {
        let created_at = self.lock().segments.last().map_or(0, Segment::created_at);
        Ok(LogMeta { created_at })
    }

    async fn segments(&self) -> Result<Vec<Segment>> {
        Ok(self.lock().segments.clone())
    }

    async fn segment_count(&self) -> Result<u64> {
        Ok(self.lock().segments.len() as u64)
    }
}
