//! Remote key naming and import cursors.
//!
//! A segment is stored remotely under `<name>.<created_at><ext>`. Keys for one
//! dataset share the `<name>.` prefix, and the remote store lists them in
//! lexical order. Decimal timestamps are not zero-padded, so lexical order only
//! matches creation order while every timestamp has the same digit count
//! (true for Unix seconds until the year 2286).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::validation::validate_dataset_name;

/// File extension shared by every exported segment key.
pub const SEGMENT_EXTENSION: &str = ".seg";

/// Per-dataset key namespace, always ending with `.`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPrefix(String);

impl KeyPrefix {
    /// Build the prefix for a dataset name.
    pub fn for_dataset(name: &str) -> Result<Self, ValidationError> {
        validate_dataset_name(name)?;
        Ok(Self(format!("{}.", name)))
    }

    /// The prefix as listed in the remote store.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The dataset name without the trailing separator.
    pub fn dataset(&self) -> &str {
        &self.0[..self.0.len() - 1]
    }

    /// Derive the key for a segment created at `created_at`.
    pub fn key_for(&self, created_at: i64) -> SegmentKey {
        segment_key(self, created_at)
    }

    /// Whether a raw key lives under this prefix.
    pub fn contains(&self, key: &str) -> bool {
        key.starts_with(&self.0)
    }
}

impl fmt::Debug for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPrefix({})", self.0)
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive a segment key. Pure; both exporter and importer depend on it.
pub fn segment_key(prefix: &KeyPrefix, created_at: i64) -> SegmentKey {
    SegmentKey(format!("{}{}{}", prefix.0, created_at, SEGMENT_EXTENSION))
}

/// A key in the remote store. Immutable once uploaded.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentKey(String);

impl SegmentKey {
    /// Wrap a key returned by the remote store.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Recover the creation timestamp encoded in the key.
    ///
    /// Returns `None` for keys that were not produced by [`segment_key`].
    pub fn created_at(&self) -> Option<i64> {
        let stem = self.0.strip_suffix(SEGMENT_EXTENSION)?;
        let (_, digits) = stem.rsplit_once('.')?;
        digits.parse().ok()
    }
}

impl fmt::Debug for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SegmentKey({})", self.0)
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SegmentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SegmentKey> for String {
    fn from(key: SegmentKey) -> Self {
        key.0
    }
}

/// The key of the most recently merged remote segment.
///
/// Lives in memory only. On startup it is rebuilt from the local log's
/// `created_at`, which is why no separate checkpoint is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor(Option<SegmentKey>);

impl Cursor {
    /// A cursor positioned before every key.
    pub const fn start() -> Self {
        Self(None)
    }

    /// Rebuild the cursor from the local log's last `created_at`.
    ///
    /// An empty log (`created_at <= 0`) starts from the beginning.
    pub fn from_log(prefix: &KeyPrefix, created_at: i64) -> Self {
        if created_at > 0 {
            Self(Some(prefix.key_for(created_at)))
        } else {
            Self::start()
        }
    }

    /// Move the cursor to a key that was just merged.
    pub fn advance(&mut self, key: SegmentKey) {
        debug_assert!(self.0.as_ref().map_or(true, |current| *current < key));
        self.0 = Some(key);
    }

    pub fn key(&self) -> Option<&SegmentKey> {
        self.0.as_ref()
    }

    /// The listing offset; empty before the first import.
    pub fn as_str(&self) -> &str {
        self.0.as_ref().map_or("", |key| key.as_str())
    }

    pub fn is_start(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(key) => write!(f, "{}", key),
            None => f.write_str("<start>"),
        }
    }
}
