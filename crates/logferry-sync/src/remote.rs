//! Remote store abstraction.
//!
//! The sync engine needs four capabilities from an object store: upload a
//! segment, download one, find the first key after a cursor, and remove a
//! dataset. Any store providing them can back both exporters and importers.

use async_trait::async_trait;
use bytes::Bytes;

use logferry_core::{Cursor, KeyPrefix, SegmentKey};

use crate::error::Result;

/// Remote capability set shared by exporters and importers.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Remote: Send + Sync {
    /// Upload `body` under `key`. Returns the key as stored.
    async fn put(&self, key: &SegmentKey, body: Bytes) -> Result<SegmentKey>;

    /// Download the object stored under `key`.
    async fn get(&self, key: &SegmentKey) -> Result<Bytes>;

    /// First key under `prefix` strictly after `cursor` in lexical order.
    ///
    /// `Ok(None)` means no newer key exists yet. This is the caught-up
    /// signal, not an error.
    async fn next_key_after(
        &self,
        prefix: &KeyPrefix,
        cursor: &Cursor,
    ) -> Result<Option<SegmentKey>>;

    /// Remove every object under `prefix`. Returns how many were removed.
    async fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<usize>;
}

#[async_trait]
impl<R: Remote + ?Sized> Remote for std::sync::Arc<R> {
    async fn put(&self, key: &SegmentKey, body: Bytes) -> Result<SegmentKey> {
        (**self).put(key, body).await
    }

    async fn get(&self, key: &SegmentKey) -> Result<Bytes> {
        (**self).get(key).await
    }

    async fn next_key_after(
        &self,
        prefix: &KeyPrefix,
        cursor: &Cursor,
    ) -> Result<Option<SegmentKey>> {
        (**self).next_key_after(prefix, cursor).await
    }

    async fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<usize> {
        (**self).delete_prefix(prefix).await
    }
}

/// A simple in-memory remote for testing.
///
/// Keeps objects in a sorted map and can inject listing and download
/// failures to exercise the importer's retry paths.
pub mod memory {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::ops::Bound;
    use std::sync::{Mutex, MutexGuard};

    use crate::error::SyncError;

    #[derive(Default)]
    struct MemoryRemoteInner {
        objects: BTreeMap<String, Bytes>,
        /// Upcoming listing calls to fail.
        list_failures: usize,
        /// Upcoming download failures per key.
        get_failures: HashMap<String, usize>,
        /// Cursor passed to every listing call, in order.
        list_cursors: Vec<String>,
        get_calls: usize,
        put_calls: usize,
    }

    /// In-memory remote implementation.
    #[derive(Default)]
    pub struct MemoryRemote {
        inner: Mutex<MemoryRemoteInner>,
    }

    impl MemoryRemote {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store an object directly, bypassing `put` accounting.
        pub fn insert(&self, key: impl Into<String>, body: impl Into<Bytes>) {
            self.lock().objects.insert(key.into(), body.into());
        }

        /// Fail the next `n` listing calls.
        pub fn fail_next_lists(&self, n: usize) {
            self.lock().list_failures = n;
        }

        /// Fail the next `n` downloads of `key`.
        pub fn fail_next_gets(&self, key: &SegmentKey, n: usize) {
            self.lock().get_failures.insert(key.as_str().to_string(), n);
        }

        /// Cursors seen by listing calls, in call order. `""` is the start.
        pub fn list_cursors(&self) -> Vec<String> {
            self.lock().list_cursors.clone()
        }

        pub fn list_calls(&self) -> usize {
            self.lock().list_cursors.len()
        }

        pub fn get_calls(&self) -> usize {
            self.lock().get_calls
        }

        pub fn put_calls(&self) -> usize {
            self.lock().put_calls
        }

        /// All stored keys in lexical order.
        pub fn keys(&self) -> Vec<String> {
            self.lock().objects.keys().cloned().collect()
        }

        fn lock(&self) -> MutexGuard<'_, MemoryRemoteInner> {
            self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }
    }

    #[async_trait]
    impl Remote for MemoryRemote {
        async fn put(&self, key: &SegmentKey, body: Bytes) -> Result<SegmentKey> {
            let mut inner = self.lock();
            inner.put_calls += 1;
            inner.objects.insert(key.as_str().to_string(), body);
            Ok(key.clone())
        }

        async fn get(&self, key: &SegmentKey) -> Result<Bytes> {
            let mut inner = self.lock();
            inner.get_calls += 1;

            if let Some(remaining) = inner.get_failures.get_mut(key.as_str()) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(SyncError::Remote(format!("injected get failure for {}", key)));
                }
            }

            inner
                .objects
                .get(key.as_str())
                .cloned()
                .ok_or_else(|| SyncError::NotFound(key.to_string()))
        }

        async fn next_key_after(
            &self,
            prefix: &KeyPrefix,
            cursor: &Cursor,
        ) -> Result<Option<SegmentKey>> {
            let mut inner = self.lock();
            inner.list_cursors.push(cursor.as_str().to_string());

            if inner.list_failures > 0 {
                inner.list_failures -= 1;
                return Err(SyncError::Remote("injected list failure".into()));
            }

            let lower = match cursor.key() {
                Some(key) => Bound::Excluded(key.as_str()),
                None => Bound::Unbounded,
            };
            let next = inner
                .objects
                .range::<str, _>((lower, Bound::Unbounded))
                .map(|(key, _)| key)
                .find(|key| prefix.contains(key))
                .map(|key| SegmentKey::new(key.clone()));
            Ok(next)
        }

        async fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<usize> {
            let mut inner = self.lock();
            let before = inner.objects.len();
            inner.objects.retain(|key, _| !prefix.contains(key));
            Ok(before - inner.objects.len())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_next_key_is_strictly_after_cursor() {
            let remote = MemoryRemote::new();
            let prefix = KeyPrefix::for_dataset("ds").unwrap();
            for ts in [100, 200, 300] {
                remote.insert(prefix.key_for(ts).into_string(), vec![0u8]);
            }
            remote.insert("other.150.seg", vec![0u8]);

            let first = remote.next_key_after(&prefix, &Cursor::start()).await.unwrap();
            assert_eq!(first, Some(prefix.key_for(100)));

            let cursor = Cursor::from_log(&prefix, 200);
            let next = remote.next_key_after(&prefix, &cursor).await.unwrap();
            assert_eq!(next, Some(prefix.key_for(300)));

            let cursor = Cursor::from_log(&prefix, 300);
            assert_eq!(remote.next_key_after(&prefix, &cursor).await.unwrap(), None);
            assert_eq!(remote.list_cursors(), vec!["", "ds.200.seg", "ds.300.seg"]);
        }

        #[tokio::test]
        async fn test_injected_failures_are_consumed() {
            let remote = MemoryRemote::new();
            let prefix = KeyPrefix::for_dataset("ds").unwrap();
            let key = prefix.key_for(1);
            remote.put(&key, Bytes::from_static(b"x")).await.unwrap();

            remote.fail_next_lists(1);
            assert!(remote.next_key_after(&prefix, &Cursor::start()).await.is_err());
            assert!(remote.next_key_after(&prefix, &Cursor::start()).await.is_ok());

            remote.fail_next_gets(&key, 1);
            assert!(remote.get(&key).await.is_err());
            assert_eq!(remote.get(&key).await.unwrap(), Bytes::from_static(b"x"));
        }

        #[tokio::test]
        async fn test_delete_prefix_only_touches_dataset() {
            let remote = MemoryRemote::new();
            remote.insert("ds.1.seg", vec![1u8]);
            remote.insert("ds.2.seg", vec![2u8]);
            remote.insert("dsx.1.seg", vec![3u8]);

            let prefix = KeyPrefix::for_dataset("ds").unwrap();
            assert_eq!(remote.delete_prefix(&prefix).await.unwrap(), 2);
            assert_eq!(remote.keys(), vec!["dsx.1.seg"]);
        }
    }
}
