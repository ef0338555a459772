//! Remote backed by the `object_store` crate.
//!
//! Supports in-memory, local filesystem and S3-compatible stores. Keys are
//! stored as flat object paths, so a dataset prefix such as `orders.` is a
//! string prefix rather than a path segment: listings run from the cursor
//! offset and filter on the prefix.
//!
//! S3 and the in-memory store list keys in lexical order, so the scan stops
//! at the first key under the prefix, the way a `StartAfter` + `MaxKeys=1`
//! request would. The local filesystem lists in directory order and is
//! scanned in full.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};

use logferry_core::{Cursor, KeyPrefix, SegmentKey};

use crate::config::RemoteConfig;
use crate::error::{Result, SyncError};
use crate::remote::Remote;

/// A [`Remote`] over any [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct ObjectStoreRemote {
    store: Arc<dyn ObjectStore>,
    sorted_listing: bool,
}

impl ObjectStoreRemote {
    /// Wrap a store whose listing order is unknown.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            sorted_listing: false,
        }
    }

    /// Declare whether the store lists keys in lexical order.
    pub fn with_sorted_listing(mut self, sorted: bool) -> Self {
        self.sorted_listing = sorted;
        self
    }

    /// Build the underlying store from configuration.
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let sorted_listing = !matches!(config, RemoteConfig::Local(_));
        let store: Arc<dyn ObjectStore> = match config {
            RemoteConfig::InMemory => Arc::new(InMemory::new()),
            RemoteConfig::Aws(aws) => {
                let mut builder = AmazonS3Builder::from_env()
                    .with_region(&aws.region)
                    .with_bucket_name(&aws.bucket)
                    .with_allow_http(aws.allow_http);
                if let Some(endpoint) = &aws.endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                if let Some(key) = &aws.access_key_id {
                    builder = builder.with_access_key_id(key);
                }
                if let Some(secret) = &aws.secret_access_key {
                    builder = builder.with_secret_access_key(secret);
                }
                let store = builder.build().map_err(|e| {
                    SyncError::Remote(format!("failed to create S3 store: {}", e))
                })?;
                Arc::new(store)
            }
            RemoteConfig::Local(local) => {
                std::fs::create_dir_all(&local.path)?;
                let store = LocalFileSystem::new_with_prefix(&local.path).map_err(|e| {
                    SyncError::Remote(format!(
                        "failed to create local store at '{}': {}",
                        local.path.display(),
                        e
                    ))
                })?;
                Arc::new(store)
            }
        };
        Ok(Self::new(store).with_sorted_listing(sorted_listing))
    }

    /// The underlying object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Keys under `prefix`, in lexical order.
    async fn keys_under(&self, prefix: &KeyPrefix) -> Result<Vec<Path>> {
        let mut keys: Vec<Path> = self
            .store
            .list(None)
            .try_filter_map(|meta| async move {
                Ok(prefix.contains(meta.location.as_ref()).then_some(meta.location))
            })
            .try_collect()
            .await?;
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl Remote for ObjectStoreRemote {
    async fn put(&self, key: &SegmentKey, body: Bytes) -> Result<SegmentKey> {
        let location = Path::from(key.as_str());
        if location.as_ref() != key.as_str() {
            return Err(SyncError::Remote(format!(
                "key {} would be stored as {}",
                key, location
            )));
        }
        self.store.put(&location, PutPayload::from(body)).await?;
        Ok(SegmentKey::new(location.to_string()))
    }

    async fn get(&self, key: &SegmentKey) -> Result<Bytes> {
        let location = Path::from(key.as_str());
        let bytes = self.store.get(&location).await?.bytes().await?;
        Ok(bytes)
    }

    async fn next_key_after(
        &self,
        prefix: &KeyPrefix,
        cursor: &Cursor,
    ) -> Result<Option<SegmentKey>> {
        // Every key under the prefix sorts after the bare prefix.
        let offset = match cursor.key() {
            Some(key) => Path::from(key.as_str()),
            None => Path::from(prefix.as_str()),
        };
        let locations = self
            .store
            .list_with_offset(None, &offset)
            .map_ok(|meta| meta.location);

        if self.sorted_listing {
            first_under(locations, prefix).await
        } else {
            smallest_under(locations, prefix).await
        }
    }

    async fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<usize> {
        let keys = self.keys_under(prefix).await?;
        for key in &keys {
            self.store.delete(key).await?;
        }
        tracing::debug!(prefix = %prefix, removed = keys.len(), "deleted remote prefix");
        Ok(keys.len())
    }
}

/// First key under `prefix` in a listing sorted by key.
///
/// Stops at the first match or at the first key past the prefix range, so
/// no further listing pages are requested.
async fn first_under<S>(mut locations: S, prefix: &KeyPrefix) -> Result<Option<SegmentKey>>
where
    S: Stream<Item = object_store::Result<Path>> + Unpin,
{
    while let Some(location) = locations.try_next().await? {
        let key = location.as_ref();
        if prefix.contains(key) {
            return Ok(Some(SegmentKey::new(key)));
        }
        if key > prefix.as_str() {
            break;
        }
    }
    Ok(None)
}

/// Smallest key under `prefix` in a listing of unknown order.
async fn smallest_under<S>(locations: S, prefix: &KeyPrefix) -> Result<Option<SegmentKey>>
where
    S: Stream<Item = object_store::Result<Path>>,
{
    let next = locations
        .try_fold(None::<String>, |best, location| async move {
            let key = location.as_ref();
            if !prefix.contains(key) {
                return Ok(best);
            }
            Ok(match best {
                Some(current) if current.as_str() <= key => Some(current),
                _ => Some(key.to_string()),
            })
        })
        .await?;

    Ok(next.map(SegmentKey::new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalRemoteConfig;

    async fn seed(remote: &ObjectStoreRemote, prefix: &KeyPrefix, stamps: &[i64]) {
        for &ts in stamps {
            remote
                .put(&prefix.key_for(ts), Bytes::from(ts.to_string()))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_in_memory_listing_follows_cursor() {
        let remote = ObjectStoreRemote::from_config(&RemoteConfig::InMemory).unwrap();
        let prefix = KeyPrefix::for_dataset("ds").unwrap();
        seed(&remote, &prefix, &[300, 100, 200]).await;
        remote.put(&SegmentKey::new("dt.150.seg"), Bytes::new()).await.unwrap();

        let first = remote.next_key_after(&prefix, &Cursor::start()).await.unwrap();
        assert_eq!(first, Some(prefix.key_for(100)));

        let after = remote
            .next_key_after(&prefix, &Cursor::from_log(&prefix, 100))
            .await
            .unwrap();
        assert_eq!(after, Some(prefix.key_for(200)));

        let done = remote
            .next_key_after(&prefix, &Cursor::from_log(&prefix, 300))
            .await
            .unwrap();
        assert_eq!(done, None);
    }

    #[tokio::test]
    async fn test_local_filesystem_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let config = RemoteConfig::Local(LocalRemoteConfig {
            path: dir.path().join("bucket"),
        });
        let remote = ObjectStoreRemote::from_config(&config).unwrap();
        let prefix = KeyPrefix::for_dataset("orders").unwrap();
        seed(&remote, &prefix, &[1_700_000_100, 1_700_000_000]).await;

        let key = remote
            .next_key_after(&prefix, &Cursor::start())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(key, prefix.key_for(1_700_000_000));
        assert_eq!(remote.get(&key).await.unwrap(), Bytes::from("1700000000"));
    }

    fn listing(keys: &[&str]) -> Vec<object_store::Result<Path>> {
        keys.iter().map(|key| Ok(Path::from(*key))).collect()
    }

    fn failing_page() -> object_store::Result<Path> {
        Err(object_store::Error::Generic {
            store: "test",
            source: "next page requested".into(),
        })
    }

    #[tokio::test]
    async fn test_sorted_scan_stops_past_prefix() {
        let prefix = KeyPrefix::for_dataset("ds").unwrap();

        let mut items = listing(&["ds.100.seg"]);
        items.push(failing_page());
        let next = first_under(futures::stream::iter(items), &prefix).await.unwrap();
        assert_eq!(next, Some(prefix.key_for(100)));

        let mut items = listing(&["dt.1.seg"]);
        items.push(failing_page());
        let next = first_under(futures::stream::iter(items), &prefix).await.unwrap();
        assert_eq!(next, None);
    }

    #[tokio::test]
    async fn test_unsorted_scan_keeps_smallest() {
        let prefix = KeyPrefix::for_dataset("ds").unwrap();
        let items = listing(&["ds.300.seg", "dt.1.seg", "ds.200.seg", "d.1.seg"]);
        let next = smallest_under(futures::stream::iter(items), &prefix)
            .await
            .unwrap();
        assert_eq!(next, Some(prefix.key_for(200)));

        // An unordered scan reads the whole listing.
        let mut items = listing(&["ds.300.seg"]);
        items.push(failing_page());
        assert!(smallest_under(futures::stream::iter(items), &prefix)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_listing_order_follows_backend() {
        let dir = tempfile::tempdir().unwrap();
        let local = RemoteConfig::Local(LocalRemoteConfig {
            path: dir.path().join("bucket"),
        });
        assert!(ObjectStoreRemote::from_config(&RemoteConfig::InMemory).unwrap().sorted_listing);
        assert!(!ObjectStoreRemote::from_config(&local).unwrap().sorted_listing);
    }

    #[tokio::test]
    async fn test_every_valid_name_character_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let local = RemoteConfig::Local(LocalRemoteConfig {
            path: dir.path().join("bucket"),
        });
        for config in [RemoteConfig::InMemory, local] {
            let remote = ObjectStoreRemote::from_config(&config).unwrap();
            let prefix = KeyPrefix::for_dataset("Orders.eu-west_2").unwrap();
            let key = prefix.key_for(100);

            let stored = remote.put(&key, Bytes::from_static(b"body")).await.unwrap();
            assert_eq!(stored, key);
            let next = remote.next_key_after(&prefix, &Cursor::start()).await.unwrap();
            assert_eq!(next, Some(key.clone()));
            assert_eq!(remote.get(&key).await.unwrap(), Bytes::from_static(b"body"));
        }
    }

    #[tokio::test]
    async fn test_put_refuses_keys_the_store_would_rewrite() {
        let remote = ObjectStoreRemote::from_config(&RemoteConfig::InMemory).unwrap();
        let err = remote
            .put(&SegmentKey::new("team#1.100.seg"), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Remote(_)));
        assert!(KeyPrefix::for_dataset("team#1").is_err());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let remote = ObjectStoreRemote::from_config(&RemoteConfig::InMemory).unwrap();
        let err = remote.get(&SegmentKey::new("ds.1.seg")).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_prefix() {
        let remote = ObjectStoreRemote::from_config(&RemoteConfig::InMemory).unwrap();
        let prefix = KeyPrefix::for_dataset("ds").unwrap();
        seed(&remote, &prefix, &[1, 2, 3]).await;
        remote.put(&SegmentKey::new("other.1.seg"), Bytes::new()).await.unwrap();

        assert_eq!(remote.delete_prefix(&prefix).await.unwrap(), 3);
        assert_eq!(
            remote.next_key_after(&prefix, &Cursor::start()).await.unwrap(),
            None
        );
        let other = KeyPrefix::for_dataset("other").unwrap();
        assert!(remote
            .next_key_after(&other, &Cursor::start())
            .await
            .unwrap()
            .is_some());
    }
}
