//! The Ferry: wires a remote store to exporters and importers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use logferry_core::KeyPrefix;
use logferry_log::SqliteLog;
use logferry_sync::{
    Exporter, ExporterOptions, Importer, ImporterOptions, ObjectStoreRemote, Remote, RemoteConfig,
    SyncError,
};

use crate::error::Result;

/// Configuration for a ferry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FerryConfig {
    /// Remote object store shared by every exporter and importer.
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Entry point for replicating datasets through one remote store.
///
/// Every exporter and importer built from a ferry gets its own rate gate,
/// sized by its options.
#[derive(Clone)]
pub struct Ferry {
    remote: Arc<dyn Remote>,
}

impl Ferry {
    /// Connect to the remote store described by `config`.
    pub fn open(config: &FerryConfig) -> Result<Self> {
        let remote = ObjectStoreRemote::from_config(&config.remote)?;
        tracing::debug!(remote = ?config.remote, "ferry opened");
        Ok(Self {
            remote: Arc::new(remote),
        })
    }

    /// Use an existing remote, e.g. a test double.
    pub fn with_remote(remote: Arc<dyn Remote>) -> Self {
        Self { remote }
    }

    pub fn remote(&self) -> &Arc<dyn Remote> {
        &self.remote
    }

    /// Create an exporter for one dataset.
    pub fn exporter(&self, options: ExporterOptions) -> Result<Exporter> {
        Ok(Exporter::new(options, self.remote.clone())?)
    }

    /// Open the dataset's SQLite log under `options.dir` and start importing.
    ///
    /// Options are validated before anything touches the filesystem.
    pub async fn importer(
        &self,
        options: ImporterOptions,
        token: &CancellationToken,
    ) -> Result<Importer> {
        options.validate()?;
        let (dir, name) = (options.dir.clone(), options.name.clone());
        let log = tokio::task::spawn_blocking(move || SqliteLog::open(dir, &name))
            .await
            .map_err(|e| SyncError::Task(format!("opening log failed: {}", e)))??;
        let importer = Importer::spawn(options, self.remote.clone(), Arc::new(log), token).await?;
        Ok(importer)
    }

    /// Delete every remote segment of a dataset.
    pub async fn purge(&self, name: &str) -> Result<usize> {
        let prefix = KeyPrefix::for_dataset(name)?;
        let removed = self.remote.delete_prefix(&prefix).await?;
        tracing::info!(dataset = name, removed, "purged remote dataset");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FerryError;
    use logferry_sync::SyncError;

    #[test]
    fn test_config_defaults_to_in_memory() {
        let config: FerryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.remote, RemoteConfig::InMemory);
    }

    #[tokio::test]
    async fn test_importer_validates_before_opening_log() {
        let dir = tempfile::tempdir().unwrap();
        let ferry = Ferry::open(&FerryConfig::default()).unwrap();
        let token = CancellationToken::new();

        let err = ferry
            .importer(ImporterOptions::new("", dir.path().join("log")), &token)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, FerryError::Sync(SyncError::InvalidName)));
        assert!(!dir.path().join("log").exists());
    }

    #[tokio::test]
    async fn test_purge_rejects_empty_name() {
        let ferry = Ferry::open(&FerryConfig::default()).unwrap();
        assert!(matches!(
            ferry.purge("").await,
            Err(FerryError::Validation(_))
        ));
    }
}
