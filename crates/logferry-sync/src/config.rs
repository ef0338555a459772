//! Exporter, importer and remote store configuration.
//!
//! Options deserialize from JSON (or any serde format). Defaults are applied
//! by [`ImporterOptions::fill`], a pure step: nothing here is process-wide.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use logferry_core::validate_dataset_name;

use crate::error::{Result, SyncError};

/// Default sleep after the remote reports no newer key.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Default sleep after a failed listing call.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(60);

/// Default pause before retrying a key whose download or merge failed.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::ZERO;

/// Exporter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterOptions {
    /// Dataset name; keys are written under `<name>.`.
    pub name: String,

    /// Upper bound on uploads per second. `<= 0` disables limiting.
    #[serde(default)]
    pub rate_per_second: i64,
}

impl ExporterOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rate_per_second: 0,
        }
    }

    pub fn with_rate(mut self, rate_per_second: i64) -> Self {
        self.rate_per_second = rate_per_second;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SyncError::InvalidName);
        }
        validate_dataset_name(&self.name)?;
        Ok(())
    }
}

/// Importer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterOptions {
    /// Dataset name; keys are listed under `<name>.`.
    pub name: String,

    /// Directory holding the local log.
    pub dir: PathBuf,

    /// Sleep after catching up with the remote.
    #[serde(default, with = "opt_millis", rename = "poll_interval_ms")]
    pub poll_interval: Option<Duration>,

    /// Sleep after a failed listing call.
    #[serde(default, with = "opt_millis", rename = "error_backoff_ms")]
    pub error_backoff: Option<Duration>,

    /// Pause before retrying a failed download or merge.
    #[serde(default, with = "opt_millis", rename = "retry_delay_ms")]
    pub retry_delay: Option<Duration>,

    /// Where downloads are staged. Defaults to the system temp dir.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Upper bound on remote calls per second. `<= 0` disables limiting.
    #[serde(default)]
    pub rate_per_second: i64,
}

impl ImporterOptions {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = Some(backoff);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn with_rate(mut self, rate_per_second: i64) -> Self {
        self.rate_per_second = rate_per_second;
        self
    }

    /// Copy with every unset option replaced by its default.
    ///
    /// A zero poll interval counts as unset.
    pub fn fill(&self) -> Self {
        let mut filled = self.clone();
        filled.poll_interval = Some(self.poll_interval());
        filled.error_backoff = Some(self.error_backoff());
        filled.retry_delay = Some(self.retry_delay());
        filled.staging_dir = Some(self.staging_dir());
        filled
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SyncError::InvalidName);
        }
        validate_dataset_name(&self.name)?;
        if self.dir.as_os_str().is_empty() {
            return Err(SyncError::InvalidDirectory);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        match self.poll_interval {
            Some(interval) if !interval.is_zero() => interval,
            _ => DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn error_backoff(&self) -> Duration {
        self.error_backoff.unwrap_or(DEFAULT_ERROR_BACKOFF)
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Remote object store configuration.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RemoteConfig {
    /// In-memory object store (useful for testing and development).
    #[default]
    InMemory,

    /// AWS S3 or an S3-compatible store.
    Aws(AwsRemoteConfig),

    /// Local filesystem object store.
    Local(LocalRemoteConfig),
}

/// S3 configuration. Credentials fall back to the environment when unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AwsRemoteConfig {
    /// S3 bucket name.
    pub bucket: String,

    /// AWS region (e.g., "us-west-2").
    pub region: String,

    /// Custom endpoint for S3-compatible stores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    /// Permit plain HTTP endpoints.
    #[serde(default)]
    pub allow_http: bool,
}

/// Local filesystem object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalRemoteConfig {
    /// Path to the local directory for storage.
    pub path: PathBuf,
}

/// Durations as optional integer milliseconds.
mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
