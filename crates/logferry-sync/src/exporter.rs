//! Exporter: publishes sealed local segments to the remote store.

use std::io::{Read, Seek};
use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use logferry_core::{validate_created_at, KeyPrefix, SegmentKey, SegmentReader};

use crate::config::ExporterOptions;
use crate::error::Result;
use crate::gate::RateGate;
use crate::remote::Remote;

/// Uploads one sealed segment per [`Exporter::export`] call.
///
/// Keys are derived with the same naming function the importer uses to
/// rebuild its cursor, so an exported segment is found again after restart.
pub struct Exporter {
    prefix: KeyPrefix,
    remote: Arc<dyn Remote>,
    gate: RateGate,
}

impl Exporter {
    /// Create an exporter with its own rate gate.
    ///
    /// Must be called from within a tokio runtime when rate limiting is on.
    pub fn new(options: ExporterOptions, remote: Arc<dyn Remote>) -> Result<Self> {
        let gate = RateGate::new(options.rate_per_second);
        Self::with_gate(options, remote, gate)
    }

    /// Create an exporter sharing an existing gate.
    pub fn with_gate(
        options: ExporterOptions,
        remote: Arc<dyn Remote>,
        gate: RateGate,
    ) -> Result<Self> {
        options.validate()?;
        let prefix = KeyPrefix::for_dataset(&options.name)?;
        Ok(Self {
            prefix,
            remote,
            gate,
        })
    }

    pub fn prefix(&self) -> &KeyPrefix {
        &self.prefix
    }

    /// Upload the segment behind `reader`, returning its remote key.
    ///
    /// The reader is rewound first, since it may have been read already.
    /// Remote failures are returned unchanged; retrying is up to the caller.
    pub async fn export<R: Read + Seek>(&self, reader: &mut SegmentReader<R>) -> Result<SegmentKey> {
        let created_at = reader.meta().created_at;
        validate_created_at(created_at)?;

        let key = self.prefix.key_for(created_at);
        let body = Bytes::from(reader.read_all()?);
        let size = body.len();

        self.gate.acquire().await;
        let stored = self.remote.put(&key, body).await?;

        info!(key = %stored, size, "exported segment");
        Ok(stored)
    }
}
