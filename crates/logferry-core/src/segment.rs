//! Segment: a sealed, immutable unit of the local append-only log.
//!
//! Segments are uploaded and downloaded whole. The only metadata carried
//! across the bridge is the creation timestamp, which also names the remote
//! key.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::canonical::{decode_segment, encode_segment};
use crate::checksum::Checksum;
use crate::error::CoreError;

/// The current segment encoding version.
pub const SEGMENT_VERSION: u8 = 1;

/// Creation metadata of a sealed segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentMeta {
    /// Creation timestamp in Unix seconds. Orders segments within a dataset.
    pub created_at: i64,
}

/// A sealed segment: creation metadata plus an ordered list of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    meta: SegmentMeta,
    records: Vec<Bytes>,
}

impl Segment {
    pub fn new(created_at: i64, records: Vec<Bytes>) -> Self {
        Self {
            meta: SegmentMeta { created_at },
            records,
        }
    }

    pub fn meta(&self) -> SegmentMeta {
        self.meta
    }

    pub fn created_at(&self) -> i64 {
        self.meta.created_at
    }

    pub fn records(&self) -> &[Bytes] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Bytes> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Checksum over the records, stored alongside them when encoded.
    pub fn checksum(&self) -> Checksum {
        Checksum::of_records(&self.records)
    }

    /// Encode to the canonical wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode_segment(self)
    }

    /// Decode and verify a segment from its wire format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        decode_segment(bytes)
    }

    /// Write the encoded segment to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), CoreError> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Builder for sealing a segment from individual records.
#[derive(Debug, Default)]
pub struct SegmentBuilder {
    created_at: i64,
    records: Vec<Bytes>,
}

impl SegmentBuilder {
    pub fn new(created_at: i64) -> Self {
        Self {
            created_at,
            records: Vec::new(),
        }
    }

    /// Append one record.
    pub fn record(mut self, record: impl Into<Bytes>) -> Self {
        self.records.push(record.into());
        self
    }

    /// Append several records in order.
    pub fn records<I, B>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.records.extend(records.into_iter().map(Into::into));
        self
    }

    /// Seal the segment. No records can be added afterwards.
    pub fn seal(self) -> Segment {
        Segment::new(self.created_at, self.records)
    }
}
