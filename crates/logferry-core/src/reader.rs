//! A validated, seekable view over an encoded segment.
//!
//! The exporter needs two things from a sealed segment: its creation
//! metadata, to name the upload, and the raw bytes, to upload them. The
//! reader validates the encoding once on construction and then hands out the
//! underlying seeker positioned at the start.

use std::io::{Read, Seek, SeekFrom};

use crate::canonical::decode_segment;
use crate::error::CoreError;
use crate::segment::{Segment, SegmentMeta};

/// Reader over a sealed segment file or buffer.
#[derive(Debug)]
pub struct SegmentReader<R> {
    inner: R,
    meta: SegmentMeta,
}

impl<R: Read + Seek> SegmentReader<R> {
    /// Validate the encoded segment and capture its metadata.
    pub fn new(mut inner: R) -> Result<Self, CoreError> {
        inner.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::new();
        inner.read_to_end(&mut buf)?;
        let segment = decode_segment(&buf)?;
        inner.seek(SeekFrom::Start(0))?;

        Ok(Self {
            inner,
            meta: segment.meta(),
        })
    }

    pub fn meta(&self) -> SegmentMeta {
        self.meta
    }

    /// Reposition the underlying seeker at the first byte.
    pub fn rewind(&mut self) -> Result<(), CoreError> {
        self.inner.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// The underlying seeker, for callers that stream the bytes themselves.
    pub fn read_seeker(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Read every byte from the start.
    pub fn read_all(&mut self) -> Result<Vec<u8>, CoreError> {
        self.rewind()?;
        let mut buf = Vec::new();
        self.inner.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Decode the full segment again.
    pub fn segment(&mut self) -> Result<Segment, CoreError> {
        let buf = self.read_all()?;
        decode_segment(&buf)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
