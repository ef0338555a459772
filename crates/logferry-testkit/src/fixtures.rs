//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use rand::{Rng, RngCore};
use tempfile::TempDir;

use logferry_core::{Segment, SegmentBuilder, SegmentReader};
use logferry_sync::{ExporterOptions, ImporterOptions};

/// A deterministic segment: two records derived from `created_at`.
pub fn sample_segment(created_at: i64) -> Segment {
    SegmentBuilder::new(created_at)
        .record(format!("{}:first", created_at).into_bytes())
        .record(format!("{}:second", created_at).into_bytes())
        .seal()
}

/// A segment with `count` random records of up to `max_len` bytes.
pub fn random_segment(created_at: i64, count: usize, max_len: usize) -> Segment {
    let mut rng = rand::thread_rng();
    let records = (0..count).map(|_| {
        let mut record = vec![0u8; rng.gen_range(0..=max_len)];
        rng.fill_bytes(&mut record);
        Bytes::from(record)
    });
    SegmentBuilder::new(created_at).records(records).seal()
}

/// A dataset with private directories for its log, staging area and a
/// local-filesystem remote.
pub struct DatasetFixture {
    pub name: String,
    root: TempDir,
}

impl DatasetFixture {
    /// Create a fixture rooted in a fresh temp directory.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            root: tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {}", e)),
        }
    }

    /// Directory holding the importer's local log.
    pub fn log_dir(&self) -> PathBuf {
        self.root.path().join("log")
    }

    /// Directory used for staged downloads.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.path().join("staging")
    }

    /// Directory backing a local-filesystem remote.
    pub fn remote_dir(&self) -> PathBuf {
        self.root.path().join("remote")
    }

    /// Directory where sealed segment files are written.
    pub fn segments_dir(&self) -> PathBuf {
        self.root.path().join("segments")
    }

    /// Seal [`sample_segment`] into a file and return its path.
    pub fn write_segment(&self, created_at: i64) -> PathBuf {
        self.write(&sample_segment(created_at))
    }

    /// Seal `segment` into a file named after its creation time.
    pub fn write(&self, segment: &Segment) -> PathBuf {
        let dir = self.segments_dir();
        std::fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("create {:?}: {}", dir, e));
        let path = dir.join(format!("{}.seg", segment.created_at()));
        let file = File::create(&path).unwrap_or_else(|e| panic!("create {:?}: {}", path, e));
        segment
            .write_to(file)
            .unwrap_or_else(|e| panic!("write {:?}: {}", path, e));
        path
    }

    /// Open a sealed segment file as a reader.
    pub fn reader(&self, created_at: i64) -> SegmentReader<File> {
        let path = self.write_segment(created_at);
        let file = File::open(&path).unwrap_or_else(|e| panic!("open {:?}: {}", path, e));
        SegmentReader::new(file).unwrap_or_else(|e| panic!("read {:?}: {}", path, e))
    }

    pub fn exporter_options(&self) -> ExporterOptions {
        ExporterOptions::new(self.name.clone())
    }

    /// Importer options with short intervals suited to tests.
    pub fn importer_options(&self) -> ImporterOptions {
        ImporterOptions::new(self.name.clone(), self.log_dir())
            .with_poll_interval(Duration::from_millis(10))
            .with_error_backoff(Duration::from_millis(10))
            .with_staging_dir(self.staging_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_sees_written_segment() {
        let fixture = DatasetFixture::new("ds");
        let mut reader = fixture.reader(100);
        assert_eq!(reader.meta().created_at, 100);
        assert_eq!(reader.segment().unwrap(), sample_segment(100));
    }

    #[test]
    fn test_random_segment_shape() {
        let segment = random_segment(7, 5, 32);
        assert_eq!(segment.len(), 5);
        assert!(segment.records().iter().all(|r| r.len() <= 32));
        assert_eq!(Segment::from_bytes(&segment.to_bytes()).unwrap(), segment);
    }

    #[test]
    fn test_importer_options_are_valid() {
        let fixture = DatasetFixture::new("ds");
        let options = fixture.importer_options();
        assert!(options.validate().is_ok());
        assert_eq!(options.staging_dir(), fixture.staging_dir());
    }
}
