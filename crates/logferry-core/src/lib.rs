//! # Logferry Core
//!
//! Pure primitives shared by both sides of a logferry bridge.
//!
//! This crate contains no networking and no storage. It defines how segments
//! are named in the remote store, how an importer's cursor is derived, and how
//! a sealed segment is encoded on the wire.
//!
//! ## Key Types
//!
//! - [`KeyPrefix`] - Per-dataset namespace (`<name>.`)
//! - [`SegmentKey`] - Remote object key (`<name>.<created_at>.seg`)
//! - [`Cursor`] - Last successfully imported key
//! - [`Segment`] - A sealed, immutable unit of the local log
//! - [`SegmentReader`] - A validated, seekable view over an encoded segment
//!
//! ## Naming
//!
//! Exporters and importers must agree on naming exactly: the importer rebuilds
//! its cursor from the local log's `created_at` using the same function the
//! exporter used to name the upload.
//!
//! ```rust
//! use logferry_core::{Cursor, KeyPrefix};
//!
//! let prefix = KeyPrefix::for_dataset("ds").unwrap();
//! let key = prefix.key_for(300);
//! assert_eq!(key.as_str(), "ds.300.seg");
//! assert_eq!(Cursor::from_log(&prefix, 300).as_str(), key.as_str());
//! ```

pub mod canonical;
pub mod checksum;
pub mod error;
pub mod key;
pub mod reader;
pub mod segment;
pub mod validation;

pub use canonical::{decode_segment, encode_segment};
pub use checksum::Checksum;
pub use error::{CoreError, ValidationError};
pub use key::{segment_key, Cursor, KeyPrefix, SegmentKey, SEGMENT_EXTENSION};
pub use reader::SegmentReader;
pub use segment::{Segment, SegmentBuilder, SegmentMeta, SEGMENT_VERSION};
pub use validation::{validate_created_at, validate_dataset_name, validate_merge_order};
