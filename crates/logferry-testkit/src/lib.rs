//! # Logferry Testkit
//!
//! Testing utilities for logferry.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known key names and segment headers that every
//!   exporter and importer must agree on
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Temp directories, sealed segment files and readers
//!
//! ## Golden Vectors
//!
//! ```rust
//! use logferry_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use logferry_testkit::generators::{dataset_name, increasing_created_at};
//!
//! proptest! {
//!     #[test]
//!     fn keys_sort_like_timestamps(name in dataset_name(), stamps in increasing_created_at(16)) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use logferry_testkit::fixtures::DatasetFixture;
//!
//! let fixture = DatasetFixture::new("orders");
//! let path = fixture.write_segment(1_736_870_400);
//! assert!(path.exists());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{sample_segment, DatasetFixture};
pub use generators::{segment_from_params, SegmentParams};
pub use vectors::{all_vectors, verify_all_vectors, KeyVector};
