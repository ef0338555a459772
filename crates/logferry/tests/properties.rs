//! Properties over generated dataset names and segments, run against the
//! object-store remote.

use std::io::Cursor as IoCursor;

use proptest::prelude::*;

use logferry::sync::Remote;
use logferry::{
    Cursor, ExporterOptions, Ferry, FerryConfig, KeyPrefix, Segment, SegmentBuilder,
    SegmentReader,
};
use logferry_testkit::generators::{dataset_name, increasing_created_at};
use logferry_testkit::{segment_from_params, verify_all_vectors, SegmentParams};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

#[test]
fn test_golden_vectors() {
    verify_all_vectors().unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_generated_names_list_back_in_order(
        name in dataset_name(),
        stamps in increasing_created_at(8),
    ) {
        let listed = runtime().block_on(async {
            let ferry = Ferry::open(&FerryConfig::default()).unwrap();
            let exporter = ferry.exporter(ExporterOptions::new(name.clone())).unwrap();
            for &ts in stamps.iter().rev() {
                let bytes = SegmentBuilder::new(ts)
                    .record(ts.to_string().into_bytes())
                    .seal()
                    .to_bytes();
                let mut reader = SegmentReader::new(IoCursor::new(bytes)).unwrap();
                exporter.export(&mut reader).await.unwrap();
            }

            let prefix = KeyPrefix::for_dataset(&name).unwrap();
            let mut cursor = Cursor::start();
            let mut listed = Vec::new();
            while let Some(key) = ferry.remote().next_key_after(&prefix, &cursor).await.unwrap() {
                listed.push(key.created_at().unwrap());
                cursor.advance(key);
            }
            listed
        });
        prop_assert_eq!(listed, stamps);
    }

    #[test]
    fn prop_exported_segments_download_intact(params in any::<SegmentParams>()) {
        let segment = segment_from_params(&params);
        let downloaded = runtime().block_on(async {
            let ferry = Ferry::open(&FerryConfig::default()).unwrap();
            let exporter = ferry.exporter(ExporterOptions::new("ds")).unwrap();
            let mut reader = SegmentReader::new(IoCursor::new(segment.to_bytes())).unwrap();
            let key = exporter.export(&mut reader).await.unwrap();
            let body = ferry.remote().get(&key).await.unwrap();
            Segment::from_bytes(&body).unwrap()
        });
        prop_assert_eq!(downloaded, segment);
    }
}
