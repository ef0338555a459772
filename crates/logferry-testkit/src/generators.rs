//! Proptest generators for property-based testing.

use bytes::Bytes;
use proptest::prelude::*;

use logferry_core::{Segment, SegmentBuilder};

/// Generate a dataset name.
pub fn dataset_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}(\\.[a-z0-9]{1,8})?".prop_map(String::from)
}

/// Generate a ten-digit Unix timestamp, the range keys are ordered for.
pub fn created_at() -> impl Strategy<Value = i64> {
    1_000_000_000i64..=9_999_999_999i64
}

/// Generate up to `max_len` strictly increasing ten-digit timestamps.
pub fn increasing_created_at(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    (created_at(), prop::collection::vec(1i64..=86_400, 1..=max_len.max(1))).prop_map(
        |(start, steps)| {
            let mut at = start.min(9_000_000_000);
            steps
                .into_iter()
                .map(|step| {
                    at += step;
                    at
                })
                .collect()
        },
    )
}

/// Generate record payloads.
pub fn records(max_count: usize, max_len: usize) -> impl Strategy<Value = Vec<Bytes>> {
    prop::collection::vec(
        prop::collection::vec(any::<u8>(), 0..=max_len).prop_map(Bytes::from),
        0..=max_count,
    )
}

/// Parameters for generating a segment.
#[derive(Debug, Clone)]
pub struct SegmentParams {
    pub created_at: i64,
    pub records: Vec<Bytes>,
}

impl Arbitrary for SegmentParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (created_at(), records(16, 256))
            .prop_map(|(created_at, records)| SegmentParams {
                created_at,
                records,
            })
            .boxed()
    }
}

/// Seal a segment from parameters.
pub fn segment_from_params(params: &SegmentParams) -> Segment {
    SegmentBuilder::new(params.created_at)
        .records(params.records.iter().cloned())
        .seal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use logferry_core::{KeyPrefix, SegmentReader};

    proptest! {
        #[test]
        fn test_encoding_deterministic(params: SegmentParams) {
            let s1 = segment_from_params(&params);
            let s2 = segment_from_params(&params);
            prop_assert_eq!(s1.to_bytes(), s2.to_bytes());
        }

        #[test]
        fn test_reader_recovers_created_at(params: SegmentParams) {
            let bytes = segment_from_params(&params).to_bytes();
            let reader = SegmentReader::new(std::io::Cursor::new(bytes)).unwrap();
            prop_assert_eq!(reader.meta().created_at, params.created_at);
        }

        #[test]
        fn test_keys_sort_like_timestamps(
            name in dataset_name(),
            stamps in increasing_created_at(32),
        ) {
            let prefix = KeyPrefix::for_dataset(&name).unwrap();
            let keys: Vec<_> = stamps.iter().map(|&ts| prefix.key_for(ts)).collect();
            prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn test_different_records_change_bytes(
            ts in created_at(),
            r1 in records(4, 16),
            r2 in records(4, 16),
        ) {
            prop_assume!(r1 != r2);
            let b1 = SegmentBuilder::new(ts).records(r1).seal().to_bytes();
            let b2 = SegmentBuilder::new(ts).records(r2).seal().to_bytes();
            prop_assert_ne!(b1, b2);
        }
    }
}
