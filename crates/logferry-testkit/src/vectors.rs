//! Golden vectors for key naming and segment encoding.
//!
//! Exporters and importers on different hosts must agree on both, byte for
//! byte. The header vector covers every encoded byte up to the checksum value.

use logferry_core::{KeyPrefix, SegmentBuilder};

/// Encoded length of the checksum value: `bytes(32)` header plus digest.
const CHECKSUM_VALUE_LEN: usize = 2 + 32;

/// A golden key and encoding vector.
#[derive(Debug, Clone)]
pub struct KeyVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub dataset: &'static str,
    pub created_at: i64,
    pub records: &'static [&'static [u8]],
    /// Expected remote key.
    pub expected_key: &'static str,
    /// Expected encoding (hex) up to, not including, the checksum digest.
    pub expected_header: &'static str,
}

/// Get all golden vectors.
pub fn all_vectors() -> Vec<KeyVector> {
    vec![
        KeyVector {
            name: "one record, ten-digit timestamp",
            dataset: "orders",
            created_at: 1_736_870_400, // 2025-01-14T16:00:00Z
            records: &[b"row"],
            expected_key: "orders.1736870400.seg",
            expected_header: "a40001011a67868a00028143726f77035820",
        },
        KeyVector {
            name: "empty segment",
            dataset: "ds",
            created_at: 100,
            records: &[],
            expected_key: "ds.100.seg",
            expected_header: "a400010118640280035820",
        },
        KeyVector {
            name: "dotted dataset, empty record",
            dataset: "orders.eu",
            created_at: 5,
            records: &[b"a", b""],
            expected_key: "orders.eu.5.seg",
            expected_header: "a4000101050282416140035820",
        },
    ]
}

/// Check one vector, describing the first mismatch.
pub fn verify_vector(vector: &KeyVector) -> Result<(), String> {
    let prefix = KeyPrefix::for_dataset(vector.dataset)
        .map_err(|e| format!("{}: invalid dataset: {}", vector.name, e))?;

    let key = prefix.key_for(vector.created_at);
    if key.as_str() != vector.expected_key {
        return Err(format!(
            "{}: key {} != expected {}",
            vector.name, key, vector.expected_key
        ));
    }

    let bytes = SegmentBuilder::new(vector.created_at)
        .records(vector.records.iter().map(|r| r.to_vec()))
        .seal()
        .to_bytes();
    let header = hex::encode(&bytes[..bytes.len() - CHECKSUM_VALUE_LEN]);
    if header != vector.expected_header {
        return Err(format!(
            "{}: header {} != expected {}",
            vector.name, header, vector.expected_header
        ));
    }
    Ok(())
}

/// Verify every golden vector.
pub fn verify_all_vectors() -> Result<(), String> {
    all_vectors().iter().try_for_each(verify_vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logferry_core::{Segment, SegmentKey};

    #[test]
    fn test_all_vectors_match() {
        verify_all_vectors().unwrap();
    }

    #[test]
    fn test_keys_parse_back() {
        for vector in all_vectors() {
            let key = SegmentKey::new(vector.expected_key);
            assert_eq!(key.created_at(), Some(vector.created_at), "{}", vector.name);
        }
    }

    #[test]
    fn test_vectors_decode() {
        for vector in all_vectors() {
            let bytes = SegmentBuilder::new(vector.created_at)
                .records(vector.records.iter().map(|r| r.to_vec()))
                .seal()
                .to_bytes();
            let segment = Segment::from_bytes(&bytes).unwrap();
            assert_eq!(segment.len(), vector.records.len(), "{}", vector.name);
        }
    }

    #[test]
    fn test_mismatch_is_reported() {
        let mut vector = all_vectors().remove(0);
        vector.expected_key = "orders.1.seg";
        let err = verify_vector(&vector).unwrap_err();
        assert!(err.contains("orders.1736870400.seg"));
    }
}
