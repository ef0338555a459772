//! Canonical CBOR encoding for sealed segments.
//!
//! A segment is a single CBOR map with small integer keys:
//!
//! | key | field        | type             |
//! |-----|--------------|------------------|
//! | 0   | version      | unsigned integer |
//! | 1   | created_at   | integer          |
//! | 2   | records      | array of bytes   |
//! | 3   | checksum     | 32 bytes         |
//!
//! Integers use their smallest encoding, lengths are definite and keys are
//! written in ascending order, so equal segments always produce equal bytes.

use bytes::Bytes;
use ciborium::value::Value;

use crate::checksum::Checksum;
use crate::error::CoreError;
use crate::segment::{Segment, SEGMENT_VERSION};

/// Map field keys. Keys 0-23 encode as single bytes.
mod keys {
    pub const VERSION: u64 = 0;
    pub const CREATED_AT: u64 = 1;
    pub const RECORDS: u64 = 2;
    pub const CHECKSUM: u64 = 3;
}

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;

/// Encode a segment to canonical CBOR bytes.
pub fn encode_segment(segment: &Segment) -> Vec<u8> {
    let payload: usize = segment.records().iter().map(|r| r.len() + 9).sum();
    let mut buf = Vec::with_capacity(payload + 64);

    encode_uint(&mut buf, MAJOR_MAP, 4);

    encode_uint(&mut buf, MAJOR_UNSIGNED, keys::VERSION);
    encode_uint(&mut buf, MAJOR_UNSIGNED, SEGMENT_VERSION as u64);

    encode_uint(&mut buf, MAJOR_UNSIGNED, keys::CREATED_AT);
    encode_int(&mut buf, segment.created_at());

    encode_uint(&mut buf, MAJOR_UNSIGNED, keys::RECORDS);
    encode_uint(&mut buf, MAJOR_ARRAY, segment.len() as u64);
    for record in segment.records() {
        encode_bytes(&mut buf, record);
    }

    encode_uint(&mut buf, MAJOR_UNSIGNED, keys::CHECKSUM);
    encode_bytes(&mut buf, segment.checksum().as_bytes());

    buf
}

/// Encode a signed integer (major types 0 and 1).
fn encode_int(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, MAJOR_UNSIGNED, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, MAJOR_NEGATIVE, (-1 - n) as u64);
    }
}

/// Encode an unsigned argument with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, MAJOR_BYTES, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Decode a segment and verify its version and checksum.
pub fn decode_segment(bytes: &[u8]) -> Result<Segment, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::MalformedSegment("empty input".into()));
    }

    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::MalformedSegment("expected map".into())),
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
            .map(|(_, v)| v)
    };

    let version = match get(keys::VERSION) {
        Some(Value::Integer(i)) => u8::try_from(i128::from(*i))
            .map_err(|_| CoreError::MalformedSegment("version out of range".into()))?,
        _ => return Err(CoreError::MalformedSegment("missing version".into())),
    };
    if version != SEGMENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let created_at = match get(keys::CREATED_AT) {
        Some(Value::Integer(i)) => i64::try_from(i128::from(*i))
            .map_err(|_| CoreError::MalformedSegment("created_at out of range".into()))?,
        _ => return Err(CoreError::MalformedSegment("missing created_at".into())),
    };

    let records = match get(keys::RECORDS) {
        Some(Value::Array(items)) => {
            let mut records = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Bytes(b) => records.push(Bytes::copy_from_slice(b)),
                    _ => return Err(CoreError::MalformedSegment("invalid record".into())),
                }
            }
            records
        }
        _ => return Err(CoreError::MalformedSegment("missing records".into())),
    };

    let expected = match get(keys::CHECKSUM) {
        Some(Value::Bytes(b)) => Checksum::try_from(b.as_slice())
            .map_err(|_| CoreError::MalformedSegment("invalid checksum length".into()))?,
        _ => return Err(CoreError::MalformedSegment("missing checksum".into())),
    };

    let segment = Segment::new(created_at, records);
    let actual = segment.checksum();
    if actual != expected {
        return Err(CoreError::ChecksumMismatch {
            expected: expected.to_hex(),
            actual: actual.to_hex(),
        });
    }

    Ok(segment)
}
