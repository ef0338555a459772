//! Blake3 checksums over segment records.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain separator so segment checksums never collide with other hashes.
const CHECKSUM_DOMAIN: &[u8] = b"logferry-segment-v1:";

/// A 32-byte Blake3 checksum of a segment's records.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(pub [u8; 32]);

impl Checksum {
    /// Checksum a sequence of records.
    ///
    /// Each record is length-prefixed so that record boundaries are part of
    /// the digest.
    pub fn of_records(records: &[Bytes]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(CHECKSUM_DOMAIN);
        for record in records {
            hasher.update(&(record.len() as u64).to_le_bytes());
            hasher.update(record);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl TryFrom<&[u8]> for Checksum {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}
