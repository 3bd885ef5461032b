use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Number of raw bytes in an [`ObjectId`] (the content hash output size).
pub const OID_RAW_LEN: usize = 20;

/// Number of hex characters in a fully spelled-out [`ObjectId`].
pub const OID_HEX_LEN: usize = OID_RAW_LEN * 2;

/// Content-addressed identifier for a stored object.
///
/// An `ObjectId` is the fixed-size content hash of an object. Identical
/// content always produces the same `ObjectId`, making objects
/// deduplicatable and verifiable. The all-zero value is a sentinel meaning
/// "no object".
///
/// Equality is byte-wise; ordering is lexicographic over the raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; OID_RAW_LEN]);

impl ObjectId {
    /// The zero object ID (all zeros). Represents "no object".
    pub const ZERO: Self = Self([0u8; OID_RAW_LEN]);

    /// Create an `ObjectId` from a pre-computed raw hash.
    pub const fn from_raw(raw: [u8; OID_RAW_LEN]) -> Self {
        Self(raw)
    }

    /// Returns `true` if every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; OID_RAW_LEN]
    }

    /// The raw bytes of this ID.
    pub fn as_bytes(&self) -> &[u8; OID_RAW_LEN] {
        &self.0
    }

    /// Lowercase hex representation, always 40 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a full hex string.
    ///
    /// Accepts exactly 40 hex characters in either case; anything else is
    /// [`StoreError::MalformedId`]. Partial forms are handled by
    /// [`ObjectId::from_hex_prefix`] and are valid for lookups only.
    pub fn from_hex(s: &str) -> StoreResult<Self> {
        if s.len() != OID_HEX_LEN {
            return Err(StoreError::MalformedId(s.to_string()));
        }
        let bytes = hex::decode(s).map_err(|_| StoreError::MalformedId(s.to_string()))?;
        let mut raw = [0u8; OID_RAW_LEN];
        raw.copy_from_slice(&bytes);
        Ok(Self(raw))
    }

    /// Parse an abbreviated hex form into an [`OidPrefix`].
    ///
    /// Accepts 1..=40 hex characters. The unspecified tail is zero-padded;
    /// the prefix length is remembered so matching stays nibble-accurate.
    pub fn from_hex_prefix(s: &str) -> StoreResult<OidPrefix> {
        if s.is_empty() || s.len() > OID_HEX_LEN {
            return Err(StoreError::MalformedId(s.to_string()));
        }
        let mut raw = [0u8; OID_RAW_LEN];
        for (i, ch) in s.chars().enumerate() {
            let nibble = ch
                .to_digit(16)
                .ok_or_else(|| StoreError::MalformedId(s.to_string()))?
                as u8;
            if i % 2 == 0 {
                raw[i / 2] |= nibble << 4;
            } else {
                raw[i / 2] |= nibble;
            }
        }
        Ok(OidPrefix {
            id: Self(raw),
            hex_len: s.len(),
        })
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; OID_RAW_LEN]> for ObjectId {
    fn from(raw: [u8; OID_RAW_LEN]) -> Self {
        Self(raw)
    }
}

impl From<ObjectId> for [u8; OID_RAW_LEN] {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

/// An abbreviated object ID: a zero-padded [`ObjectId`] plus the number of
/// hex characters that were actually given.
///
/// Prefixes are accepted for lookups but never for storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OidPrefix {
    id: ObjectId,
    hex_len: usize,
}

impl OidPrefix {
    /// The zero-padded ID carrying the prefix bytes.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Number of hex characters in the original abbreviated form.
    pub fn hex_len(&self) -> usize {
        self.hex_len
    }

    /// Returns `true` if `candidate` starts with this prefix.
    ///
    /// Matching is nibble-accurate: an odd-length prefix compares the high
    /// nibble of its final byte only.
    pub fn matches(&self, candidate: &ObjectId) -> bool {
        let full_bytes = self.hex_len / 2;
        if self.id.0[..full_bytes] != candidate.0[..full_bytes] {
            return false;
        }
        if self.hex_len % 2 == 1 {
            let ours = self.id.0[full_bytes] >> 4;
            let theirs = candidate.0[full_bytes] >> 4;
            return ours == theirs;
        }
        true
    }
}

impl fmt::Display for OidPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.id.to_hex()[..self.hex_len])
    }
}
