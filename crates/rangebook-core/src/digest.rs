//! State digests.
//!
//! A [`StateDigest`] is the Blake3 hash of a snapshot's canonical encoding.
//! Two ledgers with the same digest hold byte-identical range records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte Blake3 digest of ledger state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateDigest(pub [u8; 32]);

impl StateDigest {
    /// Hash arbitrary bytes.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
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

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Self(arr))
    }

    /// Sentinel for "no state recorded yet".
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateDigest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for StateDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for StateDigest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_hex_roundtrip() {
        let digest = StateDigest::hash(b"ranges");
        assert_eq!(StateDigest::from_hex(&digest.to_hex()).unwrap(), digest);
        assert!(StateDigest::from_hex("00").is_err());
    }

    #[test]
    fn test_digest_differs_by_input() {
        assert_ne!(StateDigest::hash(b"a"), StateDigest::hash(b"b"));
        assert_ne!(StateDigest::hash(b""), StateDigest::ZERO);
    }
}
