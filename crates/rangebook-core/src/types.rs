//! Strong type definitions for Rangebook.
//!
//! Holders and tags are newtypes so an address can never be confused with
//! an identifier or a tag blob at compile time.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First identifier ever issued. Identifier 0 is never valid.
pub const FIRST_ID: u64 = 1;

/// Largest identifier value representable in the 48-bit identifier field.
///
/// A range's exclusive `stop` may equal this value but never exceed it, so
/// the largest identifier that can actually be issued is `ID_CEILING - 1`.
pub const ID_CEILING: u64 = (1 << 48) - 1;

/// A 20-byte account address (holder, custody agent or issuer).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Create an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive a deterministic address from a label.
    ///
    /// Used by fixtures and tooling that need stable, human-named accounts.
    pub fn derive(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"rangebook-address-v0:");
        hasher.update(label.as_bytes());
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&hasher.finalize().as_bytes()[..20]);
        Self(arr)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 20 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The zero address. Never a valid holder.
    pub const ZERO: Self = Self([0u8; 20]);
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 20] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// Opaque attribute blob attached to a range.
///
/// The ledger only compares tags for equality; compliance modules outside
/// this workspace give them meaning.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag(pub Bytes);

impl Tag {
    /// Create a tag from any byte container.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Create a tag from a static byte slice without copying.
    pub const fn from_static(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }

    /// The empty tag.
    pub const fn empty() -> Self {
        Self(Bytes::new())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(0x{})", self.to_hex())
    }
}

impl From<&'static [u8]> for Tag {
    fn from(bytes: &'static [u8]) -> Self {
        Self::from_static(bytes)
    }
}

impl From<Vec<u8>> for Tag {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = Address::from_bytes([0x42; 20]);
        let recovered = Address::from_hex(&addr.to_hex()).unwrap();
        assert_eq!(addr, recovered);

        let prefixed = Address::from_hex(&addr.to_string()).unwrap();
        assert_eq!(addr, prefixed);
    }

    #[test]
    fn test_address_derive_is_stable() {
        assert_eq!(Address::derive("alice"), Address::derive("alice"));
        assert_ne!(Address::derive("alice"), Address::derive("bob"));
        assert_ne!(Address::derive("alice"), Address::ZERO);
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        assert!(Address::from_hex("abcd").is_err());
    }

    #[test]
    fn test_tag_equality_is_bytewise() {
        assert_eq!(Tag::from_static(b"\x00\x01"), Tag::new(vec![0u8, 1]));
        assert_ne!(Tag::from_static(b"\x00"), Tag::empty());
        assert_eq!(format!("{:?}", Tag::from_static(b"\x12\x34")), "Tag(0x1234)");
    }

    #[test]
    fn test_ceiling_is_48_bit() {
        assert_eq!(ID_CEILING, 0xffff_ffff_ffff);
    }
}
