//! Canonical CBOR encoding for ledger snapshots.
//!
//! Follows RFC 8949 Core Deterministic Encoding:
//! - Map keys are small integers written in ascending order
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (lock times are integer Unix seconds)
//!
//! Encoding is deterministic so that equal states hash to the same
//! [`StateDigest`](crate::digest::StateDigest) on every platform.
//!
//! ```text
//! snapshot = { 0: version, 1: cursor, 2: authorized_supply, 3: [* range] }
//! range    = { 0: start, 1: stop, 2: owner, 3: custodian / null,
//!              4: lock_time, 5: tag }
//! ```

use ciborium::value::{Integer, Value};

use crate::error::CoreError;
use crate::range::Range;
use crate::types::{Address, Tag};

/// Current snapshot encoding version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Snapshot field keys.
mod snapshot_keys {
    pub const VERSION: u64 = 0;
    pub const CURSOR: u64 = 1;
    pub const AUTHORIZED_SUPPLY: u64 = 2;
    pub const RANGES: u64 = 3;
}

/// Range field keys.
mod range_keys {
    pub const START: u64 = 0;
    pub const STOP: u64 = 1;
    pub const OWNER: u64 = 2;
    pub const CUSTODIAN: u64 = 3;
    pub const LOCK_TIME: u64 = 4;
    pub const TAG: u64 = 5;
}

/// Encode snapshot fields to canonical bytes.
pub fn encode_snapshot(cursor: u64, authorized_supply: u64, ranges: &[Range]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + ranges.len() * 64);
    encode_uint(&mut buf, 5, 4);

    encode_uint(&mut buf, 0, snapshot_keys::VERSION);
    encode_uint(&mut buf, 0, SNAPSHOT_VERSION as u64);

    encode_uint(&mut buf, 0, snapshot_keys::CURSOR);
    encode_uint(&mut buf, 0, cursor);

    encode_uint(&mut buf, 0, snapshot_keys::AUTHORIZED_SUPPLY);
    encode_uint(&mut buf, 0, authorized_supply);

    encode_uint(&mut buf, 0, snapshot_keys::RANGES);
    encode_uint(&mut buf, 4, ranges.len() as u64);
    for range in ranges {
        encode_range_to(&mut buf, range);
    }
    buf
}

/// Encode a single range record to canonical bytes.
pub fn encode_range(range: &Range) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    encode_range_to(&mut buf, range);
    buf
}

fn encode_range_to(buf: &mut Vec<u8>, range: &Range) {
    encode_uint(buf, 5, 6);

    encode_uint(buf, 0, range_keys::START);
    encode_uint(buf, 0, range.start);

    encode_uint(buf, 0, range_keys::STOP);
    encode_uint(buf, 0, range.stop);

    encode_uint(buf, 0, range_keys::OWNER);
    encode_bytes(buf, range.owner.as_bytes());

    encode_uint(buf, 0, range_keys::CUSTODIAN);
    match &range.custodian {
        Some(custodian) => encode_bytes(buf, custodian.as_bytes()),
        None => buf.push(0xf6),
    }

    encode_uint(buf, 0, range_keys::LOCK_TIME);
    encode_uint(buf, 0, range.lock_time);

    encode_uint(buf, 0, range_keys::TAG);
    encode_bytes(buf, range.tag.as_bytes());
}

/// Encode an unsigned integer with the given major type.
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

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Decoded snapshot fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSnapshot {
    pub cursor: u64,
    pub authorized_supply: u64,
    pub ranges: Vec<Range>,
}

/// Decode a snapshot from canonical bytes.
///
/// Input that decodes but is not in canonical form is rejected, so a
/// snapshot's bytes and its digest always correspond one to one.
pub fn decode_snapshot(bytes: &[u8]) -> Result<DecodedSnapshot, CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;
    let map = as_map(&value, "snapshot")?;

    let version = get_uint(map, snapshot_keys::VERSION, "version")?;
    if version != SNAPSHOT_VERSION as u64 {
        return Err(CoreError::UnsupportedVersion(version.min(u8::MAX as u64) as u8));
    }
    let cursor = get_uint(map, snapshot_keys::CURSOR, "cursor")?;
    let authorized_supply = get_uint(map, snapshot_keys::AUTHORIZED_SUPPLY, "authorized_supply")?;

    let ranges = match get(map, snapshot_keys::RANGES) {
        Some(Value::Array(items)) => items
            .iter()
            .map(decode_range_value)
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(CoreError::MalformedRecord("missing ranges".into())),
    };

    let decoded = DecodedSnapshot {
        cursor,
        authorized_supply,
        ranges,
    };
    if encode_snapshot(decoded.cursor, decoded.authorized_supply, &decoded.ranges) != bytes {
        return Err(CoreError::DecodingError("non-canonical encoding".into()));
    }
    Ok(decoded)
}

/// Decode a single range record.
pub fn decode_range(bytes: &[u8]) -> Result<Range, CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;
    decode_range_value(&value)
}

fn decode_range_value(value: &Value) -> Result<Range, CoreError> {
    let map = as_map(value, "range")?;

    let start = get_uint(map, range_keys::START, "start")?;
    let stop = get_uint(map, range_keys::STOP, "stop")?;
    let owner = match get(map, range_keys::OWNER) {
        Some(Value::Bytes(b)) => decode_address(b)?,
        _ => return Err(CoreError::MalformedRecord("invalid owner".into())),
    };
    let custodian = match get(map, range_keys::CUSTODIAN) {
        Some(Value::Bytes(b)) => Some(decode_address(b)?),
        Some(Value::Null) | None => None,
        _ => return Err(CoreError::MalformedRecord("invalid custodian".into())),
    };
    let lock_time = get_uint(map, range_keys::LOCK_TIME, "lock_time")?;
    let tag = match get(map, range_keys::TAG) {
        Some(Value::Bytes(b)) => Tag::new(b.clone()),
        None => Tag::empty(),
        _ => return Err(CoreError::MalformedRecord("invalid tag".into())),
    };

    Ok(Range {
        start,
        stop,
        owner,
        custodian,
        lock_time,
        tag,
    })
}

fn as_map<'a>(value: &'a Value, what: &str) -> Result<&'a [(Value, Value)], CoreError> {
    match value {
        Value::Map(entries) => Ok(entries),
        _ => Err(CoreError::MalformedRecord(format!("{what}: expected map"))),
    }
}

fn get(map: &[(Value, Value)], key: u64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
        .map(|(_, v)| v)
}

fn get_uint(map: &[(Value, Value)], key: u64, name: &str) -> Result<u64, CoreError> {
    match get(map, key) {
        Some(Value::Integer(i)) => integer_to_u64(*i)
            .ok_or_else(|| CoreError::MalformedRecord(format!("{name} out of range"))),
        _ => Err(CoreError::MalformedRecord(format!("missing {name}"))),
    }
}

fn integer_to_u64(i: Integer) -> Option<u64> {
    u64::try_from(i).ok()
}

fn decode_address(bytes: &[u8]) -> Result<Address, CoreError> {
    Address::try_from(bytes)
        .map_err(|_| CoreError::MalformedRecord(format!("address length {}", bytes.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ranges() -> Vec<Range> {
        let alice = Address::from_bytes([0xa1; 20]);
        let vault = Address::from_bytes([0xc0; 20]);
        vec![
            Range::new(1, 10001, alice, Tag::from_static(b"\x01")),
            Range::new(10001, 20001, alice, Tag::empty())
                .with_custodian(vault)
                .with_lock_time(1_900_000_000),
        ]
    }

    #[test]
    fn test_snapshot_encoding_deterministic() {
        let ranges = sample_ranges();
        let a = encode_snapshot(20001, 1_000_000, &ranges);
        let b = encode_snapshot(20001, 1_000_000, &ranges);
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshot_decode_recovers_fields() {
        let ranges = sample_ranges();
        let bytes = encode_snapshot(20001, 1_000_000, &ranges);
        let decoded = decode_snapshot(&bytes).unwrap();
        assert_eq!(decoded.cursor, 20001);
        assert_eq!(decoded.authorized_supply, 1_000_000);
        assert_eq!(decoded.ranges, ranges);
    }

    #[test]
    fn test_range_header_layout() {
        let bytes = encode_range(&Range::new(
            1,
            2,
            Address::from_bytes([0x11; 20]),
            Tag::empty(),
        ));
        // map(6), key 0, start 1, key 1, stop 2, key 2, bytes(20)
        assert_eq!(&bytes[..7], &[0xa6, 0x00, 0x01, 0x01, 0x02, 0x02, 0x54]);
        // custodian null, then lock 0, then empty tag
        assert_eq!(&bytes[27..], &[0x03, 0xf6, 0x04, 0x00, 0x05, 0x40]);
    }

    #[test]
    fn test_integer_encoding() {
        let mut buf = Vec::new();
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_uint(&mut buf, 0, 65536);
        assert_eq!(buf, vec![0x1a, 0x00, 0x01, 0x00, 0x00]);

        // 48-bit identifiers need the 8-byte form
        buf.clear();
        encode_uint(&mut buf, 0, crate::types::ID_CEILING);
        assert_eq!(buf[0], 0x1b);
        assert_eq!(buf.len(), 9);
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut bytes = encode_snapshot(1, 0, &[]);
        // version value sits right after map header and key 0
        bytes[2] = 0x02;
        assert!(matches!(
            decode_snapshot(&bytes),
            Err(CoreError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode_snapshot(&[0xff, 0x00]).is_err());
        assert!(decode_range(&[0x01]).is_err());
    }
}
