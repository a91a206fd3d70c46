//! Point-in-time ledger state.

use serde::{Deserialize, Serialize};

use crate::canonical::{decode_snapshot, encode_snapshot};
use crate::digest::StateDigest;
use crate::error::{CoreError, ValidationError};
use crate::index::RangeIndex;
use crate::range::Range;
use crate::types::FIRST_ID;

/// The complete durable state of a ledger.
///
/// Total supply is not stored; it is always the sum of live range widths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cursor: u64,
    pub authorized_supply: u64,
    pub ranges: Vec<Range>,
}

impl Snapshot {
    /// An empty ledger with the given issuance cap.
    pub fn empty(authorized_supply: u64) -> Self {
        Self {
            cursor: FIRST_ID,
            authorized_supply,
            ranges: Vec::new(),
        }
    }

    /// Capture the state of an index.
    pub fn capture(index: &RangeIndex, authorized_supply: u64) -> Self {
        Self {
            cursor: index.cursor(),
            authorized_supply,
            ranges: index.iter().cloned().collect(),
        }
    }

    pub fn total_supply(&self) -> u64 {
        self.ranges.iter().map(Range::width).sum()
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_snapshot(self.cursor, self.authorized_supply, &self.ranges)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        let decoded = decode_snapshot(bytes)?;
        Ok(Self {
            cursor: decoded.cursor,
            authorized_supply: decoded.authorized_supply,
            ranges: decoded.ranges,
        })
    }

    /// Blake3 over the canonical encoding.
    pub fn digest(&self) -> StateDigest {
        StateDigest::hash(&self.encode())
    }

    /// Rebuild a validated index from this snapshot.
    pub fn into_index(self) -> Result<RangeIndex, ValidationError> {
        RangeIndex::from_records(self.cursor, self.ranges)
    }
}
