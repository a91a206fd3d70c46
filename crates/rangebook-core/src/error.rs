//! Error types for Rangebook Core.

use thiserror::Error;

/// Errors from encoding and decoding range records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u8),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Structural violations found when checking a set of range records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("range at {start} is empty or inverted (stop {stop})")]
    EmptyRange { start: u64, stop: u64 },

    #[error("range at {start} starts below the first identifier")]
    BelowFirstId { start: u64 },

    #[error("range [{start}, {stop}) reaches past cursor {cursor}")]
    BeyondCursor { start: u64, stop: u64, cursor: u64 },

    #[error("cursor {0} exceeds the identifier ceiling")]
    CursorBeyondCeiling(u64),

    #[error("range at {start} overlaps or precedes the range ending at {prev_stop}")]
    Overlap { start: u64, prev_stop: u64 },

    #[error("ranges at {left} and {right} are adjacent with identical attributes")]
    Unmerged { left: u64, right: u64 },

    #[error("range at {0} has the zero address as owner or custodian")]
    ZeroAddress(u64),

    #[error("secondary index disagrees with records at {0}")]
    IndexMismatch(u64),

    #[error("total supply {recorded} does not match live width {actual}")]
    SupplyMismatch { recorded: u64, actual: u64 },

    #[error("state digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
}
