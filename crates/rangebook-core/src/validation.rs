//! Structural validation of range records.
//!
//! A valid record set satisfies:
//! - every range is non-empty and lies within `[FIRST_ID, cursor)`
//! - ranges are sorted and pairwise disjoint
//! - no two adjacent ranges share every attribute (maximality)
//! - no range names the zero address
//! - the cursor never passes the identifier ceiling
//!
//! Used when loading persisted state and by property tests after every
//! operation.

use crate::error::ValidationError;
use crate::index::RangeIndex;
use crate::range::Range;
use crate::types::{Address, FIRST_ID, ID_CEILING};

/// Validate a start-ordered slice of records against a cursor.
pub fn validate_records(cursor: u64, records: &[Range]) -> Result<(), ValidationError> {
    if cursor > ID_CEILING {
        return Err(ValidationError::CursorBeyondCeiling(cursor));
    }

    let mut prev: Option<&Range> = None;
    for range in records {
        if range.stop <= range.start {
            return Err(ValidationError::EmptyRange {
                start: range.start,
                stop: range.stop,
            });
        }
        if range.start < FIRST_ID {
            return Err(ValidationError::BelowFirstId { start: range.start });
        }
        if range.stop > cursor {
            return Err(ValidationError::BeyondCursor {
                start: range.start,
                stop: range.stop,
                cursor,
            });
        }
        if range.owner == Address::ZERO || range.custodian == Some(Address::ZERO) {
            return Err(ValidationError::ZeroAddress(range.start));
        }

        if let Some(prev) = prev {
            if range.start < prev.stop {
                return Err(ValidationError::Overlap {
                    start: range.start,
                    prev_stop: prev.stop,
                });
            }
            if prev.mergeable_with(range) {
                return Err(ValidationError::Unmerged {
                    left: prev.start,
                    right: range.start,
                });
            }
        }
        prev = Some(range);
    }

    Ok(())
}

/// Validate a live index: its records plus the derived holder indexes.
pub fn validate_index(index: &RangeIndex) -> Result<(), ValidationError> {
    let records: Vec<Range> = index.iter().cloned().collect();
    validate_records(index.cursor(), &records)?;
    index.check_secondary_indexes()
}

/// Check a recorded total supply against the live width of the index.
pub fn validate_supply(index: &RangeIndex, recorded: u64) -> Result<(), ValidationError> {
    let actual = index.live_width();
    if actual != recorded {
        return Err(ValidationError::SupplyMismatch { recorded, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tag;

    fn owner() -> Address {
        Address::from_bytes([0x11; 20])
    }

    fn range(start: u64, stop: u64, tag: &'static [u8]) -> Range {
        Range::new(start, stop, owner(), Tag::from_static(tag))
    }

    #[test]
    fn test_valid_records() {
        let records = vec![range(1, 100, b"a"), range(100, 200, b"b"), range(300, 400, b"a")];
        assert!(validate_records(400, &records).is_ok());
    }

    #[test]
    fn test_empty_range_rejected() {
        let records = vec![range(5, 5, b"")];
        assert_eq!(
            validate_records(10, &records),
            Err(ValidationError::EmptyRange { start: 5, stop: 5 })
        );
    }

    #[test]
    fn test_identifier_zero_rejected() {
        let records = vec![range(0, 5, b"")];
        assert_eq!(
            validate_records(10, &records),
            Err(ValidationError::BelowFirstId { start: 0 })
        );
    }

    #[test]
    fn test_beyond_cursor_rejected() {
        let records = vec![range(1, 11, b"")];
        assert!(matches!(
            validate_records(10, &records),
            Err(ValidationError::BeyondCursor { .. })
        ));
    }

    #[test]
    fn test_overlap_rejected() {
        let records = vec![range(1, 50, b"a"), range(40, 60, b"b")];
        assert_eq!(
            validate_records(100, &records),
            Err(ValidationError::Overlap {
                start: 40,
                prev_stop: 50
            })
        );
    }

    #[test]
    fn test_unmerged_neighbours_rejected() {
        let records = vec![range(1, 50, b"a"), range(50, 60, b"a")];
        assert_eq!(
            validate_records(100, &records),
            Err(ValidationError::Unmerged { left: 1, right: 50 })
        );
    }

    #[test]
    fn test_separated_identical_ranges_allowed() {
        // A burned gap between them keeps them from being mergeable.
        let records = vec![range(1, 50, b"a"), range(51, 60, b"a")];
        assert!(validate_records(100, &records).is_ok());
    }

    #[test]
    fn test_zero_address_rejected() {
        let records = vec![Range::new(1, 5, Address::ZERO, Tag::empty())];
        assert_eq!(
            validate_records(10, &records),
            Err(ValidationError::ZeroAddress(1))
        );
    }

    #[test]
    fn test_cursor_ceiling() {
        assert!(validate_records(ID_CEILING, &[]).is_ok());
        assert_eq!(
            validate_records(ID_CEILING + 1, &[]),
            Err(ValidationError::CursorBeyondCeiling(ID_CEILING + 1))
        );
    }

    #[test]
    fn test_supply_mismatch() {
        let index = RangeIndex::from_records(100, vec![range(1, 100, b"")]).unwrap();
        assert!(validate_supply(&index, 99).is_ok());
        assert_eq!(
            validate_supply(&index, 100),
            Err(ValidationError::SupplyMismatch {
                recorded: 100,
                actual: 99
            })
        );
    }
}
