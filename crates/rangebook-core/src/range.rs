//! Range: a contiguous block of identifiers sharing every attribute.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Address, Tag};

/// A half-open identifier interval `[start, stop)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u64,
    pub stop: u64,
}

impl Span {
    pub const fn new(start: u64, stop: u64) -> Self {
        Self { start, stop }
    }

    /// Number of identifiers in the span. Zero for inverted spans.
    pub const fn width(&self) -> u64 {
        self.stop.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    pub const fn contains(&self, id: u64) -> bool {
        self.start <= id && id < self.stop
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<(u64, u64)> for Span {
    fn from((start, stop): (u64, u64)) -> Self {
        Self { start, stop }
    }
}

/// The ownership dimension a range is filed under.
///
/// `custodian == None` is direct holding; `Some(agent)` means the range is
/// held by `agent` on behalf of `owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Holder {
    pub owner: Address,
    pub custodian: Option<Address>,
}

impl Holder {
    /// A holder that owns its ranges directly.
    pub const fn direct(owner: Address) -> Self {
        Self {
            owner,
            custodian: None,
        }
    }

    /// A beneficial owner whose ranges sit with a custody agent.
    pub const fn custodied(owner: Address, custodian: Address) -> Self {
        Self {
            owner,
            custodian: Some(custodian),
        }
    }
}

/// A live range record.
///
/// This is the sole durable unit of ledger state: the full ledger is the
/// start-ordered collection of these records plus the identifier cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// First identifier (inclusive).
    pub start: u64,

    /// One past the last identifier (exclusive).
    pub stop: u64,

    /// Beneficial owner.
    pub owner: Address,

    /// Custody agent holding the range, if any.
    pub custodian: Option<Address>,

    /// Unix seconds before which the range cannot move. Zero means unlocked.
    pub lock_time: u64,

    /// Opaque compliance tag.
    pub tag: Tag,
}

impl Range {
    /// A directly held, unlocked range.
    pub fn new(start: u64, stop: u64, owner: Address, tag: Tag) -> Self {
        Self {
            start,
            stop,
            owner,
            custodian: None,
            lock_time: 0,
            tag,
        }
    }

    pub fn with_lock_time(mut self, lock_time: u64) -> Self {
        self.lock_time = lock_time;
        self
    }

    pub fn with_custodian(mut self, custodian: Address) -> Self {
        self.custodian = Some(custodian);
        self
    }

    pub fn width(&self) -> u64 {
        self.stop - self.start
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.stop)
    }

    pub fn holder(&self) -> Holder {
        Holder {
            owner: self.owner,
            custodian: self.custodian,
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.start <= id && id < self.stop
    }

    /// True while `now` is before the lock time.
    pub fn is_locked(&self, now: u64) -> bool {
        self.lock_time > now
    }

    /// Compare every non-positional attribute.
    pub fn same_attributes(&self, other: &Range) -> bool {
        self.owner == other.owner
            && self.custodian == other.custodian
            && self.lock_time == other.lock_time
            && self.tag == other.tag
    }

    /// Whether `next` directly continues this range and can be folded into it.
    pub fn mergeable_with(&self, next: &Range) -> bool {
        self.stop == next.start && self.same_attributes(next)
    }
}

/// The answer to "who holds identifier `id`?".
///
/// Burned and never-split gaps report `owner == None` with the gap bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeView {
    pub owner: Option<Address>,
    pub start: u64,
    pub stop: u64,
    pub lock_time: u64,
    pub tag: Tag,
    pub custodian: Option<Address>,
}

impl RangeView {
    pub fn is_burned(&self) -> bool {
        self.owner.is_none()
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.stop)
    }
}

impl From<&Range> for RangeView {
    fn from(range: &Range) -> Self {
        Self {
            owner: Some(range.owner),
            start: range.start,
            stop: range.stop,
            lock_time: range.lock_time,
            tag: range.tag.clone(),
            custodian: range.custodian,
        }
    }
}

impl From<Span> for RangeView {
    fn from(gap: Span) -> Self {
        Self {
            owner: None,
            start: gap.start,
            stop: gap.stop,
            lock_time: 0,
            tag: Tag::empty(),
            custodian: None,
        }
    }
}
