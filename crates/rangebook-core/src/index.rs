//! RangeIndex: the sparse interval map that owns all ledger state.
//!
//! Live ranges are stored in a `BTreeMap` keyed by `start`, so resolving an
//! identifier is a predecessor lookup (`range(..=id).next_back()`) costing
//! O(log R) in the number of live ranges, never in the number of identifiers.
//!
//! Two secondary indexes are derived from the records and kept in step with
//! every mutation:
//!
//! - holder -> starts, so balances and amount-based selection only walk the
//!   ranges of the parties involved
//! - custodian -> starts, for custody-agent balances
//!
//! Every mutation also appends to a change journal. Callers drain it with
//! [`RangeIndex::take_changes`] after an operation and hand it to storage.
//!
//! ## Merging
//!
//! Merges are opportunistic: after a boundary moves, only the two neighbours
//! of the touched range are examined. Nothing ever scans the whole index, so
//! the cost of one operation is independent of R.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::ValidationError;
use crate::range::{Holder, Range, Span};
use crate::types::{Address, FIRST_ID};
use crate::validation::validate_records;

/// A single durable change produced by a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeChange {
    /// Insert or overwrite the record keyed by `range.start`.
    Put(Range),
    /// Remove the record keyed by this start.
    Delete(u64),
}

impl RangeChange {
    pub fn start(&self) -> u64 {
        match self {
            RangeChange::Put(range) => range.start,
            RangeChange::Delete(start) => *start,
        }
    }
}

/// What occupies an identifier below the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    /// A live range covers the identifier.
    Live(&'a Range),
    /// The identifier was burned; the span is the whole ownerless gap.
    Burned(Span),
}

/// Sparse, start-ordered interval map of live ranges.
#[derive(Debug, Clone)]
pub struct RangeIndex {
    /// Live ranges keyed by start.
    ranges: BTreeMap<u64, Range>,

    /// Index: holder -> starts of its ranges.
    by_holder: HashMap<Holder, BTreeSet<u64>>,

    /// Index: custody agent -> starts of the ranges it holds.
    by_custodian: HashMap<Address, BTreeSet<u64>>,

    /// Next identifier to issue. Only ever increases.
    cursor: u64,

    /// Changes since the last drain.
    journal: Vec<RangeChange>,
}

impl Default for RangeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeIndex {
    /// Create an empty index. The first mint starts at [`FIRST_ID`].
    pub fn new() -> Self {
        Self {
            ranges: BTreeMap::new(),
            by_holder: HashMap::new(),
            by_custodian: HashMap::new(),
            cursor: FIRST_ID,
            journal: Vec::new(),
        }
    }

    /// Rebuild an index from persisted records.
    ///
    /// The records must describe a valid state: disjoint, below the cursor,
    /// and maximal (no adjacent pair with identical attributes).
    pub fn from_records(
        cursor: u64,
        records: impl IntoIterator<Item = Range>,
    ) -> Result<Self, ValidationError> {
        let mut records: Vec<Range> = records.into_iter().collect();
        records.sort_by_key(|r| r.start);
        validate_records(cursor, &records)?;

        let mut index = Self::new();
        index.cursor = cursor;
        for range in records {
            index.index_entry(&range);
            index.ranges.insert(range.start, range);
        }
        Ok(index)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Next identifier to be issued.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Number of live ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// All live ranges in start order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Range> + '_ {
        self.ranges.values()
    }

    /// Sum of live range widths.
    pub fn live_width(&self) -> u64 {
        self.ranges.values().map(Range::width).sum()
    }

    /// The record starting exactly at `start`.
    pub fn get(&self, start: u64) -> Option<&Range> {
        self.ranges.get(&start)
    }

    /// The live range containing `id`, via predecessor lookup.
    pub fn find(&self, id: u64) -> Option<&Range> {
        self.ranges
            .range(..=id)
            .next_back()
            .map(|(_, range)| range)
            .filter(|range| id < range.stop)
    }

    /// Resolve `id` to its live range or its burned gap.
    ///
    /// Returns `None` for identifiers outside `[FIRST_ID, cursor)`.
    pub fn locate(&self, id: u64) -> Option<Slot<'_>> {
        if id < FIRST_ID || id >= self.cursor {
            return None;
        }

        let predecessor = self.ranges.range(..=id).next_back().map(|(_, r)| r);
        if let Some(range) = predecessor {
            if id < range.stop {
                return Some(Slot::Live(range));
            }
        }

        let gap_start = predecessor.map_or(FIRST_ID, |r| r.stop);
        let gap_stop = self
            .ranges
            .range(id + 1..)
            .next()
            .map_or(self.cursor, |(start, _)| *start);
        Some(Slot::Burned(Span::new(gap_start, gap_stop)))
    }

    /// Ranges filed under `holder`, in start order.
    pub fn holder_ranges(
        &self,
        holder: &Holder,
    ) -> impl DoubleEndedIterator<Item = &Range> + '_ {
        self.by_holder
            .get(holder)
            .into_iter()
            .flatten()
            .filter_map(|start| self.ranges.get(start))
    }

    /// Ranges held by custody agent `custodian` for any owner, in start order.
    pub fn custodian_ranges(
        &self,
        custodian: &Address,
    ) -> impl DoubleEndedIterator<Item = &Range> + '_ {
        self.by_custodian
            .get(custodian)
            .into_iter()
            .flatten()
            .filter_map(|start| self.ranges.get(start))
    }

    /// Every holder that currently has ranges beneficially owned by `owner`.
    pub fn holders_of(&self, owner: &Address) -> Vec<Holder> {
        let mut holders: Vec<Holder> = self
            .by_holder
            .keys()
            .filter(|h| &h.owner == owner)
            .copied()
            .collect();
        holders.sort_by_key(|h| h.custodian);
        holders
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Boundary primitives
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a freshly minted range at the cursor and advance the cursor.
    ///
    /// Merges with the preceding range when it is contiguous and identical.
    /// Returns the start of the range that now contains the minted span.
    pub fn append(&mut self, range: Range) -> u64 {
        debug_assert_eq!(range.start, self.cursor, "append must start at cursor");
        debug_assert!(range.stop > range.start);

        let start = range.start;
        self.cursor = range.stop;
        self.insert_entry(range);
        self.merge_with_predecessor(start)
    }

    /// Split the range containing `id` into `[start, id)` and `[id, stop)`.
    ///
    /// No-op (returns false) when `id` is a range start or lies in a gap.
    pub fn split_at(&mut self, id: u64) -> bool {
        let start = match self.find(id) {
            Some(range) if range.start != id => range.start,
            _ => return false,
        };

        let Some(mut left) = self.remove_entry(start) else {
            return false;
        };
        let mut right = left.clone();
        left.stop = id;
        right.start = id;
        self.insert_entry(left);
        self.insert_entry(right);
        true
    }

    /// Merge the ranges at `left` and `right` if `left.stop == right.start`
    /// and every attribute matches. Returns whether a merge happened.
    pub fn merge_if_adjacent(&mut self, left: u64, right: u64) -> bool {
        let mergeable = match (self.ranges.get(&left), self.ranges.get(&right)) {
            (Some(a), Some(b)) => a.mergeable_with(b),
            _ => false,
        };
        if !mergeable {
            return false;
        }

        let Some(absorbed) = self.remove_entry(right) else {
            return false;
        };
        if let Some(range) = self.ranges.get_mut(&left) {
            range.stop = absorbed.stop;
            self.journal.push(RangeChange::Put(range.clone()));
        }
        true
    }

    /// Try to fold the range at `start` into its predecessor.
    ///
    /// Returns the start of the range now containing `start`.
    pub fn merge_with_predecessor(&mut self, start: u64) -> u64 {
        let Some(prev) = self.ranges.range(..start).next_back().map(|(s, _)| *s) else {
            return start;
        };
        if self.merge_if_adjacent(prev, start) {
            prev
        } else {
            start
        }
    }

    /// Try to fold the successor into the range at `start`.
    pub fn merge_with_successor(&mut self, start: u64) -> bool {
        match self.ranges.get(&start) {
            Some(range) => {
                let next = range.stop;
                self.merge_if_adjacent(start, next)
            }
            None => false,
        }
    }

    /// Try both neighbours of the range at `start`.
    ///
    /// Returns the start of the resulting range.
    pub fn merge_around(&mut self, start: u64) -> u64 {
        let start = self.merge_with_predecessor(start);
        self.merge_with_successor(start);
        start
    }

    /// Remove `span` from the index, returning the removed record.
    ///
    /// The caller guarantees `span` lies inside a single live range. The
    /// remainders on either side keep their original attributes.
    pub fn remove_span(&mut self, span: Span) -> Option<Range> {
        let covering = self.find(span.start)?;
        if span.stop > covering.stop || span.is_empty() {
            return None;
        }

        self.split_at(span.start);
        self.split_at(span.stop);
        self.remove_entry(span.start)
    }

    /// Rewrite every live range inside `span` with `edit`, splitting at both
    /// boundaries first and merging with neighbours afterwards.
    ///
    /// Gaps inside the span are skipped. `edit` must not change positions.
    /// Returns the number of records that were rewritten.
    pub fn rewrite(&mut self, span: Span, mut edit: impl FnMut(&mut Range)) -> usize {
        if span.is_empty() {
            return 0;
        }

        self.split_at(span.start);
        self.split_at(span.stop);

        let starts: Vec<u64> = self
            .ranges
            .range(span.start..span.stop)
            .map(|(start, _)| *start)
            .collect();

        for &start in &starts {
            if let Some(mut range) = self.remove_entry(start) {
                edit(&mut range);
                debug_assert_eq!(range.start, start, "rewrite must not move ranges");
                self.insert_entry(range);
            }
        }

        // Left edges of every rewritten range, then the right edge of the last.
        let mut last = None;
        for &start in &starts {
            last = Some(self.merge_with_predecessor(start));
        }
        if let Some(last) = last {
            self.merge_with_successor(last);
        }

        starts.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Journal
    // ─────────────────────────────────────────────────────────────────────────

    /// Drain the change journal, keeping only the final state per start.
    pub fn take_changes(&mut self) -> Vec<RangeChange> {
        let mut latest: BTreeMap<u64, RangeChange> = BTreeMap::new();
        for change in self.journal.drain(..) {
            latest.insert(change.start(), change);
        }
        latest.into_values().collect()
    }

    /// Whether mutations happened since the last drain.
    pub fn has_changes(&self) -> bool {
        !self.journal.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entry bookkeeping
    // ─────────────────────────────────────────────────────────────────────────

    fn insert_entry(&mut self, range: Range) {
        self.index_entry(&range);
        self.journal.push(RangeChange::Put(range.clone()));
        self.ranges.insert(range.start, range);
    }

    fn remove_entry(&mut self, start: u64) -> Option<Range> {
        let range = self.ranges.remove(&start)?;
        self.unindex_entry(&range);
        self.journal.push(RangeChange::Delete(start));
        Some(range)
    }

    fn index_entry(&mut self, range: &Range) {
        self.by_holder
            .entry(range.holder())
            .or_default()
            .insert(range.start);
        if let Some(custodian) = range.custodian {
            self.by_custodian
                .entry(custodian)
                .or_default()
                .insert(range.start);
        }
    }

    fn unindex_entry(&mut self, range: &Range) {
        let holder = range.holder();
        if let Some(starts) = self.by_holder.get_mut(&holder) {
            starts.remove(&range.start);
            if starts.is_empty() {
                self.by_holder.remove(&holder);
            }
        }
        if let Some(custodian) = range.custodian {
            if let Some(starts) = self.by_custodian.get_mut(&custodian) {
                starts.remove(&range.start);
                if starts.is_empty() {
                    self.by_custodian.remove(&custodian);
                }
            }
        }
    }

    /// Check the secondary indexes against the records.
    ///
    /// Used by validation; costs O(R).
    pub(crate) fn check_secondary_indexes(&self) -> Result<(), ValidationError> {
        let mut indexed = 0usize;
        for (holder, starts) in &self.by_holder {
            for start in starts {
                match self.ranges.get(start) {
                    Some(range) if range.holder() == *holder => indexed += 1,
                    _ => return Err(ValidationError::IndexMismatch(*start)),
                }
            }
        }
        if indexed != self.ranges.len() {
            return Err(ValidationError::IndexMismatch(0));
        }

        for (custodian, starts) in &self.by_custodian {
            for start in starts {
                match self.ranges.get(start) {
                    Some(range) if range.custodian == Some(*custodian) => {}
                    _ => return Err(ValidationError::IndexMismatch(*start)),
                }
            }
        }
        Ok(())
    }
}
