//! Editing lock times and tags in place.

use rangebook_core::{Slot, Span, Tag, FIRST_ID};
use tracing::info;

use crate::error::{LedgerError, Result};
use crate::ledger::{logged, Ledger};

impl Ledger {
    /// Overwrite the lock time and tag of the whole live range containing
    /// `id`. The range then merges with neighbours that now match.
    pub fn modify_range(&mut self, id: u64, lock_time: u64, tag: Tag) -> Result<usize> {
        let result = self.apply_modify_range(id, lock_time, tag);
        logged("modify_range", result)
    }

    fn apply_modify_range(&mut self, id: u64, lock_time: u64, tag: Tag) -> Result<usize> {
        self.check_lock_time(lock_time)?;
        let point = Span::new(id, id.saturating_add(1));
        if id < FIRST_ID || id >= self.index.cursor() {
            return Err(LedgerError::OutOfRange(point));
        }
        let span = match self.index.locate(id) {
            Some(Slot::Live(range)) => range.span(),
            _ => return Err(LedgerError::RangeNotUniform(point)),
        };
        Ok(self.edit(span, lock_time, tag))
    }

    /// Overwrite the lock time and tag of every identifier in
    /// `[start, stop)`, whoever holds it.
    ///
    /// Ranges are split at both ends of the span and merged with matching
    /// neighbours afterwards; burned gaps inside the span are skipped.
    /// Returns the number of records rewritten.
    pub fn modify_ranges(
        &mut self,
        start: u64,
        stop: u64,
        lock_time: u64,
        tag: Tag,
    ) -> Result<usize> {
        let result = self.apply_modify_ranges(Span::new(start, stop), lock_time, tag);
        logged("modify_ranges", result)
    }

    fn apply_modify_ranges(&mut self, span: Span, lock_time: u64, tag: Tag) -> Result<usize> {
        self.check_issued(span)?;
        self.check_lock_time(lock_time)?;
        Ok(self.edit(span, lock_time, tag))
    }

    fn edit(&mut self, span: Span, lock_time: u64, tag: Tag) -> usize {
        let rewritten = self.index.rewrite(span, |range| {
            range.lock_time = lock_time;
            range.tag = tag.clone();
        });
        info!(%span, lock_time, tag = %tag.to_hex(), rewritten, "ranges modified");
        rewritten
    }
}
