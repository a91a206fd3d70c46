//! Moving identifiers between holders.
//!
//! Amount-based transfers pick spans with the ledger's selection policy;
//! range transfers name the span directly. Both end in the same place: each
//! span is split out of its range, handed to the new holder and merged with
//! matching neighbours.
//!
//! Custody follows the registry. Sending to a registered agent puts the
//! units in its custody (`custodian` is set, `owner` stays); an agent sending
//! to an account releases that account's custodied units back to it; an
//! agent can also reassign beneficial ownership between the accounts it
//! holds for without releasing anything.

use rangebook_core::{Address, Holder, Range, Slot, Span};
use rangebook_perms::TransferParticipants;
use tracing::info;

use crate::error::{LedgerError, Result};
use crate::ledger::{check_amount, logged, Ledger};

/// How a selected span changes hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    /// Directly held span gets a new owner.
    Direct(Address),
    /// Directly held span enters custody with the agent.
    Enter(Address),
    /// Custodied span returns to its owner.
    Exit,
    /// Custodied span gets a new beneficial owner under the same agent.
    Internal(Address),
}

impl Move {
    /// Rewrite `range` for its new holder.
    ///
    /// A moved range is spendable at `now`, so an expired lock is cleared and
    /// the range can merge with unlocked neighbours.
    fn apply(self, range: &mut Range, now: u64) {
        if range.lock_time <= now {
            range.lock_time = 0;
        }
        match self {
            Move::Direct(to) | Move::Internal(to) => range.owner = to,
            Move::Enter(agent) => range.custodian = Some(agent),
            Move::Exit => range.custodian = None,
        }
    }
}

impl Ledger {
    /// Move `amount` units from `from` to `to`.
    ///
    /// Only unlocked ranges are eligible. When `to` is a custody agent the
    /// units enter its custody; when `from` is one, `to`'s custodied units
    /// are released back to `to`. Returns the spans that moved.
    pub fn transfer(&mut self, from: Address, to: Address, amount: u64) -> Result<Vec<Span>> {
        let result = self.apply_transfer(from, to, amount);
        logged("transfer", result)
    }

    fn apply_transfer(&mut self, from: Address, to: Address, amount: u64) -> Result<Vec<Span>> {
        check_amount(amount)?;
        check_parties(&from, &to)?;

        let (source, participants, step) = match (self.is_custodian(&from), self.is_custodian(&to)) {
            (true, true) => {
                return Err(LedgerError::CustodianViolation(
                    "transfers between custody agents are not allowed",
                ))
            }
            (false, true) => (
                Holder::direct(from),
                TransferParticipants::custodial(from, to, to),
                Move::Enter(to),
            ),
            (true, false) => {
                let source = Holder::custodied(to, from);
                if amount > self.holder_width(&source) {
                    return Err(LedgerError::CustodianViolation(
                        "amount exceeds custodial balance",
                    ));
                }
                (
                    source,
                    TransferParticipants::custodial(from, to, from),
                    Move::Exit,
                )
            }
            (false, false) => (
                Holder::direct(from),
                TransferParticipants::direct(from, to),
                Move::Direct(to),
            ),
        };

        let spans = self.select(&source, amount)?;
        self.modules.check_transfer(&participants, amount)?;
        self.apply_move(&spans, step);

        info!(from = %from, to = %to, amount, spans = spans.len(), ?step, "transferred");
        Ok(spans)
    }

    /// Reassign `amount` custodied units from `from` to `to`, both staying in
    /// `custodian`'s custody.
    pub fn transfer_internal(
        &mut self,
        custodian: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<Vec<Span>> {
        let result = self.apply_transfer_internal(custodian, from, to, amount);
        logged("transfer_internal", result)
    }

    fn apply_transfer_internal(
        &mut self,
        custodian: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<Vec<Span>> {
        check_amount(amount)?;
        check_parties(&from, &to)?;
        if !self.is_custodian(&custodian) {
            return Err(LedgerError::CustodianViolation(
                "caller is not a registered custody agent",
            ));
        }
        if self.is_custodian(&to) {
            return Err(LedgerError::CustodianViolation(
                "custodied units cannot be assigned to a custody agent",
            ));
        }

        let source = Holder::custodied(from, custodian);
        if amount > self.holder_width(&source) {
            return Err(LedgerError::CustodianViolation(
                "amount exceeds custodial balance",
            ));
        }

        let spans = self.select(&source, amount)?;
        let participants = TransferParticipants::custodial(from, to, custodian);
        self.modules.check_transfer(&participants, amount)?;
        self.apply_move(&spans, Move::Internal(to));

        info!(
            custodian = %custodian,
            from = %from,
            to = %to,
            amount,
            "transferred under custody"
        );
        Ok(spans)
    }

    /// Move exactly `[start, stop)` from `from` to `to`.
    ///
    /// The span must lie inside one live range that `from` holds directly,
    /// or that `from` holds as custody agent (in which case it can only go
    /// back to its owner).
    pub fn transfer_range(&mut self, from: Address, to: Address, start: u64, stop: u64) -> Result<()> {
        let result = self.apply_transfer_range(from, to, Span::new(start, stop));
        logged("transfer_range", result)
    }

    fn apply_transfer_range(&mut self, from: Address, to: Address, span: Span) -> Result<()> {
        check_parties(&from, &to)?;
        self.check_issued(span)?;

        let range = match self.index.locate(span.start) {
            Some(Slot::Live(range)) => range,
            _ => {
                return Err(LedgerError::InsufficientBalance {
                    requested: span.width(),
                    available: 0,
                })
            }
        };
        if span.stop > range.stop {
            return Err(LedgerError::RangeNotUniform(span));
        }

        let to_agent = self.is_custodian(&to);
        let (participants, step) = match range.custodian {
            Some(agent) if agent == from => {
                if to != range.owner {
                    return Err(LedgerError::CustodianViolation(
                        "custodied units can only return to their owner",
                    ));
                }
                (TransferParticipants::custodial(from, to, from), Move::Exit)
            }
            Some(_) if range.owner == from => {
                return Err(LedgerError::CustodianViolation(
                    "span is held by a custody agent",
                ))
            }
            None if range.owner == from => {
                if to_agent && self.is_custodian(&from) {
                    return Err(LedgerError::CustodianViolation(
                        "transfers between custody agents are not allowed",
                    ));
                }
                if to_agent {
                    (TransferParticipants::custodial(from, to, to), Move::Enter(to))
                } else {
                    (TransferParticipants::direct(from, to), Move::Direct(to))
                }
            }
            _ => {
                return Err(LedgerError::InsufficientBalance {
                    requested: span.width(),
                    available: 0,
                })
            }
        };

        let now = self.now();
        if range.is_locked(now) {
            return Err(LedgerError::RangeLocked {
                span,
                until: range.lock_time,
            });
        }

        self.modules.check_transfer_range(&participants, span)?;
        self.apply_move(&[span], step);

        info!(from = %from, to = %to, %span, ?step, "range transferred");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mechanics
    // ─────────────────────────────────────────────────────────────────────────

    /// Pick spans worth `amount` from the unlocked ranges filed under
    /// `source`.
    fn select(&self, source: &Holder, amount: u64) -> Result<Vec<Span>> {
        let now = self.now();
        let candidates: Vec<Span> = self
            .index
            .holder_ranges(source)
            .filter(|r| !r.is_locked(now))
            .map(Range::span)
            .collect();

        let available: u64 = candidates.iter().map(Span::width).sum();
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        Ok(self.selection.select(&candidates, amount))
    }

    fn apply_move(&mut self, spans: &[Span], step: Move) {
        let now = self.now();
        for span in spans {
            self.index.rewrite(*span, |range| step.apply(range, now));
        }
    }
}

fn check_parties(from: &Address, to: &Address) -> Result<()> {
    if from == to {
        return Err(LedgerError::SelfTransfer);
    }
    if *to == Address::ZERO {
        return Err(LedgerError::ZeroAddress);
    }
    Ok(())
}
