//! Issuance: mint, burn and the authorized-supply cap.
//!
//! Minting only ever appends at the cursor, and burning leaves a gap that is
//! never re-issued, so identifier positions are permanent.

use rangebook_core::{Address, Range, Slot, Span, Tag, ID_CEILING};
use tracing::info;

use crate::error::{LedgerError, Result, SupplyLimit};
use crate::ledger::{logged, Ledger};

impl Ledger {
    /// Issue `amount` fresh identifiers to `owner` at the cursor.
    ///
    /// The new span merges with the preceding range when that range is held
    /// directly by `owner` with the same lock time and tag. Returns the
    /// issued span.
    ///
    /// Checked in order: zero amount, zero address, custody agent,
    /// identifier ceiling, authorized supply, lock time.
    pub fn mint(&mut self, owner: Address, amount: u64, lock_time: u64, tag: Tag) -> Result<Span> {
        let result = self.apply_mint(owner, amount, lock_time, tag);
        logged("mint", result)
    }

    fn apply_mint(&mut self, owner: Address, amount: u64, lock_time: u64, tag: Tag) -> Result<Span> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if owner == Address::ZERO {
            return Err(LedgerError::ZeroAddress);
        }
        if self.is_custodian(&owner) {
            return Err(LedgerError::CustodianViolation(
                "custody agents cannot receive newly minted units",
            ));
        }

        let start = self.index.cursor();
        let headroom = ID_CEILING.saturating_sub(start);
        if amount > headroom {
            return Err(LedgerError::SupplyExceeded {
                limit: SupplyLimit::IdentifierCeiling,
                requested: amount,
                available: headroom,
            });
        }
        let available = self.authorized_supply.saturating_sub(self.total_supply);
        if amount > available {
            return Err(LedgerError::SupplyExceeded {
                limit: SupplyLimit::Authorized,
                requested: amount,
                available,
            });
        }
        self.check_lock_time(lock_time)?;

        let span = Span::new(start, start + amount);
        self.index
            .append(Range::new(span.start, span.stop, owner, tag).with_lock_time(lock_time));

        let old = self.total_supply;
        self.total_supply += amount;
        self.modules
            .notify_supply_changed(&owner, old, self.total_supply);

        info!(owner = %owner, %span, total_supply = self.total_supply, "minted");
        Ok(span)
    }

    /// Destroy the identifiers in `[start, stop)`.
    ///
    /// The span must lie inside one live, directly held range. The remainders
    /// on either side keep their attributes and the identifiers are never
    /// issued again. Returns the record that was removed.
    pub fn burn(&mut self, start: u64, stop: u64) -> Result<Range> {
        let result = self.apply_burn(Span::new(start, stop));
        logged("burn", result)
    }

    fn apply_burn(&mut self, span: Span) -> Result<Range> {
        self.check_issued(span)?;

        let owner = match self.index.locate(span.start) {
            Some(Slot::Live(range)) => {
                if span.stop > range.stop {
                    return Err(LedgerError::RangeNotUniform(span));
                }
                if range.custodian.is_some() {
                    return Err(LedgerError::CustodianViolation(
                        "custodied ranges cannot be burned",
                    ));
                }
                range.owner
            }
            Some(Slot::Burned(_)) => return Err(LedgerError::AlreadyBurned(span)),
            None => return Err(LedgerError::OutOfRange(span)),
        };

        let removed = self
            .index
            .remove_span(span)
            .ok_or(LedgerError::RangeNotUniform(span))?;

        let old = self.total_supply;
        self.total_supply -= span.width();
        self.modules
            .notify_supply_changed(&owner, old, self.total_supply);

        info!(owner = %owner, %span, total_supply = self.total_supply, "burned");
        Ok(removed)
    }

    /// Set a new issuance cap.
    ///
    /// The cap may not drop below the outstanding total, and every attached
    /// supply check must approve the change.
    pub fn modify_authorized_supply(&mut self, authorized_supply: u64) -> Result<()> {
        let result = self.apply_authorized_supply(authorized_supply);
        logged("modify_authorized_supply", result)
    }

    fn apply_authorized_supply(&mut self, cap: u64) -> Result<()> {
        if cap < self.total_supply {
            return Err(LedgerError::CapBelowOutstanding {
                cap,
                outstanding: self.total_supply,
            });
        }
        let old = self.authorized_supply;
        self.modules.check_authorized_supply(old, cap)?;
        self.authorized_supply = cap;
        info!(old, new = cap, "authorized supply changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rangebook_core::{Span, FIRST_ID};
    use rangebook_perms::{Decision, ModuleHooks, SupplyCheck, SupplyObserver};

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::LedgerConfig;

    const NOW: u64 = 1_700_000_000;

    fn ledger_with_cap(cap: u64) -> Ledger {
        Ledger::with_clock(
            LedgerConfig::default().with_authorized_supply(cap),
            Arc::new(ManualClock::new(NOW)),
        )
    }

    fn alice() -> Address {
        Address::derive("alice")
    }

    fn tag(bytes: &'static [u8]) -> Tag {
        Tag::from_static(bytes)
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(u64, u64)>>);

    impl SupplyObserver for Recorder {
        fn total_supply_changed(&self, _owner: &Address, old: u64, new: u64) {
            self.0.lock().unwrap().push((old, new));
        }
    }

    struct CapCeiling(u64);

    impl SupplyCheck for CapCeiling {
        fn check_authorized_supply(&self, _old: u64, new: u64) -> Decision {
            if new > self.0 {
                Decision::deny("cap too high")
            } else {
                Decision::Allow
            }
        }
    }

    #[test]
    fn test_mint_appends_at_cursor() {
        let mut ledger = ledger_with_cap(1_000_000);
        let span = ledger.mint(alice(), 10_000, 0, tag(b"A")).unwrap();
        assert_eq!(span, Span::new(FIRST_ID, 10_001));
        assert_eq!(ledger.cursor(), 10_001);
        assert_eq!(ledger.total_supply(), 10_000);
    }

    #[test]
    fn test_mint_merges_matching_predecessor() {
        let mut ledger = ledger_with_cap(1_000_000);
        ledger.mint(alice(), 10_000, 0, tag(b"A")).unwrap();
        ledger.mint(alice(), 5_000, 0, tag(b"A")).unwrap();
        assert_eq!(ledger.ranges_of(&alice()), vec![Span::new(1, 15_001)]);
        assert_eq!(ledger.index().len(), 1);
    }

    #[test]
    fn test_mint_check_order() {
        let mut ledger = ledger_with_cap(100);
        let vault = Address::derive("vault");
        ledger.register_custodian(vault).unwrap();

        assert!(matches!(
            ledger.mint(vault, 0, NOW - 1, tag(b"A")),
            Err(LedgerError::ZeroAmount)
        ));
        assert!(matches!(
            ledger.mint(vault, 1_000, NOW - 1, tag(b"A")),
            Err(LedgerError::CustodianViolation(_))
        ));
        assert!(matches!(
            ledger.mint(alice(), 1_000, NOW - 1, tag(b"A")),
            Err(LedgerError::SupplyExceeded {
                limit: SupplyLimit::Authorized,
                ..
            })
        ));
        assert!(matches!(
            ledger.mint(alice(), 10, NOW - 1, tag(b"A")),
            Err(LedgerError::LockNotInFuture { .. })
        ));
        assert!(matches!(
            ledger.mint(Address::ZERO, 10, 0, tag(b"A")),
            Err(LedgerError::ZeroAddress)
        ));
        assert_eq!(ledger.cursor(), FIRST_ID);
    }

    #[test]
    fn test_mint_up_to_cap_exactly() {
        let mut ledger = ledger_with_cap(100);
        ledger.mint(alice(), 60, 0, tag(b"A")).unwrap();
        ledger.mint(alice(), 40, 0, tag(b"A")).unwrap();
        let err = ledger.mint(alice(), 1, 0, tag(b"A")).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::SupplyExceeded {
                limit: SupplyLimit::Authorized,
                requested: 1,
                available: 0,
            }
        ));
    }

    #[test]
    fn test_mint_identifier_ceiling() {
        let mut ledger = ledger_with_cap(ID_CEILING - 1);
        ledger.mint(alice(), ID_CEILING - 2, 0, tag(b"A")).unwrap();
        assert_eq!(ledger.cursor(), ID_CEILING - 1);

        let err = ledger.mint(alice(), 2, 0, tag(b"A")).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::SupplyExceeded {
                limit: SupplyLimit::IdentifierCeiling,
                ..
            }
        ));

        // Burned identifiers free authorized supply but never cursor space.
        ledger.burn(1, 11).unwrap();
        ledger.mint(alice(), 1, 0, tag(b"A")).unwrap();
        assert_eq!(ledger.cursor(), ID_CEILING);
        assert!(matches!(
            ledger.mint(alice(), 1, 0, tag(b"A")),
            Err(LedgerError::SupplyExceeded {
                limit: SupplyLimit::IdentifierCeiling,
                ..
            })
        ));
    }

    #[test]
    fn test_mint_oversized_amount_hits_ceiling() {
        let mut ledger = ledger_with_cap(u64::MAX);
        for amount in [ID_CEILING, ID_CEILING + 1, u64::MAX] {
            assert!(matches!(
                ledger.mint(alice(), amount, 0, tag(b"A")),
                Err(LedgerError::SupplyExceeded {
                    limit: SupplyLimit::IdentifierCeiling,
                    ..
                })
            ));
        }
        assert_eq!(ledger.cursor(), 1);
        assert_eq!(ledger.total_supply(), 0);
        assert!(ledger.take_changes().is_empty());
    }

    #[test]
    fn test_future_lock_is_recorded() {
        let mut ledger = ledger_with_cap(1_000);
        ledger.mint(alice(), 10, NOW + 60, tag(b"A")).unwrap();
        assert_eq!(ledger.get_range(1).unwrap().lock_time, NOW + 60);
    }

    #[test]
    fn test_burn_middle_keeps_remainders() {
        let mut ledger = ledger_with_cap(1_000_000);
        ledger.mint(alice(), 100, 0, tag(b"A")).unwrap();

        let removed = ledger.burn(40, 60).unwrap();
        assert_eq!(removed.span(), Span::new(40, 60));
        assert_eq!(removed.owner, alice());
        assert_eq!(ledger.total_supply(), 80);
        assert_eq!(
            ledger.ranges_of(&alice()),
            vec![Span::new(1, 40), Span::new(60, 101)]
        );

        let gap = ledger.get_range(45).unwrap();
        assert_eq!(gap.owner, None);
        assert_eq!(gap.span(), Span::new(40, 60));
    }

    #[test]
    fn test_burn_single_identifier() {
        let mut ledger = ledger_with_cap(1_000);
        ledger.mint(alice(), 10, 0, tag(b"A")).unwrap();
        ledger.burn(5, 6).unwrap();
        assert_eq!(ledger.total_supply(), 9);
    }

    #[test]
    fn test_burn_rejections() {
        let mut ledger = ledger_with_cap(1_000_000);
        ledger.mint(alice(), 100, 0, tag(b"A")).unwrap();
        ledger.mint(alice(), 100, 0, tag(b"B")).unwrap();

        assert!(matches!(ledger.burn(5, 5), Err(LedgerError::ZeroAmount)));
        assert!(matches!(
            ledger.burn(0, 5),
            Err(LedgerError::OutOfRange(_))
        ));
        assert!(matches!(
            ledger.burn(150, 250),
            Err(LedgerError::OutOfRange(_))
        ));
        assert!(matches!(
            ledger.burn(90, 110),
            Err(LedgerError::RangeNotUniform(_))
        ));

        ledger.burn(1, 51).unwrap();
        assert!(matches!(
            ledger.burn(10, 20),
            Err(LedgerError::AlreadyBurned(_))
        ));
        assert_eq!(ledger.total_supply(), 150);
    }

    #[test]
    fn test_burn_custodied_rejected() {
        let mut ledger = ledger_with_cap(1_000);
        let vault = Address::derive("vault");
        ledger.register_custodian(vault).unwrap();
        ledger.mint(alice(), 100, 0, tag(b"A")).unwrap();
        ledger.transfer(alice(), vault, 100).unwrap();

        assert!(matches!(
            ledger.burn(1, 10),
            Err(LedgerError::CustodianViolation(_))
        ));
    }

    #[test]
    fn test_observers_see_old_and_new_totals() {
        let mut ledger = ledger_with_cap(1_000);
        let recorder = Arc::new(Recorder::default());
        ledger
            .attach_module(
                "recorder",
                ModuleHooks::new().with_observer(recorder.clone()),
            )
            .unwrap();

        ledger.mint(alice(), 100, 0, tag(b"A")).unwrap();
        ledger.burn(1, 11).unwrap();
        let _ = ledger.mint(alice(), 0, 0, tag(b"A"));

        assert_eq!(*recorder.0.lock().unwrap(), vec![(0, 100), (100, 90)]);
    }

    #[test]
    fn test_modify_authorized_supply() {
        let mut ledger = ledger_with_cap(1_000);
        ledger.mint(alice(), 600, 0, tag(b"A")).unwrap();

        assert!(matches!(
            ledger.modify_authorized_supply(599),
            Err(LedgerError::CapBelowOutstanding {
                cap: 599,
                outstanding: 600
            })
        ));
        ledger.modify_authorized_supply(600).unwrap();
        assert_eq!(ledger.authorized_supply(), 600);
        assert!(ledger.mint(alice(), 1, 0, tag(b"A")).is_err());
    }

    #[test]
    fn test_supply_check_can_veto_cap_change() {
        let mut ledger = ledger_with_cap(1_000);
        ledger
            .attach_module(
                "cap",
                ModuleHooks::new().with_supply_check(Arc::new(CapCeiling(5_000))),
            )
            .unwrap();

        ledger.modify_authorized_supply(5_000).unwrap();
        assert!(matches!(
            ledger.modify_authorized_supply(5_001),
            Err(LedgerError::Denied(_))
        ));
        assert_eq!(ledger.authorized_supply(), 5_000);
    }
}
