//! Read-only queries: balances, enumerations and point lookups.
//!
//! All sums walk the secondary holder index, so cost follows the number of
//! ranges a holder has rather than the size of the ledger.

use rangebook_core::{Address, Holder, Range, RangeView, Slot, Span};

use crate::ledger::Ledger;

impl Ledger {
    /// Units held by `account`.
    ///
    /// For a registered custody agent this is everything in its custody plus
    /// its own direct holdings; for anyone else only direct holdings count.
    pub fn balance_of(&self, account: &Address) -> u64 {
        let direct = self.holder_width(&Holder::direct(*account));
        if self.is_custodian(account) {
            let custodied: u64 = self
                .index
                .custodian_ranges(account)
                .map(Range::width)
                .sum();
            direct + custodied
        } else {
            direct
        }
    }

    /// Units `owner` has in `custodian`'s custody.
    pub fn custodian_balance_of(&self, owner: &Address, custodian: &Address) -> u64 {
        self.holder_width(&Holder::custodied(*owner, *custodian))
    }

    /// Directly held units of `account` that are unlocked at `now`.
    pub fn spendable_balance_of(&self, account: &Address, now: u64) -> u64 {
        self.index
            .holder_ranges(&Holder::direct(*account))
            .filter(|r| !r.is_locked(now))
            .map(Range::width)
            .sum()
    }

    /// Every unit beneficially owned by `owner`, custodied or not.
    pub fn holdings_of(&self, owner: &Address) -> u64 {
        self.index
            .holders_of(owner)
            .iter()
            .map(|holder| self.holder_width(holder))
            .sum()
    }

    /// Spans `account` holds directly, in start order.
    pub fn ranges_of(&self, account: &Address) -> Vec<Span> {
        self.index
            .holder_ranges(&Holder::direct(*account))
            .map(Range::span)
            .collect()
    }

    /// Spans `owner` has in `custodian`'s custody, in start order.
    pub fn custodian_ranges_of(&self, owner: &Address, custodian: &Address) -> Vec<Span> {
        self.index
            .holder_ranges(&Holder::custodied(*owner, *custodian))
            .map(Range::span)
            .collect()
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn authorized_supply(&self) -> u64 {
        self.authorized_supply
    }

    /// Who holds identifier `id`.
    ///
    /// A burned identifier reports `owner == None` with the bounds of its
    /// gap. Returns `None` for identifiers that were never issued.
    pub fn get_range(&self, id: u64) -> Option<RangeView> {
        match self.index.locate(id)? {
            Slot::Live(range) => Some(RangeView::from(range)),
            Slot::Burned(gap) => Some(RangeView::from(gap)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rangebook_core::Tag;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::LedgerConfig;

    const NOW: u64 = 1_700_000_000;

    fn setup() -> (Ledger, Address, Address, Address) {
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let vault = Address::derive("vault");
        let mut ledger =
            Ledger::with_clock(LedgerConfig::default(), Arc::new(ManualClock::new(NOW)));
        ledger.register_custodian(vault).unwrap();
        ledger.mint(alice, 1_000, 0, Tag::empty()).unwrap();
        ledger.mint(bob, 500, NOW + 10, Tag::empty()).unwrap();
        ledger.transfer(alice, vault, 300).unwrap();
        (ledger, alice, bob, vault)
    }

    #[test]
    fn test_balances() {
        let (ledger, alice, bob, vault) = setup();
        assert_eq!(ledger.balance_of(&alice), 700);
        assert_eq!(ledger.balance_of(&bob), 500);
        assert_eq!(ledger.balance_of(&vault), 300);
        assert_eq!(ledger.custodian_balance_of(&alice, &vault), 300);
        assert_eq!(ledger.custodian_balance_of(&bob, &vault), 0);
    }

    #[test]
    fn test_spendable_excludes_locked_and_custodied() {
        let (ledger, alice, bob, _) = setup();
        assert_eq!(ledger.spendable_balance_of(&alice, NOW), 700);
        assert_eq!(ledger.spendable_balance_of(&bob, NOW), 0);
        assert_eq!(ledger.spendable_balance_of(&bob, NOW + 10), 500);
    }

    #[test]
    fn test_holdings_cover_direct_and_custodied() {
        let (ledger, alice, _, vault) = setup();
        assert_eq!(ledger.holdings_of(&alice), 1_000);
        assert_eq!(
            ledger.balance_of(&alice) + ledger.custodian_balance_of(&alice, &vault),
            ledger.holdings_of(&alice)
        );
    }

    #[test]
    fn test_enumerations_are_start_ordered() {
        let (ledger, alice, _, vault) = setup();
        assert_eq!(ledger.custodian_ranges_of(&alice, &vault), vec![Span::new(1, 301)]);
        assert_eq!(ledger.ranges_of(&alice), vec![Span::new(301, 1_001)]);
    }

    #[test]
    fn test_get_range() {
        let (mut ledger, alice, bob, vault) = setup();
        let view = ledger.get_range(1).unwrap();
        assert_eq!(view.owner, Some(alice));
        assert_eq!(view.custodian, Some(vault));
        assert_eq!(view.span(), Span::new(1, 301));

        let view = ledger.get_range(1_200).unwrap();
        assert_eq!(view.owner, Some(bob));
        assert_eq!(view.lock_time, NOW + 10);

        ledger.burn(400, 500).unwrap();
        let gap = ledger.get_range(450).unwrap();
        assert!(gap.is_burned());
        assert_eq!(gap.span(), Span::new(400, 500));

        assert!(ledger.get_range(0).is_none());
        assert!(ledger.get_range(1_501).is_none());
    }
}
