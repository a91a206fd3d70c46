//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use rangebook::{Address, Ledger, LedgerConfig, LedgerService, ManualClock, Tag};
use rangebook_perms::{ModuleHooks, RestrictionList};
use rangebook_store::MemoryStore;

/// Clock reading every fixture starts at (2023-11-14T22:13:20Z).
pub const GENESIS: u64 = 1_700_000_000;

/// Tag minted by the fixture helpers.
pub const DEFAULT_TAG: Tag = Tag::from_static(b"\x00");

/// A ledger on a manual clock with named accounts and one custody agent.
pub struct LedgerFixture {
    pub ledger: Ledger,
    pub clock: Arc<ManualClock>,
    pub accounts: Vec<Address>,
    pub custodian: Address,
}

impl LedgerFixture {
    /// Create a fixture with three accounts and the default configuration.
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default(), 3)
    }

    /// Create a fixture with `accounts` named accounts.
    pub fn with_config(config: LedgerConfig, accounts: usize) -> Self {
        let clock = Arc::new(ManualClock::new(GENESIS));
        let mut ledger = Ledger::with_clock(config, clock.clone());
        let custodian = custodian_address();
        // A fresh registry cannot already contain the agent.
        let _ = ledger.register_custodian(custodian);

        Self {
            ledger,
            clock,
            accounts: named_accounts(accounts),
            custodian,
        }
    }

    /// The `i`th named account.
    pub fn account(&self, i: usize) -> Address {
        self.accounts[i % self.accounts.len()]
    }

    /// Mint `amount` unlocked units with [`DEFAULT_TAG`] to every account,
    /// in order. Starts from identifier 1 on a fresh fixture.
    pub fn mint_each(&mut self, amount: u64) -> &mut Self {
        for account in self.accounts.clone() {
            // Callers size the authorized supply for what they mint.
            let _ = self.ledger.mint(account, amount, 0, DEFAULT_TAG);
        }
        self
    }

    /// Attach a [`RestrictionList`] and return a handle to drive it.
    pub fn restrict(&mut self) -> Arc<RestrictionList> {
        let list = Arc::new(RestrictionList::new());
        // Only one fixture module is ever attached under this name.
        let _ = self.ledger.attach_module(
            "restrictions",
            ModuleHooks::new().with_transfer_check(list.clone()),
        );
        list
    }

    /// Current clock reading.
    pub fn now(&self) -> u64 {
        self.ledger.now()
    }

    /// Move the clock forward.
    pub fn advance(&self, secs: u64) -> u64 {
        self.clock.advance(secs)
    }

    /// Every address that can hold a balance: the accounts and the agent.
    pub fn holders(&self) -> Vec<Address> {
        let mut all = self.accounts.clone();
        all.push(self.custodian);
        all
    }
}

impl Default for LedgerFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic account addresses `account-0`, `account-1`, ...
pub fn named_accounts(count: usize) -> Vec<Address> {
    (0..count)
        .map(|i| Address::derive(&format!("account-{i}")))
        .collect()
}

/// The custody agent every fixture registers.
pub fn custodian_address() -> Address {
    Address::derive("custodian")
}

/// Open a [`LedgerService`] on a fresh [`MemoryStore`] with a manual clock.
pub async fn memory_service(
    config: LedgerConfig,
) -> rangebook::Result<(LedgerService<MemoryStore>, Arc<ManualClock>)> {
    let clock = Arc::new(ManualClock::new(GENESIS));
    let service = LedgerService::open_with_clock(MemoryStore::new(), config, clock.clone()).await?;
    Ok((service, clock))
}

#[cfg(test)]
mod tests {
    use rangebook::{LedgerError, Span};

    use super::*;

    #[test]
    fn test_fixture_accounts_are_distinct() {
        let fixture = LedgerFixture::new();
        assert_eq!(fixture.accounts.len(), 3);
        assert_ne!(fixture.account(0), fixture.account(1));
        assert_ne!(fixture.account(1), fixture.account(2));
        assert!(!fixture.accounts.contains(&fixture.custodian));
        assert!(fixture.ledger.is_custodian(&fixture.custodian));
    }

    #[test]
    fn test_mint_each_lays_out_consecutive_ranges() {
        let mut fixture = LedgerFixture::new();
        fixture.mint_each(10_000);

        assert_eq!(fixture.ledger.total_supply(), 30_000);
        assert_eq!(
            fixture.ledger.ranges_of(&fixture.account(1)),
            vec![Span::new(10_001, 20_001)]
        );
    }

    #[test]
    fn test_restrictions_attach() {
        let mut fixture = LedgerFixture::new();
        fixture.mint_each(100);
        let list = fixture.restrict();

        list.set_frozen(true);
        let (a, b) = (fixture.account(0), fixture.account(1));
        assert!(matches!(
            fixture.ledger.transfer(a, b, 1),
            Err(LedgerError::Denied(_))
        ));

        list.set_frozen(false);
        fixture.ledger.transfer(a, b, 1).unwrap();
    }

    #[tokio::test]
    async fn test_memory_service() {
        let (service, clock) = memory_service(LedgerConfig::default()).await.unwrap();
        let alice = Address::derive("alice");
        service
            .mint(alice, 100, GENESIS + 10, DEFAULT_TAG)
            .await
            .unwrap();

        let bob = Address::derive("bob");
        assert!(service.transfer(alice, bob, 1).await.is_err());
        clock.advance(10);
        service.transfer(alice, bob, 1).await.unwrap();
        assert_eq!(service.balance_of(&bob).await, 1);
    }
}
