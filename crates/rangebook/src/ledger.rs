//! The Ledger: range-indexed issuance, movement and reporting.
//!
//! A `Ledger` owns the [`RangeIndex`] together with the supply figures, the
//! attached compliance modules and the custody-agent registry. Operations
//! are grouped by concern in sibling modules (`supply`, `transfer`,
//! `editor`, `view`); this module holds construction and the plumbing they
//! share.
//!
//! Every operation validates all of its preconditions and consults the
//! modules before it touches the index, so a rejected call leaves the ledger
//! exactly as it found it.

use std::fmt;
use std::sync::Arc;

use rangebook_core::{
    Address, Holder, Range, RangeChange, RangeIndex, Snapshot, Span, StateDigest, FIRST_ID,
    ID_CEILING,
};
use rangebook_perms::{CustodianSet, ModuleHooks, ModuleSet};
use rangebook_store::LedgerMeta;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::selection::SelectionPolicy;

/// The in-memory ledger.
///
/// Single-threaded by construction: every mutating operation takes
/// `&mut self`. Wrap it in a [`LedgerService`](crate::LedgerService) to share
/// it and persist its changes.
pub struct Ledger {
    /// Live ranges and the identifier cursor.
    pub(crate) index: RangeIndex,
    /// Cached sum of live range widths.
    pub(crate) total_supply: u64,
    /// Issuance cap.
    pub(crate) authorized_supply: u64,
    /// Attached compliance modules.
    pub(crate) modules: ModuleSet,
    /// Registered custody agents.
    pub(crate) custodians: CustodianSet,
    /// Source of "now" for lock checks.
    pub(crate) clock: Arc<dyn Clock>,
    /// Range selection for amount-based transfers.
    pub(crate) selection: Box<dyn SelectionPolicy>,
}

impl Ledger {
    /// Create an empty ledger using the system clock.
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an empty ledger with an explicit clock.
    pub fn with_clock(config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            index: RangeIndex::new(),
            total_supply: 0,
            authorized_supply: config.authorized_supply,
            modules: ModuleSet::new(),
            custodians: CustodianSet::new(),
            clock,
            selection: config.selection.policy(),
        }
    }

    /// Rebuild a ledger from persisted state.
    ///
    /// The records are validated while the index is rebuilt; total supply is
    /// re-derived from them.
    pub fn from_snapshot(
        snapshot: Snapshot,
        config: &LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mut ledger = Self::with_clock(config.clone(), clock);
        ledger.restore(snapshot)?;
        Ok(ledger)
    }

    /// Replace the range state, keeping modules, custodians and policies.
    pub(crate) fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        let authorized_supply = snapshot.authorized_supply;
        let index = snapshot.into_index()?;
        self.total_supply = index.live_width();
        self.authorized_supply = authorized_supply;
        self.index = index;
        debug!(
            ranges = self.index.len(),
            cursor = self.index.cursor(),
            total_supply = self.total_supply,
            "ledger state restored"
        );
        Ok(())
    }

    /// Replace the selection policy for amount-based transfers.
    pub fn set_selection_policy(&mut self, policy: Box<dyn SelectionPolicy>) {
        self.selection = policy;
    }

    /// Current time according to the ledger's clock.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Read access to the underlying index.
    pub fn index(&self) -> &RangeIndex {
        &self.index
    }

    /// Next identifier to be minted.
    pub fn cursor(&self) -> u64 {
        self.index.cursor()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Compliance Modules
    // ─────────────────────────────────────────────────────────────────────────

    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    /// Attach a module under `name`. Names must be unique.
    pub fn attach_module(&mut self, name: impl Into<String>, hooks: ModuleHooks) -> Result<()> {
        let name = name.into();
        self.modules.attach(name.clone(), hooks)?;
        info!(module = %name, "module attached");
        Ok(())
    }

    pub fn detach_module(&mut self, name: &str) -> Result<()> {
        self.modules.detach(name)?;
        info!(module = %name, "module detached");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Custody Agents
    // ─────────────────────────────────────────────────────────────────────────

    pub fn custodians(&self) -> &CustodianSet {
        &self.custodians
    }

    pub fn is_custodian(&self, address: &Address) -> bool {
        self.custodians.is_custodian(address)
    }

    /// Register a custody agent.
    pub fn register_custodian(&mut self, agent: Address) -> Result<()> {
        if agent == Address::ZERO {
            return Err(LedgerError::ZeroAddress);
        }
        self.custodians.register(agent)?;
        info!(agent = %agent, "custodian registered");
        Ok(())
    }

    /// Remove a custody agent.
    ///
    /// Refused while the agent still holds custodied ranges: those units would
    /// otherwise be stranded from amount-based exits.
    pub fn remove_custodian(&mut self, agent: &Address) -> Result<()> {
        if self.is_custodian(agent) && self.index.custodian_ranges(agent).next().is_some() {
            return Err(LedgerError::CustodianViolation(
                "agent still holds custodied ranges",
            ));
        }
        self.custodians.remove(agent)?;
        info!(agent = %agent, "custodian removed");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State Export
    // ─────────────────────────────────────────────────────────────────────────

    /// Capture the full state as an ordered record set.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.index, self.authorized_supply)
    }

    /// Digest of the canonical encoding of the full state.
    pub fn digest(&self) -> StateDigest {
        self.snapshot().digest()
    }

    /// Metadata to persist alongside the drained changes.
    pub fn meta(&self) -> LedgerMeta {
        LedgerMeta {
            cursor: self.index.cursor(),
            authorized_supply: self.authorized_supply,
            total_supply: self.total_supply,
            digest: None,
        }
    }

    /// Drain the record changes made since the last call.
    pub fn take_changes(&mut self) -> Vec<RangeChange> {
        self.index.take_changes()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shared Plumbing
    // ─────────────────────────────────────────────────────────────────────────

    /// Sum of widths filed under `holder`.
    pub(crate) fn holder_width(&self, holder: &Holder) -> u64 {
        self.index.holder_ranges(holder).map(Range::width).sum()
    }

    /// Reject a non-zero lock time that is not strictly in the future.
    pub(crate) fn check_lock_time(&self, lock_time: u64) -> Result<()> {
        let now = self.now();
        if lock_time != 0 && lock_time <= now {
            return Err(LedgerError::LockNotInFuture { lock_time, now });
        }
        Ok(())
    }

    /// Reject spans that are empty or reach outside `[FIRST_ID, cursor)`.
    pub(crate) fn check_issued(&self, span: Span) -> Result<()> {
        if span.is_empty() {
            return Err(LedgerError::ZeroAmount);
        }
        if span.start < FIRST_ID || span.stop > self.index.cursor() {
            return Err(LedgerError::OutOfRange(span));
        }
        Ok(())
    }
}

/// Reject zero amounts and amounts no span could ever hold.
pub(crate) fn check_amount(amount: u64) -> Result<()> {
    if amount == 0 {
        return Err(LedgerError::ZeroAmount);
    }
    if amount > ID_CEILING {
        return Err(LedgerError::AmountTooLarge(amount));
    }
    Ok(())
}

/// Log a rejected operation and pass the result through.
pub(crate) fn logged<T>(op: &'static str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        debug!(op, error = %err, "operation rejected");
    }
    result
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("cursor", &self.index.cursor())
            .field("ranges", &self.index.len())
            .field("total_supply", &self.total_supply)
            .field("authorized_supply", &self.authorized_supply)
            .field("modules", &self.modules)
            .field("custodians", &self.custodians.len())
            .field("selection", &self.selection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use rangebook_core::Tag;

    fn ledger() -> Ledger {
        Ledger::with_clock(LedgerConfig::default(), Arc::new(ManualClock::new(1_000)))
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = ledger();
        assert_eq!(ledger.cursor(), FIRST_ID);
        assert_eq!(ledger.total_supply(), 0);
        assert_eq!(ledger.authorized_supply(), ID_CEILING - 1);
        assert!(ledger.index().is_empty());
    }

    #[test]
    fn test_register_custodian_rejects_zero_and_duplicates() {
        let mut ledger = ledger();
        let vault = Address::derive("vault");
        assert!(matches!(
            ledger.register_custodian(Address::ZERO),
            Err(LedgerError::ZeroAddress)
        ));
        ledger.register_custodian(vault).unwrap();
        assert!(ledger.is_custodian(&vault));
        assert!(matches!(
            ledger.register_custodian(vault),
            Err(LedgerError::Denied(_))
        ));
        ledger.remove_custodian(&vault).unwrap();
        assert!(!ledger.is_custodian(&vault));
    }

    #[test]
    fn test_remove_custodian_with_custodied_ranges() {
        let mut ledger = ledger();
        let alice = Address::derive("alice");
        let vault = Address::derive("vault");
        ledger.register_custodian(vault).unwrap();
        ledger.mint(alice, 100, 0, Tag::empty()).unwrap();
        ledger.transfer(alice, vault, 40).unwrap();

        assert!(matches!(
            ledger.remove_custodian(&vault),
            Err(LedgerError::CustodianViolation(_))
        ));
        assert!(ledger.is_custodian(&vault));
        assert_eq!(ledger.balance_of(&vault), 40);

        ledger.transfer(vault, alice, 40).unwrap();
        ledger.remove_custodian(&vault).unwrap();
        assert!(!ledger.is_custodian(&vault));
        assert_eq!(ledger.balance_of(&alice), 100);
    }

    #[test]
    fn test_snapshot_restores_equal_state() {
        let mut ledger = ledger();
        let alice = Address::derive("alice");
        ledger.mint(alice, 100, 0, Tag::empty()).unwrap();
        ledger.mint(alice, 50, 0, Tag::from_static(b"b")).unwrap();
        ledger.burn(10, 20).unwrap();

        let snapshot = ledger.snapshot();
        let restored = Ledger::from_snapshot(
            snapshot.clone(),
            &LedgerConfig::default(),
            Arc::new(ManualClock::new(1_000)),
        )
        .unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.total_supply(), 140);
        assert_eq!(restored.digest(), ledger.digest());
    }

    #[test]
    fn test_lock_time_must_be_future() {
        let ledger = ledger();
        assert!(ledger.check_lock_time(0).is_ok());
        assert!(ledger.check_lock_time(1_001).is_ok());
        assert!(matches!(
            ledger.check_lock_time(1_000),
            Err(LedgerError::LockNotInFuture { .. })
        ));
    }

    #[test]
    fn test_amount_bounds() {
        assert!(matches!(check_amount(0), Err(LedgerError::ZeroAmount)));
        assert!(check_amount(ID_CEILING).is_ok());
        assert!(matches!(
            check_amount(ID_CEILING + 1),
            Err(LedgerError::AmountTooLarge(_))
        ));
    }
}
