//! LedgerService: a shared, persistent ledger.
//!
//! The service owns a [`Ledger`] behind an async mutex and a [`Store`]. Each
//! mutating call runs the ledger operation, drains the records it touched
//! and commits them with the new metadata before the lock is released, so
//! operations are serialized and the store never sees a partial one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rangebook_core::{Address, Range, RangeView, Snapshot, Span, StateDigest, Tag};
use rangebook_perms::ModuleHooks;
use rangebook_store::{Store, StoreExt};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;

/// A ledger shared across tasks and persisted through a [`Store`].
pub struct LedgerService<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: LedgerConfig,
    /// The in-memory ledger; holding the lock serializes operations.
    ledger: Mutex<Ledger>,
    /// Set when a failed commit could not be rolled back by a reload.
    poisoned: AtomicBool,
}

impl<S: Store> LedgerService<S> {
    /// Open a ledger on `store` using the system clock.
    ///
    /// An empty store is initialised with the configured authorized supply.
    pub async fn open(store: S, config: LedgerConfig) -> Result<Self> {
        Self::open_with_clock(store, config, Arc::new(SystemClock)).await
    }

    /// Open a ledger on `store` with an explicit clock.
    pub async fn open_with_clock(
        store: S,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mut ledger = match store.load_snapshot(config.verify_on_load).await? {
            Some(snapshot) => Ledger::from_snapshot(snapshot, &config, clock)?,
            None => {
                let ledger = Ledger::with_clock(config.clone(), clock);
                store.commit(&[], &ledger.meta()).await?;
                debug!("initialised empty store");
                ledger
            }
        };

        for agent in store.load_custodians().await? {
            ledger.register_custodian(agent)?;
        }

        info!(
            cursor = ledger.cursor(),
            ranges = ledger.index().len(),
            total_supply = ledger.total_supply(),
            custodians = ledger.custodians().len(),
            "ledger opened"
        );

        Ok(Self {
            store: Arc::new(store),
            config,
            ledger: Mutex::new(ledger),
            poisoned: AtomicBool::new(false),
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Whether a failed commit left the ledger out of step with the store.
    ///
    /// A poisoned service refuses every further mutation and checkpoint;
    /// reopen it from the store to continue.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.is_poisoned() {
            return Err(LedgerError::Poisoned);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Supply
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn mint(&self, owner: Address, amount: u64, lock_time: u64, tag: Tag) -> Result<Span> {
        self.apply(move |ledger| ledger.mint(owner, amount, lock_time, tag))
            .await
    }

    pub async fn burn(&self, start: u64, stop: u64) -> Result<Range> {
        self.apply(move |ledger| ledger.burn(start, stop)).await
    }

    pub async fn modify_authorized_supply(&self, authorized_supply: u64) -> Result<()> {
        self.apply(move |ledger| ledger.modify_authorized_supply(authorized_supply))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transfers
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn transfer(&self, from: Address, to: Address, amount: u64) -> Result<Vec<Span>> {
        self.apply(move |ledger| ledger.transfer(from, to, amount))
            .await
    }

    pub async fn transfer_internal(
        &self,
        custodian: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<Vec<Span>> {
        self.apply(move |ledger| ledger.transfer_internal(custodian, from, to, amount))
            .await
    }

    pub async fn transfer_range(
        &self,
        from: Address,
        to: Address,
        start: u64,
        stop: u64,
    ) -> Result<()> {
        self.apply(move |ledger| ledger.transfer_range(from, to, start, stop))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attributes
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn modify_range(&self, id: u64, lock_time: u64, tag: Tag) -> Result<usize> {
        self.apply(move |ledger| ledger.modify_range(id, lock_time, tag))
            .await
    }

    pub async fn modify_ranges(
        &self,
        start: u64,
        stop: u64,
        lock_time: u64,
        tag: Tag,
    ) -> Result<usize> {
        self.apply(move |ledger| ledger.modify_ranges(start, stop, lock_time, tag))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Custody Agents and Modules
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a custody agent and persist the registration.
    pub async fn register_custodian(&self, agent: Address) -> Result<()> {
        let mut ledger = self.ledger.lock().await;
        self.ensure_usable()?;
        ledger.register_custodian(agent)?;
        if let Err(err) = self.store.set_custodian(&agent, true).await {
            if let Err(rollback) = ledger.remove_custodian(&agent) {
                warn!(agent = %agent, error = %rollback, "custodian rollback failed");
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Remove a custody agent and persist the removal.
    pub async fn remove_custodian(&self, agent: Address) -> Result<()> {
        let mut ledger = self.ledger.lock().await;
        self.ensure_usable()?;
        ledger.remove_custodian(&agent)?;
        if let Err(err) = self.store.set_custodian(&agent, false).await {
            if let Err(rollback) = ledger.register_custodian(agent) {
                warn!(agent = %agent, error = %rollback, "custodian rollback failed");
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Attach a compliance module. Modules are not persisted.
    pub async fn attach_module(&self, name: impl Into<String>, hooks: ModuleHooks) -> Result<()> {
        self.ledger.lock().await.attach_module(name, hooks)
    }

    pub async fn detach_module(&self, name: &str) -> Result<()> {
        self.ledger.lock().await.detach_module(name)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Run a read-only closure against the ledger.
    pub async fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> T {
        let ledger = self.ledger.lock().await;
        f(&*ledger)
    }

    pub async fn balance_of(&self, account: &Address) -> u64 {
        self.read(|ledger| ledger.balance_of(account)).await
    }

    pub async fn custodian_balance_of(&self, owner: &Address, custodian: &Address) -> u64 {
        self.read(|ledger| ledger.custodian_balance_of(owner, custodian))
            .await
    }

    pub async fn ranges_of(&self, account: &Address) -> Vec<Span> {
        self.read(|ledger| ledger.ranges_of(account)).await
    }

    pub async fn total_supply(&self) -> u64 {
        self.read(Ledger::total_supply).await
    }

    pub async fn get_range(&self, id: u64) -> Option<RangeView> {
        self.read(|ledger| ledger.get_range(id)).await
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.read(Ledger::snapshot).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Record the digest of the current state in the store.
    ///
    /// Subsequent loads verify the stored records against it until the next
    /// mutation supersedes it.
    pub async fn checkpoint(&self) -> Result<StateDigest> {
        let ledger = self.ledger.lock().await;
        self.ensure_usable()?;
        let snapshot = ledger.snapshot();
        let digest = self.store.checkpoint(&snapshot).await?;
        info!(digest = %digest, cursor = snapshot.cursor, "checkpoint");
        Ok(digest)
    }

    /// Run a mutating operation and commit what it changed.
    ///
    /// A rejected operation changes nothing and commits nothing. If the
    /// commit itself fails the in-memory state is reloaded from the store and
    /// the commit error is returned. If the reload fails too, the service is
    /// poisoned.
    async fn apply<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Ledger) -> Result<T> + Send,
        T: Send,
    {
        let mut ledger = self.ledger.lock().await;
        self.ensure_usable()?;
        let out = op(&mut *ledger)?;

        let changes = ledger.take_changes();
        let meta = ledger.meta();
        if let Err(err) = self.store.commit(&changes, &meta).await {
            warn!(error = %err, "commit failed, reloading ledger state");
            if let Err(reload) = self.reload(&mut *ledger).await {
                error!(commit = %err, error = %reload, "reload failed, service poisoned");
                self.poisoned.store(true, Ordering::Release);
            }
            return Err(err.into());
        }
        debug!(changes = changes.len(), cursor = meta.cursor, "operation committed");
        Ok(out)
    }

    async fn reload(&self, ledger: &mut Ledger) -> Result<()> {
        let snapshot = self
            .store
            .load_snapshot(self.config.verify_on_load)
            .await?
            .unwrap_or_else(|| Snapshot::empty(self.config.authorized_supply));
        ledger.restore(snapshot)
    }
}
