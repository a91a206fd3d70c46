//! Store trait: the abstract interface for range persistence.
//!
//! The durable state of a ledger is the start-keyed set of range records
//! plus one metadata row. Every ledger operation hands the store the
//! changes it made; the store applies them in one transaction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rangebook_core::{
    validate_records, Address, Range, RangeChange, Snapshot, StateDigest, ValidationError,
};

use crate::error::Result;

/// Supply metadata stored next to the range records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMeta {
    /// Next identifier to issue.
    pub cursor: u64,

    /// Issuance cap.
    pub authorized_supply: u64,

    /// Cached sum of live range widths. Re-derived and checked on load.
    pub total_supply: u64,

    /// Digest of the full state, present only when written by a checkpoint
    /// and not yet superseded by a later commit.
    pub digest: Option<StateDigest>,
}

/// The Store trait: async interface for range persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Keyed by start**: a `Put` overwrites the record with the same start.
/// - **Atomic commits**: `commit` applies every change and the metadata
///   together or not at all.
/// - **Bounded writes**: a commit touches only the records in `changes`.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Range Records
    // ─────────────────────────────────────────────────────────────────────────

    /// All range records, ordered by start.
    async fn load_ranges(&self) -> Result<Vec<Range>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Metadata
    // ─────────────────────────────────────────────────────────────────────────

    /// The metadata row, or `None` for a store that was never committed to.
    async fn load_meta(&self) -> Result<Option<LedgerMeta>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Custody Agents
    // ─────────────────────────────────────────────────────────────────────────

    /// Registered custody agents, in address order.
    async fn load_custodians(&self) -> Result<Vec<Address>>;

    /// Register (`true`) or remove (`false`) a custody agent.
    async fn set_custodian(&self, agent: &Address, registered: bool) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Commits
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply changes and replace the metadata in one transaction.
    async fn commit(&self, changes: &[RangeChange], meta: &LedgerMeta) -> Result<()>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Load the stored state as a snapshot.
    ///
    /// With `verify`, the cached total supply and the recorded digest (if
    /// any) are checked against the records, and the records themselves are
    /// validated. Returns `None` for an empty store.
    fn load_snapshot(
        &self,
        verify: bool,
    ) -> impl std::future::Future<Output = Result<Option<Snapshot>>> + Send;

    /// Record the digest of `snapshot` as a checkpoint.
    fn checkpoint(
        &self,
        snapshot: &Snapshot,
    ) -> impl std::future::Future<Output = Result<StateDigest>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn load_snapshot(&self, verify: bool) -> Result<Option<Snapshot>> {
        let Some(meta) = self.load_meta().await? else {
            return Ok(None);
        };
        let ranges = self.load_ranges().await?;
        let snapshot = Snapshot {
            cursor: meta.cursor,
            authorized_supply: meta.authorized_supply,
            ranges,
        };

        if verify {
            verify_snapshot(&snapshot, &meta)?;
        }

        debug!(
            ranges = snapshot.ranges.len(),
            cursor = snapshot.cursor,
            "loaded ledger state"
        );
        Ok(Some(snapshot))
    }

    async fn checkpoint(&self, snapshot: &Snapshot) -> Result<StateDigest> {
        let digest = snapshot.digest();
        let meta = LedgerMeta {
            cursor: snapshot.cursor,
            authorized_supply: snapshot.authorized_supply,
            total_supply: snapshot.total_supply(),
            digest: Some(digest),
        };
        self.commit(&[], &meta).await?;
        debug!(digest = %digest, "checkpoint recorded");
        Ok(digest)
    }
}

/// Check a loaded snapshot against its metadata.
pub fn verify_snapshot(snapshot: &Snapshot, meta: &LedgerMeta) -> Result<()> {
    validate_records(snapshot.cursor, &snapshot.ranges)?;

    let actual = snapshot.total_supply();
    if actual != meta.total_supply {
        warn!(
            recorded = meta.total_supply,
            actual, "stored total supply disagrees with records"
        );
        return Err(ValidationError::SupplyMismatch {
            recorded: meta.total_supply,
            actual,
        }
        .into());
    }

    if let Some(expected) = meta.digest {
        let actual = snapshot.digest();
        if actual != expected {
            warn!(%expected, %actual, "stored state digest mismatch");
            return Err(ValidationError::DigestMismatch {
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            }
            .into());
        }
    }

    Ok(())
}
