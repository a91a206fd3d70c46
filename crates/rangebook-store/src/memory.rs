//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use rangebook_core::{Address, Range, RangeChange};

use crate::error::Result;
use crate::traits::{LedgerMeta, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    /// Range records keyed by start.
    ranges: BTreeMap<u64, Range>,

    /// Metadata row.
    meta: Option<LedgerMeta>,

    /// Registered custody agents.
    custodians: BTreeSet<Address>,

    /// Number of commits applied, for tests.
    commits: u64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commits applied so far.
    pub fn commit_count(&self) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .commits
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_ranges(&self) -> Result<Vec<Range>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.ranges.values().cloned().collect())
    }

    async fn load_meta(&self) -> Result<Option<LedgerMeta>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.meta)
    }

    async fn load_custodians(&self) -> Result<Vec<Address>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.custodians.iter().copied().collect())
    }

    async fn set_custodian(&self, agent: &Address, registered: bool) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if registered {
            inner.custodians.insert(*agent);
        } else {
            inner.custodians.remove(agent);
        }
        Ok(())
    }

    async fn commit(&self, changes: &[RangeChange], meta: &LedgerMeta) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for change in changes {
            match change {
                RangeChange::Put(range) => {
                    inner.ranges.insert(range.start, range.clone());
                }
                RangeChange::Delete(start) => {
                    inner.ranges.remove(start);
                }
            }
        }
        inner.meta = Some(*meta);
        inner.commits += 1;
        debug!(changes = changes.len(), cursor = meta.cursor, "committed");
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;
    use rangebook_core::{Address, StateDigest, Tag};

    fn owner() -> Address {
        Address::from_bytes([0x42; 20])
    }

    fn meta(cursor: u64, total: u64) -> LedgerMeta {
        LedgerMeta {
            cursor,
            authorized_supply: 1_000_000,
            total_supply: total,
            digest: None,
        }
    }

    #[tokio::test]
    async fn test_empty_store_has_no_snapshot() {
        let store = MemoryStore::new();
        assert!(store.load_meta().await.unwrap().is_none());
        assert!(store.load_snapshot(true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_puts_and_deletes() {
        let store = MemoryStore::new();
        let a = Range::new(1, 101, owner(), Tag::empty());
        let b = Range::new(101, 201, owner(), Tag::from_static(b"\x01"));
        store
            .commit(
                &[RangeChange::Put(a.clone()), RangeChange::Put(b)],
                &meta(201, 200),
            )
            .await
            .unwrap();
        assert_eq!(store.load_ranges().await.unwrap().len(), 2);

        store
            .commit(&[RangeChange::Delete(101)], &meta(201, 100))
            .await
            .unwrap();
        assert_eq!(store.load_ranges().await.unwrap(), vec![a]);
        assert_eq!(store.commit_count(), 2);
    }

    #[tokio::test]
    async fn test_custodian_registry_persisted() {
        let store = MemoryStore::new();
        let vault = Address::from_bytes([0xc0; 20]);
        store.set_custodian(&vault, true).await.unwrap();
        store.set_custodian(&vault, true).await.unwrap();
        assert_eq!(store.load_custodians().await.unwrap(), vec![vault]);
        store.set_custodian(&vault, false).await.unwrap();
        assert!(store.load_custodians().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_rejects_supply_drift() {
        let store = MemoryStore::new();
        let range = Range::new(1, 101, owner(), Tag::empty());
        store
            .commit(&[RangeChange::Put(range)], &meta(101, 99))
            .await
            .unwrap();
        assert!(store.load_snapshot(true).await.is_err());
        // Unverified loads still return the records.
        assert!(store.load_snapshot(false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_checkpoint_digest_verified() {
        let store = MemoryStore::new();
        let range = Range::new(1, 101, owner(), Tag::empty());
        store
            .commit(&[RangeChange::Put(range.clone())], &meta(101, 100))
            .await
            .unwrap();

        let snapshot = store.load_snapshot(true).await.unwrap().unwrap();
        let digest = store.checkpoint(&snapshot).await.unwrap();
        assert_eq!(store.load_meta().await.unwrap().unwrap().digest, Some(digest));
        assert!(store.load_snapshot(true).await.is_ok());

        // A digest that no longer matches the records is rejected.
        let mut tampered = store.load_meta().await.unwrap().unwrap();
        tampered.digest = Some(StateDigest::from_bytes([7; 32]));
        store.commit(&[], &tampered).await.unwrap();
        assert!(store.load_snapshot(true).await.is_err());
    }
}
