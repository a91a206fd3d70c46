//! # Rangebook Store
//!
//! Storage abstraction for Rangebook. Provides a trait-based interface for
//! range persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`Store`] trait, allowing
//! the ledger to be storage-agnostic. The primary implementation is
//! [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`StoreExt`] - Snapshot loading with verification, checkpoints
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`LedgerMeta`] - Cursor, supply figures and checkpoint digest
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rangebook_store::{SqliteStore, Store, StoreExt};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     // Load and verify whatever was persisted
//!     let snapshot = store.load_snapshot(true).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Records keyed by start**: each live range is one row
//! - **Journal commits**: a ledger operation persists only the records it touched
//! - **Checkpoints**: the full-state digest is recorded on demand and verified on load

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{verify_snapshot, LedgerMeta, Store, StoreExt};
