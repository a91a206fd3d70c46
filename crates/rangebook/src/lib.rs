//! # Rangebook
//!
//! A ledger for serially numbered units, stored as ranges instead of
//! per-unit records.
//!
//! ## Overview
//!
//! Every unit ever issued has a permanent identifier in `[1, 2^48 - 1)`.
//! Ownership is tracked as contiguous [`Range`]s of identifiers that share
//! every attribute (owner, custodian, lock time, tag), so a holding of a
//! million units costs one record until something forces it apart:
//!
//! - **Supply**: mint appends at a monotonic cursor under an authorized cap;
//!   burn removes a span and leaves a gap that is never re-issued
//! - **Transfers**: by amount (the selection policy picks the spans) or by
//!   exact span, with custody entry, exit and internal reassignment
//! - **Attributes**: lock times and tags are edited per span
//! - **Compliance**: pluggable modules approve transfers and cap changes and
//!   observe supply changes
//!
//! ## Key Concepts
//!
//! - **Split and merge**: an operation splits ranges at its boundaries and
//!   merges matching neighbours afterwards, so the index stays maximal
//! - **Custody**: a registered agent holds ranges for their beneficial
//!   owner; the owner stays on the record
//! - **All or nothing**: a rejected operation has no effect at all
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rangebook::{LedgerConfig, LedgerService};
//! use rangebook::core::{Address, Tag};
//! use rangebook::store::SqliteStore;
//!
//! async fn example() {
//!     // Open storage and the ledger on top of it
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!     let ledger = LedgerService::open(store, LedgerConfig::default())
//!         .await
//!         .unwrap();
//!
//!     let issuer = Address::derive("issuer");
//!     let alice = Address::derive("alice");
//!
//!     // Issue 10,000 units and move some of them
//!     ledger.mint(issuer, 10_000, 0, Tag::empty()).await.unwrap();
//!     ledger.transfer(issuer, alice, 2_500).await.unwrap();
//!
//!     assert_eq!(ledger.balance_of(&alice).await, 2_500);
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `rangebook::core` - Ranges, the range index, snapshots and digests
//! - `rangebook::store` - Storage abstraction and SQLite
//! - `rangebook::perms` - Compliance hooks, modules and custody agents

pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod selection;
pub mod service;

mod editor;
mod supply;
mod transfer;
mod view;

// Re-export component crates
pub use rangebook_core as core;
pub use rangebook_perms as perms;
pub use rangebook_store as store;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LedgerConfig, SelectionOrder};
pub use error::{LedgerError, Result, SupplyLimit};
pub use ledger::Ledger;
pub use selection::{HighestFirst, LowestFirst, SelectionPolicy};
pub use service::LedgerService;

// Re-export commonly used core types
pub use rangebook_core::{Address, Range, RangeView, Snapshot, Span, StateDigest, Tag};
