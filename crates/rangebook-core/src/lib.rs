//! # Rangebook Core
//!
//! Pure primitives for Rangebook: identifier ranges, the range index, and
//! canonical snapshot encoding.
//!
//! This crate contains no I/O, no storage, no clocks. It is pure computation
//! over range records.
//!
//! ## Key Types
//!
//! - [`Range`] - A maximal block of identifiers sharing every attribute
//! - [`RangeIndex`] - Sparse start-ordered map of live ranges with holder indexes
//! - [`Address`] - 20-byte account address
//! - [`Tag`] - Opaque compliance attribute
//! - [`Snapshot`] - Durable state: cursor, issuance cap, and range records
//!
//! ## Canonicalization
//!
//! Snapshots are encoded using deterministic CBOR and hashed with Blake3.
//! See the [`canonical`] module.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod index;
pub mod range;
pub mod snapshot;
pub mod types;
pub mod validation;

pub use canonical::{decode_range, encode_range, SNAPSHOT_VERSION};
pub use digest::StateDigest;
pub use error::{CoreError, ValidationError};
pub use index::{RangeChange, RangeIndex, Slot};
pub use range::{Holder, Range, RangeView, Span};
pub use snapshot::Snapshot;
pub use types::{Address, Tag, FIRST_ID, ID_CEILING};
pub use validation::{validate_index, validate_records, validate_supply};
