//! Error types for the ledger.

use std::fmt;

use rangebook_core::{Span, ValidationError};
use rangebook_perms::PermsError;
use rangebook_store::StoreError;
use thiserror::Error;

/// Which bound a mint would cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyLimit {
    /// The issuer-set authorized supply.
    Authorized,
    /// The fixed identifier ceiling.
    IdentifierCeiling,
}

impl fmt::Display for SupplyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplyLimit::Authorized => f.write_str("authorized supply"),
            SupplyLimit::IdentifierCeiling => f.write_str("identifier ceiling"),
        }
    }
}

/// Errors that can occur during ledger operations.
///
/// Every rejected operation leaves the ledger exactly as it was.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Amount or span width is zero.
    #[error("zero amount")]
    ZeroAmount,

    /// Amount is wider than any identifier span can be.
    #[error("amount {0} exceeds the identifier width")]
    AmountTooLarge(u64),

    /// Sender and receiver are the same address.
    #[error("sender and receiver are the same")]
    SelfTransfer,

    /// The zero address cannot hold units.
    #[error("zero address cannot hold units")]
    ZeroAddress,

    /// The span does not lie inside a single live range.
    #[error("span {0} does not lie inside a single range")]
    RangeNotUniform(Span),

    /// The span starts at a burned identifier.
    #[error("span {0} is already burned")]
    AlreadyBurned(Span),

    /// Minting would cross a supply bound.
    #[error("{limit} exceeded: requested {requested}, available {available}")]
    SupplyExceeded {
        limit: SupplyLimit,
        requested: u64,
        available: u64,
    },

    /// The source holds fewer eligible units than requested.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    /// The move breaks a custody rule.
    #[error("custodian violation: {0}")]
    CustodianViolation(&'static str),

    /// A non-zero lock time that is not in the future.
    #[error("lock time {lock_time} is not after now ({now})")]
    LockNotInFuture { lock_time: u64, now: u64 },

    /// The new authorized supply is below the outstanding total.
    #[error("authorized supply {cap} is below total supply {outstanding}")]
    CapBelowOutstanding { cap: u64, outstanding: u64 },

    /// The range is time-locked.
    #[error("span {span} is locked until {until}")]
    RangeLocked { span: Span, until: u64 },

    /// Identifier or span outside `[1, cursor)`.
    #[error("{0} is outside the issued identifiers")]
    OutOfRange(Span),

    /// A compliance module vetoed the operation, or module bookkeeping failed.
    #[error("compliance: {0}")]
    Denied(#[from] PermsError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A failed commit could not be undone by reloading from the store, so
    /// the in-memory ledger may be ahead of what is persisted.
    #[error("ledger diverged from its store; reopen required")]
    Poisoned,

    /// Loaded state is structurally invalid.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
