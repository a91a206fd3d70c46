//! Collaborator contracts the ledger calls back into.
//!
//! The ledger never decides *whether* a compliant move is allowed; it asks
//! the attached modules. Each hook returns a [`Decision`] and is invoked
//! before any state changes, so a denial leaves the ledger untouched.

use rangebook_core::{Address, Span};

/// Outcome of a pre-operation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    pub fn deny(reason: impl Into<String>) -> Self {
        Decision::Deny(reason.into())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// The parties to a transfer as the modules see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParticipants {
    /// Address ranges leave from. For custodial exits and internal moves
    /// this is the custody agent or the beneficial owner being debited.
    pub from: Address,

    /// Address ranges arrive at.
    pub to: Address,

    /// Custody agent involved in the move, if any.
    pub custodian: Option<Address>,
}

impl TransferParticipants {
    pub const fn direct(from: Address, to: Address) -> Self {
        Self {
            from,
            to,
            custodian: None,
        }
    }

    pub const fn custodial(from: Address, to: Address, custodian: Address) -> Self {
        Self {
            from,
            to,
            custodian: Some(custodian),
        }
    }
}

/// Pre-transfer approval hook.
pub trait TransferCheck: Send + Sync {
    /// Approve an amount-based transfer.
    fn check_transfer(&self, participants: &TransferParticipants, amount: u64) -> Decision {
        let _ = (participants, amount);
        Decision::Allow
    }

    /// Approve a transfer of one explicit span.
    fn check_transfer_range(&self, participants: &TransferParticipants, span: Span) -> Decision {
        let _ = (participants, span);
        Decision::Allow
    }
}

/// Pre-approval for changes to the issuance cap.
pub trait SupplyCheck: Send + Sync {
    fn check_authorized_supply(&self, old: u64, new: u64) -> Decision;
}

/// Notified after every successful mint or burn.
pub trait SupplyObserver: Send + Sync {
    /// Total supply moved from `old` to `new`; `owner` is the account whose
    /// holdings were minted or burned.
    fn total_supply_changed(&self, owner: &Address, old: u64, new: u64);
}
