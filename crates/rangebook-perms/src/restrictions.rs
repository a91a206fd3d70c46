//! Issuer-controlled transfer restrictions.
//!
//! A ready-made [`TransferCheck`] covering the common issuer controls: a
//! global transfer freeze and per-account sender/receiver restrictions.
//! Exempt accounts (typically the issuer) may still send during a freeze.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use rangebook_core::{Address, Span};

use crate::hooks::{Decision, TransferCheck, TransferParticipants};

#[derive(Debug, Default)]
struct Restrictions {
    frozen: bool,
    restricted: HashSet<Address>,
    exempt: HashSet<Address>,
}

/// Global freeze plus per-account restrictions.
///
/// Settings can be changed while the module is attached.
#[derive(Debug, Default)]
pub struct RestrictionList {
    inner: RwLock<Restrictions>,
}

impl RestrictionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze or unfreeze all transfers from non-exempt accounts.
    pub fn set_frozen(&self, frozen: bool) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .frozen = frozen;
    }

    pub fn set_restricted(&self, account: Address, restricted: bool) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if restricted {
            inner.restricted.insert(account);
        } else {
            inner.restricted.remove(&account);
        }
    }

    pub fn set_exempt(&self, account: Address, exempt: bool) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if exempt {
            inner.exempt.insert(account);
        } else {
            inner.exempt.remove(&account);
        }
    }

    fn evaluate(&self, participants: &TransferParticipants) -> Decision {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        if inner.frozen && !inner.exempt.contains(&participants.from) {
            return Decision::deny("transfers frozen");
        }
        if inner.restricted.contains(&participants.from) {
            return Decision::deny("sender restricted");
        }
        if inner.restricted.contains(&participants.to) {
            return Decision::deny("receiver restricted");
        }
        if let Some(custodian) = &participants.custodian {
            if inner.restricted.contains(custodian) {
                return Decision::deny("custodian restricted");
            }
        }
        Decision::Allow
    }
}

impl TransferCheck for RestrictionList {
    fn check_transfer(&self, participants: &TransferParticipants, _amount: u64) -> Decision {
        self.evaluate(participants)
    }

    fn check_transfer_range(&self, participants: &TransferParticipants, _span: Span) -> Decision {
        self.evaluate(participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> Address {
        Address::from_bytes([0x01; 20])
    }

    fn alice() -> Address {
        Address::from_bytes([0xa1; 20])
    }

    fn bob() -> Address {
        Address::from_bytes([0xb0; 20])
    }

    #[test]
    fn test_freeze_spares_exempt_sender() {
        let list = RestrictionList::new();
        list.set_exempt(issuer(), true);
        list.set_frozen(true);

        let from_issuer = TransferParticipants::direct(issuer(), alice());
        let from_alice = TransferParticipants::direct(alice(), bob());
        assert!(list.check_transfer(&from_issuer, 10).is_allowed());
        assert_eq!(
            list.check_transfer(&from_alice, 10),
            Decision::deny("transfers frozen")
        );

        list.set_frozen(false);
        assert!(list.check_transfer(&from_alice, 10).is_allowed());
    }

    #[test]
    fn test_sender_and_receiver_restrictions() {
        let list = RestrictionList::new();
        list.set_restricted(alice(), true);

        assert_eq!(
            list.check_transfer(&TransferParticipants::direct(alice(), bob()), 1),
            Decision::deny("sender restricted")
        );
        assert_eq!(
            list.check_transfer_range(
                &TransferParticipants::direct(bob(), alice()),
                Span::new(1, 2)
            ),
            Decision::deny("receiver restricted")
        );

        list.set_restricted(alice(), false);
        assert!(list
            .check_transfer(&TransferParticipants::direct(alice(), bob()), 1)
            .is_allowed());
    }

    #[test]
    fn test_restricted_custodian() {
        let vault = Address::from_bytes([0xc0; 20]);
        let list = RestrictionList::new();
        list.set_restricted(vault, true);
        let parts = TransferParticipants::custodial(alice(), bob(), vault);
        assert_eq!(
            list.check_transfer(&parts, 1),
            Decision::deny("custodian restricted")
        );
    }
}
