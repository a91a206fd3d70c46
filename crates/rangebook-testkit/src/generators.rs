//! Proptest generators for property-based testing.
//!
//! [`Op`] covers every mutating ledger operation over a small address and
//! identifier space, so random sequences hit merges, splits, gaps, locks
//! and custody often. [`check_invariants`] states what must hold after any
//! sequence, accepted or not.

use std::collections::BTreeSet;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};

use rangebook::{Address, Ledger, LedgerError, Snapshot, Tag};
use rangebook_core::{validate_index, validate_supply, ID_CEILING};

use crate::fixtures::LedgerFixture;

/// Number of named accounts the generated operations address.
pub const ACCOUNTS: usize = 3;

/// Who an operation names as a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Party {
    Account(usize),
    Custodian,
}

impl Party {
    pub fn resolve(self, fixture: &LedgerFixture) -> Address {
        match self {
            Party::Account(i) => fixture.account(i),
            Party::Custodian => fixture.custodian,
        }
    }
}

/// One mutating ledger operation.
///
/// Lock times are offsets from the clock at the time the operation runs;
/// zero means unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Mint { to: Party, amount: u64, lock: u64, tag: u8 },
    Burn { start: u64, width: u64 },
    Transfer { from: Party, to: Party, amount: u64 },
    TransferInternal { from: usize, to: usize, amount: u64 },
    TransferRange { from: Party, to: Party, start: u64, width: u64 },
    ModifyRange { id: u64, lock: u64, tag: u8 },
    ModifyRanges { start: u64, width: u64, lock: u64, tag: u8 },
    SetAuthorizedSupply { cap: u64 },
    Advance { secs: u64 },
}

/// Generate a party, mostly accounts.
pub fn party() -> impl Strategy<Value = Party> {
    prop_oneof![
        4 => (0..ACCOUNTS).prop_map(Party::Account),
        1 => Just(Party::Custodian),
    ]
}

/// Generate a lock offset: usually none, sometimes a short one.
pub fn lock_offset() -> impl Strategy<Value = u64> {
    prop_oneof![3 => Just(0u64), 1 => 1u64..50]
}

/// Generate a tag selector. Few distinct values keep merges frequent.
pub fn tag_byte() -> impl Strategy<Value = u8> {
    0u8..3
}

/// Generate an identifier in the neighbourhood of what gets minted.
pub fn identifier() -> impl Strategy<Value = u64> {
    1u64..1_200
}

/// Generate a single operation.
pub fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (party(), 1u64..200, lock_offset(), tag_byte())
            .prop_map(|(to, amount, lock, tag)| Op::Mint { to, amount, lock, tag }),
        2 => (identifier(), 0u64..80).prop_map(|(start, width)| Op::Burn { start, width }),
        4 => (party(), party(), 0u64..250)
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        1 => (0..ACCOUNTS, 0..ACCOUNTS, 1u64..100)
            .prop_map(|(from, to, amount)| Op::TransferInternal { from, to, amount }),
        3 => (party(), party(), identifier(), 0u64..80)
            .prop_map(|(from, to, start, width)| Op::TransferRange { from, to, start, width }),
        1 => (identifier(), lock_offset(), tag_byte())
            .prop_map(|(id, lock, tag)| Op::ModifyRange { id, lock, tag }),
        2 => (identifier(), 0u64..300, lock_offset(), tag_byte())
            .prop_map(|(start, width, lock, tag)| Op::ModifyRanges { start, width, lock, tag }),
        1 => (0u64..3_000).prop_map(|cap| Op::SetAuthorizedSupply { cap }),
        1 => (1u64..60).prop_map(|secs| Op::Advance { secs }),
    ]
}

/// Generate a sequence of operations.
pub fn ops(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op(), 1..=max_len)
}

fn tag_for(byte: u8) -> Tag {
    Tag::new(vec![byte])
}

fn lock_at(fixture: &LedgerFixture, offset: u64) -> u64 {
    if offset == 0 {
        0
    } else {
        fixture.now() + offset
    }
}

/// Run `op` against the fixture.
pub fn apply(fixture: &mut LedgerFixture, op: &Op) -> Result<(), LedgerError> {
    match *op {
        Op::Mint { to, amount, lock, tag } => {
            let to = to.resolve(fixture);
            let lock = lock_at(fixture, lock);
            fixture.ledger.mint(to, amount, lock, tag_for(tag)).map(drop)
        }
        Op::Burn { start, width } => fixture.ledger.burn(start, start + width).map(drop),
        Op::Transfer { from, to, amount } => {
            let (from, to) = (from.resolve(fixture), to.resolve(fixture));
            fixture.ledger.transfer(from, to, amount).map(drop)
        }
        Op::TransferInternal { from, to, amount } => {
            let (from, to) = (fixture.account(from), fixture.account(to));
            let custodian = fixture.custodian;
            fixture
                .ledger
                .transfer_internal(custodian, from, to, amount)
                .map(drop)
        }
        Op::TransferRange { from, to, start, width } => {
            let (from, to) = (from.resolve(fixture), to.resolve(fixture));
            fixture
                .ledger
                .transfer_range(from, to, start, start + width)
        }
        Op::ModifyRange { id, lock, tag } => {
            let lock = lock_at(fixture, lock);
            fixture.ledger.modify_range(id, lock, tag_for(tag)).map(drop)
        }
        Op::ModifyRanges { start, width, lock, tag } => {
            let lock = lock_at(fixture, lock);
            fixture
                .ledger
                .modify_ranges(start, start + width, lock, tag_for(tag))
                .map(drop)
        }
        Op::SetAuthorizedSupply { cap } => fixture.ledger.modify_authorized_supply(cap),
        Op::Advance { secs } => {
            fixture.advance(secs);
            Ok(())
        }
    }
}

/// Check the ledger-wide invariants.
///
/// - the index is sorted, disjoint, maximally merged and below the cursor
/// - the recorded total equals the live width and the sum of all balances
/// - the total never exceeds the authorized supply
/// - every account's custodial holdings add up to what its agents hold
/// - the canonical snapshot decodes back to the same state
pub fn check_invariants(ledger: &Ledger) -> Result<(), String> {
    validate_index(ledger.index()).map_err(|e| e.to_string())?;
    validate_supply(ledger.index(), ledger.total_supply()).map_err(|e| e.to_string())?;

    if ledger.total_supply() > ledger.authorized_supply() {
        return Err(format!(
            "total supply {} exceeds authorized {}",
            ledger.total_supply(),
            ledger.authorized_supply()
        ));
    }
    if ledger.cursor() > ID_CEILING {
        return Err(format!("cursor {} beyond ceiling", ledger.cursor()));
    }

    let mut owners = BTreeSet::new();
    let mut agents = BTreeSet::new();
    for range in ledger.index().iter() {
        owners.insert(range.owner);
        if let Some(agent) = range.custodian {
            agents.insert(agent);
        }
    }

    let balances: u64 = owners
        .union(&agents)
        .map(|account| ledger.balance_of(account))
        .sum();
    if balances != ledger.total_supply() {
        return Err(format!(
            "balances sum to {balances}, total supply is {}",
            ledger.total_supply()
        ));
    }

    for agent in &agents {
        let held: u64 = owners
            .iter()
            .map(|owner| ledger.custodian_balance_of(owner, agent))
            .sum();
        if held != ledger.balance_of(agent) {
            return Err(format!(
                "agent {agent} holds {} but custodial balances sum to {held}",
                ledger.balance_of(agent)
            ));
        }
    }

    let snapshot = ledger.snapshot();
    let decoded = Snapshot::decode(&snapshot.encode()).map_err(|e| e.to_string())?;
    if decoded != snapshot {
        return Err("snapshot does not survive encoding".into());
    }
    Ok(())
}
