//! Canonical scenarios for cross-implementation verification.
//!
//! Each scenario is a fixed operation sequence with the balances it must
//! produce. Running one also yields the snapshot digest, so two
//! implementations that agree on every scenario agree byte for byte on the
//! state they reach.

use rangebook::{LedgerConfig, Span};
use serde::Serialize;

use crate::fixtures::LedgerFixture;
use crate::generators::{apply, check_invariants, Op, Party};

/// A canonical scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Human-readable name.
    pub name: &'static str,
    /// Authorized supply the ledger starts with.
    pub authorized_supply: u64,
    /// Operations, all of which must succeed.
    pub ops: Vec<Op>,
    /// Expected direct ranges per account index afterwards.
    pub expected_ranges: Vec<(usize, Vec<(u64, u64)>)>,
    /// Expected total supply afterwards.
    pub expected_total: u64,
}

/// What running a scenario produced.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub name: String,
    pub passed: bool,
    pub detail: String,
    pub digest: String,
    pub snapshot: String,
}

const A: Party = Party::Account(0);
const B: Party = Party::Account(1);
const C: Party = Party::Account(2);
const CUSTODIAN: Party = Party::Custodian;

fn mint(to: Party, amount: u64) -> Op {
    Op::Mint { to, amount, lock: 0, tag: 0 }
}

/// Get all canonical scenarios.
pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "matching mints merge",
            authorized_supply: 100_000,
            ops: vec![mint(A, 10_000), mint(A, 5_000)],
            expected_ranges: vec![(0, vec![(1, 15_001)])],
            expected_total: 15_000,
        },
        Scenario {
            name: "differing tags stay apart",
            authorized_supply: 100_000,
            ops: vec![
                mint(A, 10_000),
                Op::Mint { to: A, amount: 5_000, lock: 0, tag: 1 },
            ],
            expected_ranges: vec![(0, vec![(1, 10_001), (10_001, 15_001)])],
            expected_total: 15_000,
        },
        Scenario {
            name: "custodial entry",
            authorized_supply: 100_000,
            ops: vec![
                mint(A, 10_000),
                Op::Transfer { from: A, to: CUSTODIAN, amount: 4_000 },
            ],
            expected_ranges: vec![(0, vec![(4_001, 10_001)])],
            expected_total: 10_000,
        },
        Scenario {
            name: "burned identifiers are not reissued",
            authorized_supply: 100_000,
            ops: vec![
                mint(A, 10_000),
                Op::Burn { start: 1, width: 10_000 },
                mint(A, 10_000),
            ],
            expected_ranges: vec![(0, vec![(10_001, 20_001)])],
            expected_total: 10_000,
        },
        Scenario {
            name: "modify ranges fragments then rejoins",
            authorized_supply: 100_000,
            ops: vec![
                mint(A, 10_000),
                Op::ModifyRanges { start: 5_000, width: 5_000, lock: 0, tag: 1 },
                Op::ModifyRanges { start: 1, width: 10_000, lock: 0, tag: 0 },
            ],
            expected_ranges: vec![(0, vec![(1, 10_001)])],
            expected_total: 10_000,
        },
        Scenario {
            name: "range transfers across holders",
            authorized_supply: 30_000,
            ops: vec![
                mint(A, 10_000),
                mint(B, 10_000),
                mint(C, 10_000),
                Op::TransferRange { from: B, to: A, start: 10_001, width: 10_000 },
                Op::TransferRange { from: C, to: B, start: 25_000, width: 1_000 },
            ],
            expected_ranges: vec![
                (0, vec![(1, 20_001)]),
                (1, vec![(25_000, 26_000)]),
                (2, vec![(20_001, 25_000), (26_000, 30_001)]),
            ],
            expected_total: 30_000,
        },
        Scenario {
            name: "burn inside a holding",
            authorized_supply: 100_000,
            ops: vec![
                mint(A, 10_000),
                Op::Burn { start: 1, width: 2_000 },
                Op::Burn { start: 8_001, width: 2_000 },
                Op::Burn { start: 4_000, width: 1_000 },
            ],
            expected_ranges: vec![(0, vec![(2_001, 4_000), (5_000, 8_001)])],
            expected_total: 5_000,
        },
    ]
}

/// Run a scenario on a fresh fixture.
pub fn run_scenario(scenario: &Scenario) -> Result<LedgerFixture, String> {
    let config = LedgerConfig::default().with_authorized_supply(scenario.authorized_supply);
    let mut fixture = LedgerFixture::with_config(config, 3);
    for (step, op) in scenario.ops.iter().enumerate() {
        apply(&mut fixture, op).map_err(|e| format!("step {step} ({op:?}) failed: {e}"))?;
    }
    Ok(fixture)
}

fn check(scenario: &Scenario, fixture: &LedgerFixture) -> Result<(), String> {
    check_invariants(&fixture.ledger)?;
    if fixture.ledger.total_supply() != scenario.expected_total {
        return Err(format!(
            "total supply {} != {}",
            fixture.ledger.total_supply(),
            scenario.expected_total
        ));
    }
    for (i, expected) in &scenario.expected_ranges {
        let expected: Vec<Span> = expected.iter().map(|&(a, b)| Span::new(a, b)).collect();
        let actual = fixture.ledger.ranges_of(&fixture.account(*i));
        if actual != expected {
            return Err(format!("account {i}: {actual:?} != {expected:?}"));
        }
    }
    Ok(())
}

/// Run every scenario and report the outcome.
pub fn verify_all_scenarios() -> Vec<Outcome> {
    all_scenarios()
        .iter()
        .map(|scenario| {
            let (passed, detail, digest, snapshot) = match run_scenario(scenario) {
                Ok(fixture) => {
                    let snapshot = fixture.ledger.snapshot();
                    let result = check(scenario, &fixture);
                    (
                        result.is_ok(),
                        result.err().unwrap_or_default(),
                        snapshot.digest().to_hex(),
                        hex::encode(snapshot.encode()),
                    )
                }
                Err(e) => (false, e, String::new(), String::new()),
            };
            Outcome {
                name: scenario.name.to_string(),
                passed,
                detail,
                digest,
                snapshot,
            }
        })
        .collect()
}
