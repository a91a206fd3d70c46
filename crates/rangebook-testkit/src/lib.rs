//! # Rangebook Testkit
//!
//! Testing utilities for Rangebook.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Scenarios**: Fixed operation sequences with expected balances and digests
//! - **Generators**: Proptest strategies over ledger operations, plus an invariant checker
//! - **Fixtures**: A ledger on a manual clock with named accounts and a custody agent
//!
//! ## Scenarios
//!
//! Scenarios pin down range layout and snapshot bytes across implementations:
//!
//! ```rust
//! use rangebook_testkit::scenarios::verify_all_scenarios;
//!
//! for outcome in verify_all_scenarios() {
//!     println!("{}: {} {}", outcome.name, outcome.passed, outcome.digest);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use rangebook_testkit::{apply, check_invariants, ops, LedgerFixture};
//!
//! proptest! {
//!     #[test]
//!     fn invariants_hold(ops in ops(40)) {
//!         let mut fixture = LedgerFixture::new();
//!         for op in &ops {
//!             let _ = apply(&mut fixture, op);
//!             prop_assert!(check_invariants(&fixture.ledger).is_ok());
//!         }
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use rangebook_testkit::fixtures::LedgerFixture;
//!
//! let mut fixture = LedgerFixture::new();
//! fixture.mint_each(10_000);
//! assert_eq!(fixture.ledger.total_supply(), 30_000);
//! ```

pub mod fixtures;
pub mod generators;
pub mod scenarios;

pub use fixtures::{memory_service, named_accounts, LedgerFixture, DEFAULT_TAG, GENESIS};
pub use generators::{apply, check_invariants, op, ops, Op, Party};
pub use scenarios::{all_scenarios, run_scenario, verify_all_scenarios, Outcome, Scenario};
