//! # Rangebook Permissions
//!
//! Compliance hooks and the custody-agent registry.
//!
//! ## Overview
//!
//! The ledger does not evaluate compliance rules itself. Before every
//! transfer it asks each attached module whether the move may proceed, and
//! after every mint or burn it notifies them. Modules are plain trait
//! objects attached and detached by name.
//!
//! ## Key Concepts
//!
//! - **TransferCheck**: approves or denies a transfer before any mutation
//! - **SupplyCheck**: approves changes to the issuance cap
//! - **SupplyObserver**: receives total-supply changes after mint and burn
//! - **CustodianSet**: the registered custody agents
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rangebook_core::Address;
//! use rangebook_perms::{CustodianSet, ModuleSet, RestrictionList};
//!
//! let restrictions = Arc::new(RestrictionList::new());
//! let mut modules = ModuleSet::new();
//! modules.attach_transfer_check("restrictions", restrictions.clone()).unwrap();
//! restrictions.set_frozen(true);
//!
//! let mut custodians = CustodianSet::new();
//! custodians.register(Address::derive("vault")).unwrap();
//! ```

pub mod custodians;
pub mod error;
pub mod hooks;
pub mod modules;
pub mod restrictions;

pub use custodians::CustodianSet;
pub use error::{PermsError, Result};
pub use hooks::{Decision, SupplyCheck, SupplyObserver, TransferCheck, TransferParticipants};
pub use modules::{ModuleHooks, ModuleSet};
pub use restrictions::RestrictionList;
