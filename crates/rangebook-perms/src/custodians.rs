//! Registered custody agents.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use rangebook_core::Address;

use crate::error::{PermsError, Result};

/// The set of addresses recognised as custody agents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodianSet {
    agents: BTreeSet<Address>,
}

impl CustodianSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent: Address) -> Result<()> {
        if !self.agents.insert(agent) {
            return Err(PermsError::CustodianExists(agent.to_string()));
        }
        Ok(())
    }

    /// Remove an agent.
    ///
    /// The set does not know about ranges; callers refuse removal while the
    /// agent still holds custodied units.
    pub fn remove(&mut self, agent: &Address) -> Result<()> {
        if !self.agents.remove(agent) {
            return Err(PermsError::CustodianNotFound(agent.to_string()));
        }
        Ok(())
    }

    pub fn is_custodian(&self, address: &Address) -> bool {
        self.agents.contains(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> + '_ {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl FromIterator<Address> for CustodianSet {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            agents: iter.into_iter().collect(),
        }
    }
}
