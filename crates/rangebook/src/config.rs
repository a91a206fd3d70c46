//! Ledger configuration.

use serde::{Deserialize, Serialize};

use rangebook_core::ID_CEILING;

/// Order in which amount-based transfers consume a holder's ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOrder {
    /// Highest identifiers first.
    #[default]
    HighestFirst,
    /// Lowest identifiers first.
    LowestFirst,
}

/// Configuration for a [`Ledger`](crate::Ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Authorized supply of a freshly created ledger. Ignored when state is
    /// loaded from a store.
    pub authorized_supply: u64,

    /// Range selection order for amount-based transfers.
    pub selection: SelectionOrder,

    /// Whether to validate records, supply and digest when loading.
    pub verify_on_load: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            authorized_supply: ID_CEILING - 1,
            selection: SelectionOrder::HighestFirst,
            verify_on_load: true,
        }
    }
}

impl LedgerConfig {
    pub fn with_authorized_supply(mut self, authorized_supply: u64) -> Self {
        self.authorized_supply = authorized_supply;
        self
    }

    pub fn with_selection(mut self, selection: SelectionOrder) -> Self {
        self.selection = selection;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.authorized_supply, ID_CEILING - 1);
        assert_eq!(config.selection, SelectionOrder::HighestFirst);
        assert!(config.verify_on_load);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"selection": "lowest_first"}"#).unwrap();
        assert_eq!(config.selection, SelectionOrder::LowestFirst);
        assert_eq!(config.authorized_supply, ID_CEILING - 1);
    }
}
