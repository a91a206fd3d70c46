//! Error types for the compliance module layer.

use thiserror::Error;

/// Errors raised by attached modules and module registration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermsError {
    /// A module rejected the operation.
    #[error("denied by {module}: {reason}")]
    Denied { module: String, reason: String },

    /// A module with this name is already attached.
    #[error("module already attached: {0}")]
    DuplicateModule(String),

    /// No module with this name is attached.
    #[error("module not attached: {0}")]
    ModuleNotFound(String),

    /// Address is already a registered custody agent.
    #[error("custodian already registered: {0}")]
    CustodianExists(String),

    /// Address is not a registered custody agent.
    #[error("custodian not registered: {0}")]
    CustodianNotFound(String),
}

/// Result type for module operations.
pub type Result<T> = std::result::Result<T, PermsError>;
