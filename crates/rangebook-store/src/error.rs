//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored record could not be decoded.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Stored records violate a structural invariant.
    #[error("invalid stored state: {0}")]
    Validation(#[from] rangebook_core::ValidationError),

    /// Snapshot bytes could not be decoded.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] rangebook_core::CoreError),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The blocking worker or connection lock failed.
    #[error("storage task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
