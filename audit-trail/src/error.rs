//! Error types for the audit trail

use thiserror::Error;

/// Result type for audit-trail operations
pub type Result<T> = std::result::Result<T, Error>;

/// Audit-trail errors
#[derive(Error, Debug)]
pub enum Error {
    /// A single ledger submit failed
    #[error("ledger submit failed: {0}")]
    Submit(String),

    /// A single ledger submit exceeded its timeout
    #[error("ledger submit timed out after {0} ms")]
    Timeout(u64),

    /// The full retry budget was spent without a confirmed publish
    #[error("publish failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of submit attempts made
        attempts: u32,
        /// The last underlying failure
        last: String,
    },

    /// Proof-record storage failed
    #[error("audit store error: {0}")]
    Store(#[from] entity_store::StoreError),

    /// Payload serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
