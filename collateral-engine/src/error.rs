//! Error types for the collateral engine

use thiserror::Error;

/// Result type for collateral operations
pub type Result<T> = std::result::Result<T, Error>;

/// Collateral engine errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input; never retried
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced asset or position does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A financial invariant would be violated; the mutation was not applied
    #[error("conflict: {0}")]
    Conflict(String),

    /// Entity store failure
    #[error("store error: {0}")]
    Store(#[from] entity_store::StoreError),
}
