//! Error types for the donation core

use crate::types::{DonationStatus, Role};
use thiserror::Error;
use uuid::Uuid;

/// Result type for donation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Donation lifecycle errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input; never retried
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced donation does not exist
    #[error("donation not found: {0}")]
    NotFound(Uuid),

    /// The edge does not exist or the actor's role is not allowed on it
    #[error("cannot transition from {from} to {to} with role {role}")]
    Forbidden {
        /// Current status
        from: DonationStatus,
        /// Requested status
        to: DonationStatus,
        /// Role that attempted the transition
        role: Role,
    },

    /// Administrative operation attempted without the admin role
    #[error("operation requires admin role, got {0}")]
    AdminOnly(Role),

    /// The synchronous ledger publish on the create path failed
    #[error("ledger error: {0}")]
    Ledger(#[from] audit_trail::Error),

    /// Entity store failure
    #[error("store error: {0}")]
    Store(#[from] entity_store::StoreError),
}
