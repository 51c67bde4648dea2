//! Error types for the entity store

use thiserror::Error;
use uuid::Uuid;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with the given id
    #[error("record not found: {0}")]
    NotFound(Uuid),

    /// Compare-and-swap lost a race: the stored version moved on
    #[error("version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict {
        /// Record id
        id: Uuid,
        /// Version the caller read
        expected: u64,
        /// Version currently stored
        found: u64,
    },

    /// Insert with an id that already exists
    #[error("duplicate record: {0}")]
    Duplicate(Uuid),
}
