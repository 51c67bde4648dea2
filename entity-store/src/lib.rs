//! ImpactRail Entity Store
//!
//! Versioned in-process entity storage with per-key locking.
//!
//! # Architecture
//!
//! - **CRUD-by-id + filtered find**: the only query semantics the core needs
//! - **Optimistic concurrency**: every record carries a version counter;
//!   updates are compare-and-swap on that version
//! - **Per-key serialization**: [`LockMap`] hands out one async mutex per
//!   entity id so engines can serialize read-modify-write cycles
//!
//! The persistent store proper is an external collaborator; this crate is the
//! in-process implementation of its contract used by the engines and tests.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod lockmap;
pub mod store;

// Re-exports
pub use error::{Result, StoreError};
pub use lockmap::LockMap;
pub use store::{Entity, MemStore, Versioned};
