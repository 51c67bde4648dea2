//! ImpactRail Donation Core
//!
//! The donation lifecycle state machine with role-gated transitions.
//!
//! # Architecture
//!
//! - **Forward-only state machine**: `pending -> funded -> assigned ->
//!   delivered`, with `delivered` terminal
//! - **Role gating**: every edge names the roles allowed to take it; the
//!   table is one exhaustive match consulted by both `transition` and
//!   `deliver`
//! - **Audit events**: committed transitions emit lifecycle events to the
//!   audit trail off the critical path; only `create` awaits its proof so the
//!   caller can surface the ledger transaction id immediately
//!
//! # Invariants
//!
//! - Status only moves along the transition table; no edge back
//! - `delivery_proof_hash` is set exactly when status is `delivered`, and
//!   only ever holds a digest, never the raw proof secret

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod lifecycle;
pub mod transitions;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use lifecycle::DonationLifecycle;
pub use transitions::{allowed_roles, can_transition};
pub use types::{
    Actor, Currency, Donation, DonationFilter, DonationReceipt, DonationStatus, NewDonation, Role,
};
