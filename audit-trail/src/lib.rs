//! ImpactRail Audit Trail
//!
//! Publishes lifecycle events to an external append-only ledger and keeps a
//! local proof record for each confirmed publish.
//!
//! # Architecture
//!
//! - **Narrow ledger seam**: [`LedgerClient`] is submit-only; everything else
//!   (retry, timeouts, proof records) lives on this side of the seam
//! - **Bounded retry**: fixed attempt budget with linear backoff, each
//!   attempt under its own timeout
//! - **Degraded mode**: with no configured ledger, synthetic-but-unique
//!   transaction ids keep the observable shape stable
//! - **Off the critical path**: callers enqueue on a bounded actor; failures
//!   there are logged and counted, never surfaced to the mutation caller
//!
//! # Invariants
//!
//! - One [`AuditLogEntry`] per confirmed publish attempt, immutable once
//!   written
//! - `payload_hash` is the SHA-256 of the payload's canonical bytes, so two
//!   independent implementations of the canonical form agree on the digest

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod payload;
pub mod publisher;

// Re-exports
pub use actor::{spawn_audit_actor, AuditHandle};
pub use client::{LedgerClient, LedgerReceipt};
pub use config::{AuditConfig, RetryConfig};
pub use error::{Error, Result};
pub use payload::{sha256_hex, EventPayload};
pub use publisher::{AuditLogEntry, AuditPublisher};
