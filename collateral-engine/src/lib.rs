//! ImpactRail Collateral Engine
//!
//! Collateralized credit positions against registered assets.
//!
//! # Invariants
//!
//! - Solvency: whenever a position carries debt, collateral value divided by
//!   debt stays at or above the asset's minimum collateral ratio after every
//!   committed mutation
//! - Rejected mutations change nothing: the ratio check happens on the
//!   prospective state and failure leaves the stored record untouched
//! - Per-position serialization: mutations on one position are mutually
//!   exclusive, so two writers cannot both pass the ratio check against the
//!   same stale debt
//!
//! Valuation is a static per-unit price read from the asset registry, kept
//! behind the [`CollateralOracle`] seam so a live feed can replace it without
//! touching the ratio arithmetic.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod engine;
pub mod error;
pub mod registry;
pub mod types;

// Re-exports
pub use engine::{PositionEngine, PositionView};
pub use error::{Error, Result};
pub use registry::{AssetRegistry, CollateralOracle, Valuation};
pub use types::{collateral_ratio, CollateralAsset, Position, PositionStatus, Ratio};
