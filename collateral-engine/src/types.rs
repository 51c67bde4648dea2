//! Core types for the collateral engine
//!
//! Money and prices use `Decimal` for exact arithmetic; the collateral ratio
//! is a closed type so the no-debt case is unrepresentable as a number
//! instead of a sentinel float.

use chrono::{DateTime, Utc};
use entity_store::Entity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A collateral type accepted by the position engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralAsset {
    /// Unique asset id
    pub asset_id: Uuid,

    /// Globally unique ticker symbol
    pub symbol: String,

    /// External token id when the asset is itself a ledger token
    pub token_id: Option<String>,

    /// Static valuation per unit, in USD
    pub value_usd_per_unit: Decimal,

    /// Minimum collateral ratio, e.g. 1.5 for 150%
    pub min_collateral_ratio: Decimal,

    /// Token decimals
    pub decimals: u32,

    /// Disabled assets cannot back new positions
    pub enabled: bool,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl CollateralAsset {
    /// Create an enabled asset with default ratio (1.5) and decimals (8)
    pub fn new(symbol: impl Into<String>, value_usd_per_unit: Decimal) -> Self {
        let now = Utc::now();
        Self {
            asset_id: Uuid::now_v7(),
            symbol: symbol.into(),
            token_id: None,
            value_usd_per_unit,
            min_collateral_ratio: Decimal::new(15, 1),
            decimals: 8,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the minimum collateral ratio
    pub fn with_min_ratio(mut self, min_collateral_ratio: Decimal) -> Self {
        self.min_collateral_ratio = min_collateral_ratio;
        self
    }

    /// Attach an external token id
    pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }
}

impl Entity for CollateralAsset {
    fn id(&self) -> Uuid {
        self.asset_id
    }
}

/// Position status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    /// Accepting mutations
    Open,
    /// Closed by administrative action
    Closed,
}

/// One user's collateralized credit line against one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Unique position id
    pub position_id: Uuid,

    /// Owning user
    pub user_id: String,

    /// Symbol of the backing asset
    pub collateral_symbol: String,

    /// Deposited collateral, in asset units
    pub collateral_amount: Decimal,

    /// Outstanding minted debt, in OFD
    pub debt_ofd: Decimal,

    /// Status
    pub status: PositionStatus,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Create an empty open position
    pub fn new(user_id: impl Into<String>, collateral_symbol: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            position_id: Uuid::now_v7(),
            user_id: user_id.into(),
            collateral_symbol: collateral_symbol.into(),
            collateral_amount: Decimal::ZERO,
            debt_ofd: Decimal::ZERO,
            status: PositionStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Position {
    fn id(&self) -> Uuid {
        self.position_id
    }
}

/// Collateral ratio: value of collateral over outstanding debt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ratio {
    /// No debt, no risk
    Infinite,
    /// Collateral value divided by debt
    Finite(Decimal),
}

impl Ratio {
    /// True when the ratio is at or above the given minimum
    pub fn meets(&self, min: Decimal) -> bool {
        match self {
            Ratio::Infinite => true,
            Ratio::Finite(ratio) => *ratio >= min,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Infinite => write!(f, "inf"),
            Ratio::Finite(ratio) => write!(f, "{}", ratio),
        }
    }
}

/// Compute the collateral ratio for a prospective position state
pub fn collateral_ratio(collateral: Decimal, price_per_unit: Decimal, debt: Decimal) -> Ratio {
    if debt <= Decimal::ZERO {
        Ratio::Infinite
    } else {
        Ratio::Finite(collateral * price_per_unit / debt)
    }
}
