//! Position engine
//!
//! All mutations on a position run under that position's lock and commit
//! through a versioned compare-and-swap, closing the race where two writers
//! read the same stale debt and both pass the ratio check.

use crate::{
    error::{Error, Result},
    registry::CollateralOracle,
    types::{collateral_ratio, Position, Ratio},
};
use chrono::Utc;
use entity_store::{LockMap, MemStore, Versioned};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A position together with its derived collateral ratio
///
/// The ratio is always computed at read time, never persisted. It is `None`
/// when the backing asset can no longer be valued (unregistered or disabled).
#[derive(Debug, Clone)]
pub struct PositionView {
    /// The stored position
    pub position: Position,

    /// Current collateral ratio
    pub collateral_ratio: Option<Ratio>,
}

/// Opens and mutates collateralized positions
pub struct PositionEngine {
    positions: Arc<MemStore<Position>>,
    oracle: Arc<dyn CollateralOracle>,
    locks: LockMap,
}

impl PositionEngine {
    /// Create an engine over a position store and a valuation oracle
    pub fn new(positions: Arc<MemStore<Position>>, oracle: Arc<dyn CollateralOracle>) -> Self {
        Self {
            positions,
            oracle,
            locks: LockMap::new(),
        }
    }

    /// Open an empty position backed by an enabled asset
    pub fn open(&self, user_id: &str, symbol: &str) -> Result<Uuid> {
        self.oracle.valuation(symbol)?;
        let position = Position::new(user_id, symbol);
        let position_id = position.position_id;
        self.positions.insert(position)?;
        debug!(%position_id, user_id, symbol, "opened position");
        Ok(position_id)
    }

    /// Add collateral; cannot violate solvency
    pub async fn deposit(&self, position_id: Uuid, amount: Decimal) -> Result<Position> {
        require_positive(amount)?;
        let _guard = self.locks.acquire(position_id).await;

        let Versioned {
            record: mut position,
            version,
        } = self.load(position_id)?;
        position.collateral_amount += amount;
        self.commit(version, position)
    }

    /// Mint debt against the position's collateral
    ///
    /// Rejected when the prospective ratio would fall below the asset's
    /// minimum; the stored position is untouched in that case.
    pub async fn mint(&self, position_id: Uuid, amount: Decimal) -> Result<Position> {
        require_positive(amount)?;
        let _guard = self.locks.acquire(position_id).await;

        let Versioned {
            record: mut position,
            version,
        } = self.load(position_id)?;
        let valuation = self.oracle.valuation(&position.collateral_symbol)?;

        let new_debt = position.debt_ofd + amount;
        let new_ratio = collateral_ratio(
            position.collateral_amount,
            valuation.price_per_unit,
            new_debt,
        );
        if !new_ratio.meets(valuation.min_collateral_ratio) {
            return Err(Error::Conflict(
                "would fall below min collateral ratio".to_string(),
            ));
        }

        position.debt_ofd = new_debt;
        self.commit(version, position)
    }

    /// Repay debt; clamped at zero, always improves the ratio
    pub async fn repay(&self, position_id: Uuid, amount: Decimal) -> Result<Position> {
        require_positive(amount)?;
        let _guard = self.locks.acquire(position_id).await;

        let Versioned {
            record: mut position,
            version,
        } = self.load(position_id)?;
        position.debt_ofd = (position.debt_ofd - amount).max(Decimal::ZERO);
        self.commit(version, position)
    }

    /// Withdraw collateral, keeping any outstanding debt solvent
    pub async fn withdraw(&self, position_id: Uuid, amount: Decimal) -> Result<Position> {
        require_positive(amount)?;
        let _guard = self.locks.acquire(position_id).await;

        let Versioned {
            record: mut position,
            version,
        } = self.load(position_id)?;
        let valuation = self.oracle.valuation(&position.collateral_symbol)?;
        if amount > position.collateral_amount {
            return Err(Error::Conflict("insufficient collateral".to_string()));
        }

        let new_collateral = position.collateral_amount - amount;
        if position.debt_ofd > Decimal::ZERO {
            let new_ratio = collateral_ratio(
                new_collateral,
                valuation.price_per_unit,
                position.debt_ofd,
            );
            if !new_ratio.meets(valuation.min_collateral_ratio) {
                return Err(Error::Conflict(
                    "would fall below min collateral ratio".to_string(),
                ));
            }
        }

        position.collateral_amount = new_collateral;
        self.commit(version, position)
    }

    /// Fetch a position with its derived ratio
    pub fn get(&self, position_id: Uuid) -> Result<PositionView> {
        let position = self
            .positions
            .get(position_id)
            .map_err(|_| Error::NotFound(format!("position {}", position_id)))?;

        let collateral_ratio = self
            .oracle
            .valuation(&position.collateral_symbol)
            .ok()
            .map(|valuation| {
                collateral_ratio(
                    position.collateral_amount,
                    valuation.price_per_unit,
                    position.debt_ofd,
                )
            });

        Ok(PositionView {
            position,
            collateral_ratio,
        })
    }

    fn load(&self, position_id: Uuid) -> Result<Versioned<Position>> {
        self.positions
            .get_versioned(position_id)
            .map_err(|_| Error::NotFound(format!("position {}", position_id)))
    }

    fn commit(&self, version: u64, mut position: Position) -> Result<Position> {
        position.updated_at = Utc::now();
        self.positions.update(version, position.clone())?;
        Ok(position)
    }
}

fn require_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::Validation("amount must be positive".to_string()));
    }
    Ok(())
}
