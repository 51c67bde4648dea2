//! Collateral asset registry
//!
//! Thin CRUD over [`CollateralAsset`] with symbol uniqueness, doubling as the
//! static price oracle consulted by the position engine.

use crate::{
    error::{Error, Result},
    types::CollateralAsset,
};
use chrono::Utc;
use entity_store::MemStore;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Per-unit valuation and risk floor for an enabled asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Valuation {
    /// Static price per asset unit, in USD
    pub price_per_unit: Decimal,

    /// Minimum collateral ratio required by the asset
    pub min_collateral_ratio: Decimal,
}

/// Source of collateral valuations
///
/// The registry's static prices satisfy this today; a live feed can replace
/// it without touching the ratio arithmetic.
pub trait CollateralOracle: Send + Sync {
    /// Valuation for an enabled asset; `NotFound` when the symbol is unknown
    /// or the asset is disabled
    fn valuation(&self, symbol: &str) -> Result<Valuation>;
}

/// Registry of accepted collateral assets
pub struct AssetRegistry {
    assets: MemStore<CollateralAsset>,

    /// Serializes writes so the symbol-uniqueness check cannot race
    write_lock: Mutex<()>,
}

impl AssetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            assets: MemStore::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Register a new asset; the symbol must be unused
    pub fn register(&self, asset: CollateralAsset) -> Result<Uuid> {
        let _guard = self.write_lock.lock();
        if self.find_by_symbol(&asset.symbol).is_some() {
            return Err(Error::Conflict(format!(
                "collateral symbol already registered: {}",
                asset.symbol
            )));
        }
        let asset_id = asset.asset_id;
        self.assets.insert(asset)?;
        Ok(asset_id)
    }

    /// Fetch an asset by symbol, enabled or not
    pub fn get(&self, symbol: &str) -> Result<CollateralAsset> {
        self.find_by_symbol(symbol)
            .ok_or_else(|| Error::NotFound(format!("collateral asset {}", symbol)))
    }

    /// All registered assets
    pub fn list(&self) -> Vec<CollateralAsset> {
        self.assets.find(|_| true)
    }

    /// Enable or disable an asset
    pub fn set_enabled(&self, symbol: &str, enabled: bool) -> Result<()> {
        let _guard = self.write_lock.lock();
        let current = self.get(symbol)?;
        let versioned = self.assets.get_versioned(current.asset_id)?;
        let mut asset = versioned.record;
        asset.enabled = enabled;
        asset.updated_at = Utc::now();
        self.assets.update(versioned.version, asset)?;
        Ok(())
    }

    fn find_by_symbol(&self, symbol: &str) -> Option<CollateralAsset> {
        self.assets.find(|asset| asset.symbol == symbol).pop()
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CollateralOracle for AssetRegistry {
    fn valuation(&self, symbol: &str) -> Result<Valuation> {
        match self.find_by_symbol(symbol) {
            Some(asset) if asset.enabled => Ok(Valuation {
                price_per_unit: asset.value_usd_per_unit,
                min_collateral_ratio: asset.min_collateral_ratio,
            }),
            _ => Err(Error::NotFound(format!("collateral asset {}", symbol))),
        }
    }
}
