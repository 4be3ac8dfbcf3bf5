//! Weight regimes and per-slot weight tables
//!
//! Health is always evaluated under one regime. Initiation weights are the
//! stricter set and gate risk-increasing actions, Maintenance weights gate
//! forced liquidation, and Unweighted values everything at face value.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::numeric::FixedPointValue;

/// Weight regime used for a valuation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightRegime {
    Maintenance,
    Initiation,
    /// Every weight is 1
    Unweighted,
}

impl WeightRegime {
    pub const ALL: [WeightRegime; 3] = [
        WeightRegime::Maintenance,
        WeightRegime::Initiation,
        WeightRegime::Unweighted,
    ];
}

/// Asset and liability discount factors for one market
///
/// Invariant: `0 <= init_asset <= maint_asset <= 1 <= maint_liab <= init_liab`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWeights {
    pub maint_asset: FixedPointValue,
    pub maint_liab: FixedPointValue,
    pub init_asset: FixedPointValue,
    pub init_liab: FixedPointValue,
}

impl SlotWeights {
    /// All weights 1. The quote slot always uses this table.
    pub const UNIT: SlotWeights = SlotWeights {
        maint_asset: FixedPointValue::ONE,
        maint_liab: FixedPointValue::ONE,
        init_asset: FixedPointValue::ONE,
        init_liab: FixedPointValue::ONE,
    };

    /// Derive weights from maximum leverage figures.
    ///
    /// `asset = (L - 1) / L`, `liab = (L + 1) / L`
    pub fn from_leverage(
        maint_leverage: FixedPointValue,
        init_leverage: FixedPointValue,
    ) -> Result<Self, ConfigError> {
        for leverage in [maint_leverage, init_leverage] {
            if leverage < FixedPointValue::ONE {
                return Err(ConfigError::InvalidLeverage {
                    value: leverage.to_string(),
                });
            }
        }
        let one = FixedPointValue::ONE;
        Ok(Self {
            maint_asset: (maint_leverage - one) / maint_leverage,
            maint_liab: (maint_leverage + one) / maint_leverage,
            init_asset: (init_leverage - one) / init_leverage,
            init_liab: (init_leverage + one) / init_leverage,
        })
    }

    pub fn asset_weight(&self, regime: WeightRegime) -> FixedPointValue {
        match regime {
            WeightRegime::Maintenance => self.maint_asset,
            WeightRegime::Initiation => self.init_asset,
            WeightRegime::Unweighted => FixedPointValue::ONE,
        }
    }

    pub fn liab_weight(&self, regime: WeightRegime) -> FixedPointValue {
        match regime {
            WeightRegime::Maintenance => self.maint_liab,
            WeightRegime::Initiation => self.init_liab,
            WeightRegime::Unweighted => FixedPointValue::ONE,
        }
    }

    /// Check the weight ordering invariant.
    pub fn validate(&self, slot: usize) -> Result<(), ConfigError> {
        let one = FixedPointValue::ONE;
        let reject = |reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::InvalidWeights {
                slot,
                reason: reason.to_string(),
            })
        };

        if self.init_asset.is_negative() {
            return reject("init asset weight is negative");
        }
        if self.init_asset > self.maint_asset {
            return reject("init asset weight exceeds maint asset weight");
        }
        if self.maint_asset > one {
            return reject("maint asset weight exceeds 1");
        }
        if self.maint_liab < one {
            return reject("maint liab weight below 1");
        }
        if self.init_liab < self.maint_liab {
            return reject("init liab weight below maint liab weight");
        }
        Ok(())
    }
}
