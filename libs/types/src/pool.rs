//! Lending pools
//!
//! A pool tracks raw (pre-index) deposit and borrow balances split across
//! sub-ledger shards, plus the accrual indices that turn raw balances into
//! native balances. Indices start at 1 and never decrease.

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, PoolError};
use crate::numeric::FixedPointValue;

/// Parameters of the two-segment utilization curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateParams {
    optimal_utilization: FixedPointValue,
    optimal_rate: FixedPointValue,
    max_rate: FixedPointValue,
}

impl RateParams {
    /// Requires `0 < optimal_utilization < 1` and `0 <= optimal_rate <= max_rate`.
    pub fn new(
        optimal_utilization: FixedPointValue,
        optimal_rate: FixedPointValue,
        max_rate: FixedPointValue,
    ) -> Result<Self, ConfigError> {
        let reject = |reason: &str| -> Result<Self, ConfigError> {
            Err(ConfigError::InvalidRateParams {
                reason: reason.to_string(),
            })
        };

        if !optimal_utilization.is_positive() || optimal_utilization >= FixedPointValue::ONE {
            return reject("optimal utilization must lie strictly between 0 and 1");
        }
        if optimal_rate.is_negative() {
            return reject("optimal rate is negative");
        }
        if optimal_rate > max_rate {
            return reject("optimal rate exceeds max rate");
        }

        Ok(Self {
            optimal_utilization,
            optimal_rate,
            max_rate,
        })
    }

    pub fn optimal_utilization(&self) -> FixedPointValue {
        self.optimal_utilization
    }

    pub fn optimal_rate(&self) -> FixedPointValue {
        self.optimal_rate
    }

    pub fn max_rate(&self) -> FixedPointValue {
        self.max_rate
    }
}

/// One sub-ledger of a pool, in raw shard units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolShard {
    pub deposits: FixedPointValue,
    pub borrows: FixedPointValue,
}

/// Lending pool for one asset slot
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    params: RateParams,
    deposit_index: FixedPointValue,
    borrow_index: FixedPointValue,
    last_updated: u64,
    shards: Vec<PoolShard>,
}

impl Pool {
    pub fn new(
        params: RateParams,
        deposit_index: FixedPointValue,
        borrow_index: FixedPointValue,
        last_updated: u64,
        shards: Vec<PoolShard>,
    ) -> Result<Self, ConfigError> {
        for (index, value) in [("deposit", deposit_index), ("borrow", borrow_index)] {
            if value < FixedPointValue::ONE {
                return Err(ConfigError::InvalidPoolIndex {
                    index,
                    value: value.to_string(),
                });
            }
        }
        Ok(Self {
            params,
            deposit_index,
            borrow_index,
            last_updated,
            shards,
        })
    }

    pub fn params(&self) -> &RateParams {
        &self.params
    }

    pub fn deposit_index(&self) -> FixedPointValue {
        self.deposit_index
    }

    pub fn borrow_index(&self) -> FixedPointValue {
        self.borrow_index
    }

    pub fn last_updated(&self) -> u64 {
        self.last_updated
    }

    pub fn shards(&self) -> &[PoolShard] {
        &self.shards
    }

    /// Advance the accrual indices.
    ///
    /// Rejects a decrease of either index or a timestamp older than the
    /// last update; the pool is left untouched on error.
    pub fn apply_indices(
        &mut self,
        deposit_index: FixedPointValue,
        borrow_index: FixedPointValue,
        updated_at: u64,
    ) -> Result<(), PoolError> {
        if updated_at < self.last_updated {
            return Err(PoolError::StaleUpdate {
                current: self.last_updated,
                proposed: updated_at,
            });
        }
        for (index, current, proposed) in [
            ("deposit", self.deposit_index, deposit_index),
            ("borrow", self.borrow_index, borrow_index),
        ] {
            if proposed < current {
                return Err(PoolError::IndexDecrease {
                    index,
                    current: current.to_string(),
                    proposed: proposed.to_string(),
                });
            }
        }

        self.deposit_index = deposit_index;
        self.borrow_index = borrow_index;
        self.last_updated = updated_at;
        Ok(())
    }

    /// Σ raw shard deposits
    pub fn raw_total_deposits(&self) -> FixedPointValue {
        self.shards.iter().map(|s| s.deposits).sum()
    }

    /// Σ raw shard borrows
    pub fn raw_total_borrows(&self) -> FixedPointValue {
        self.shards.iter().map(|s| s.borrows).sum()
    }

    /// `deposit_index × Σ shard.deposits`
    pub fn native_total_deposit(&self) -> FixedPointValue {
        self.deposit_index * self.raw_total_deposits()
    }

    /// `borrow_index × Σ shard.borrows`
    pub fn native_total_borrow(&self) -> FixedPointValue {
        self.borrow_index * self.raw_total_borrows()
    }

    pub fn ui_total_deposit(&self, decimals: u8) -> FixedPointValue {
        self.native_total_deposit() / FixedPointValue::pow10(i32::from(decimals))
    }

    pub fn ui_total_borrow(&self, decimals: u8) -> FixedPointValue {
        self.native_total_borrow() / FixedPointValue::pow10(i32::from(decimals))
    }
}
