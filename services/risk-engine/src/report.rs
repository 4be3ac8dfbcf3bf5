//! Serializable summaries for dashboards
//!
//! Monetary figures are converted to `Decimal` in UI quote units, rounded
//! HALF_UP at the configured display precision. Nothing here feeds back
//! into valuation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::ConfigError;
use types::group::Group;
use types::ids::AccountId;
use types::numeric::FixedPointValue;

use crate::error::ValuationError;
use crate::interest;
use crate::pricing;

/// Health and equity figures of one account under one cache snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_id: AccountId,
    /// Timestamp of the cache snapshot the figures were computed from
    pub cache_updated: u64,
    pub maint_health: Decimal,
    pub init_health: Decimal,
    pub maint_health_ratio: f64,
    pub init_health_ratio: f64,
    pub net_equity: Decimal,
    pub assets_value: Decimal,
    pub liabilities_value: Decimal,
    pub leverage: Decimal,
}

/// State and current rates of one lending pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub slot: usize,
    pub decimals: u8,
    pub total_deposits: Decimal,
    pub total_borrows: Decimal,
    pub utilization: Decimal,
    pub deposit_rate: Decimal,
    pub borrow_rate: Decimal,
    pub deposit_index: Decimal,
    pub borrow_index: Decimal,
    pub last_updated: u64,
}

impl PoolSummary {
    pub fn build(group: &Group, slot: usize, dp: u32) -> Result<Self, ValuationError> {
        let token = group
            .token(slot)
            .ok_or(ConfigError::MissingToken { slot })?;
        let decimals = pricing::decimals_of(group, slot)?;
        let deposits = token.pool.ui_total_deposit(decimals);
        let borrows = token.pool.ui_total_borrow(decimals);
        let utilization = if deposits.is_positive() {
            borrows / deposits
        } else {
            FixedPointValue::ZERO
        };
        let rates = interest::pool_rates(group, slot)?;

        Ok(Self {
            slot,
            decimals,
            total_deposits: deposits.to_decimal(dp)?,
            total_borrows: borrows.to_decimal(dp)?,
            utilization: utilization.to_decimal(dp)?,
            deposit_rate: rates.deposit.to_decimal(dp)?,
            borrow_rate: rates.borrow.to_decimal(dp)?,
            deposit_index: token.pool.deposit_index().to_decimal(dp)?,
            borrow_index: token.pool.borrow_index().to_decimal(dp)?,
            last_updated: token.pool.last_updated(),
        })
    }

    /// Summaries for every slot with a lending token, quote last
    pub fn build_all(group: &Group, dp: u32) -> Result<Vec<Self>, ValuationError> {
        group
            .token_slots()
            .map(|slot| Self::build(group, slot, dp))
            .collect()
    }
}
