//! Interest curve
//!
//! Two-segment piecewise-linear curve from pool utilization to borrow rate.
//! The deposit rate is the borrow rate scaled by utilization. Index
//! accrual itself happens outside this crate.

use serde::{Deserialize, Serialize};
use tracing::trace;
use types::errors::ConfigError;
use types::group::Group;
use types::numeric::FixedPointValue;
use types::pool::RateParams;

use crate::error::ValuationError;
use crate::pricing;

/// Annualized rates of one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterestRates {
    pub deposit: FixedPointValue,
    pub borrow: FixedPointValue,
}

/// Borrow rate at a given utilization.
///
/// Utilization at or above 1 pins the rate to `max_rate`.
pub fn borrow_rate_at(params: &RateParams, utilization: FixedPointValue) -> FixedPointValue {
    let optimal_util = params.optimal_utilization();
    let optimal_rate = params.optimal_rate();
    let max_rate = params.max_rate();

    if utilization >= FixedPointValue::ONE {
        max_rate
    } else if utilization > optimal_util {
        let slope = (max_rate - optimal_rate) / (FixedPointValue::ONE - optimal_util);
        optimal_rate + slope * (utilization - optimal_util)
    } else {
        (optimal_rate / optimal_util) * utilization
    }
}

/// Borrow rate for UI-scaled pool totals
pub fn borrow_rate(
    params: &RateParams,
    deposits: FixedPointValue,
    borrows: FixedPointValue,
) -> FixedPointValue {
    if deposits.is_zero() && borrows.is_zero() {
        return FixedPointValue::ZERO;
    }
    if deposits <= borrows {
        return params.max_rate();
    }
    borrow_rate_at(params, borrows / deposits)
}

/// Deposit rate for UI-scaled pool totals: `utilization * borrow_rate`.
pub fn deposit_rate(
    params: &RateParams,
    deposits: FixedPointValue,
    borrows: FixedPointValue,
) -> FixedPointValue {
    if deposits.is_positive() {
        let utilization = borrows / deposits;
        utilization * borrow_rate(params, deposits, borrows)
    } else if borrows.is_positive() {
        params.max_rate()
    } else {
        FixedPointValue::ZERO
    }
}

pub fn rates(
    params: &RateParams,
    deposits: FixedPointValue,
    borrows: FixedPointValue,
) -> InterestRates {
    InterestRates {
        deposit: deposit_rate(params, deposits, borrows),
        borrow: borrow_rate(params, deposits, borrows),
    }
}

/// Current rates of a slot's lending pool, from the pool's UI totals.
pub fn pool_rates(group: &Group, slot: usize) -> Result<InterestRates, ValuationError> {
    let token = group
        .token(slot)
        .ok_or(ConfigError::MissingToken { slot })?;
    let decimals = pricing::decimals_of(group, slot)?;

    let deposits = token.pool.ui_total_deposit(decimals);
    let borrows = token.pool.ui_total_borrow(decimals);
    let result = rates(token.pool.params(), deposits, borrows);

    trace!(
        slot,
        deposits = %deposits,
        borrows = %borrows,
        deposit_rate = %result.deposit,
        borrow_rate = %result.borrow,
        "Pool rates"
    );
    Ok(result)
}
