//! Resting-order balances
//!
//! Funds an account has parked on a spot order book for one market, as
//! reported by the order-book collaborator. Totals include the free part;
//! the locked part backs open bids (quote) or asks (base).

use serde::{Deserialize, Serialize};

use crate::errors::AccountError;
use crate::numeric::FixedPointValue;

/// Decoded open-orders balances for one slot, in native units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrderBalances {
    pub base_free: FixedPointValue,
    pub base_total: FixedPointValue,
    pub quote_free: FixedPointValue,
    pub quote_total: FixedPointValue,
    /// Referrer rebates accrued on the book, withdrawable as quote
    #[serde(default)]
    pub referrer_rebates: FixedPointValue,
}

/// Free/locked split used by the valuation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestingOrderSplit {
    pub quote_free: FixedPointValue,
    pub quote_locked: FixedPointValue,
    pub base_free: FixedPointValue,
    pub base_locked: FixedPointValue,
}

impl RestingOrderBalances {
    /// Split into free and locked parts.
    ///
    /// Accrued rebates count as free quote.
    pub fn split(&self) -> RestingOrderSplit {
        RestingOrderSplit {
            quote_free: self.quote_free + self.referrer_rebates,
            quote_locked: self.quote_total - self.quote_free,
            base_free: self.base_free,
            base_locked: self.base_total - self.base_free,
        }
    }

    /// Base held on the book, free and locked
    pub fn total_base(&self) -> FixedPointValue {
        self.base_total
    }

    /// Quote held on the book, free, locked and rebates
    pub fn total_quote(&self) -> FixedPointValue {
        self.quote_total + self.referrer_rebates
    }

    pub fn is_empty(&self) -> bool {
        self.base_total.is_zero() && self.quote_total.is_zero() && self.referrer_rebates.is_zero()
    }

    /// All amounts non-negative and `free <= total` on both sides.
    pub fn validate(&self, slot: usize) -> Result<(), AccountError> {
        let reject = |reason: &str| -> Result<(), AccountError> {
            Err(AccountError::InconsistentOrders {
                slot,
                reason: reason.to_string(),
            })
        };

        let amounts = [
            self.base_free,
            self.base_total,
            self.quote_free,
            self.quote_total,
            self.referrer_rebates,
        ];
        if amounts.iter().any(FixedPointValue::is_negative) {
            return reject("negative amount");
        }
        if self.base_free > self.base_total {
            return reject("base free exceeds base total");
        }
        if self.quote_free > self.quote_total {
            return reject("quote free exceeds quote total");
        }
        Ok(())
    }
}
