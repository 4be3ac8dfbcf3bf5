//! Derivative position record
//!
//! The decoded per-market derivative position of an account. The valuation
//! engine never reads these fields itself: the record is handed as-is to the
//! external derivative valuator.

use serde::{Deserialize, Serialize};

use crate::numeric::FixedPointValue;

/// Derivative position in one market, in lots and native quote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerpPosition {
    /// Signed base position in base lots
    pub base_position: i64,
    /// Signed quote position in native quote
    pub quote_position: FixedPointValue,
    /// Funding accumulator value at the last settlement
    pub long_settled_funding: FixedPointValue,
    pub short_settled_funding: FixedPointValue,
    /// Resting bids/asks on the derivative book, in base lots
    pub bids_quantity: i64,
    pub asks_quantity: i64,
    /// Matched but not yet settled taker fills
    pub taker_base: i64,
    pub taker_quote: i64,
}

impl PerpPosition {
    /// No position, no resting orders, nothing unsettled
    pub fn is_empty(&self) -> bool {
        self.base_position == 0
            && self.quote_position.is_zero()
            && self.bids_quantity == 0
            && self.asks_quantity == 0
            && self.taker_base == 0
            && self.taker_quote == 0
    }
}
