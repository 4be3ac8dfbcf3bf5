//! Group: the fixed table of asset slots an account margins against
//!
//! Slot `QUOTE_INDEX` is the quote currency. Every other slot may carry an
//! oracle, a lending token, a spot market and a derivative market. The quote
//! slot is always valued at price 1 with weight 1 and carries no markets.
//!
//! Groups are only built through `Group::new` / `Group::from_config`, which
//! validate the whole table up front.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::ids::{GroupId, OracleId};
use crate::numeric::FixedPointValue;
use crate::pool::{Pool, PoolShard, RateParams};
use crate::risk::SlotWeights;

/// Number of tradeable (non-quote) slots
pub const MAX_PAIRS: usize = 15;
/// Total slots including the quote slot
pub const MAX_TOKENS: usize = MAX_PAIRS + 1;
/// Slot reserved for the quote currency
pub const QUOTE_INDEX: usize = MAX_PAIRS;

/// Lending token attached to a slot
#[derive(Debug, Clone, PartialEq)]
pub struct TokenConfig {
    /// Native decimals; 0 means "not configured"
    pub decimals: u8,
    pub pool: Pool,
}

/// Derivative market parameters handed to the valuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerpMarketConfig {
    pub weights: SlotWeights,
    pub base_lot_size: i64,
    pub quote_lot_size: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetSlot {
    pub oracle: Option<OracleId>,
    pub token: Option<TokenConfig>,
    /// Spot market weights; `None` when the slot has no spot market
    pub spot: Option<SlotWeights>,
    pub perp: Option<PerpMarketConfig>,
}

/// Validated asset table
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    id: GroupId,
    quote: TokenConfig,
    slots: [AssetSlot; MAX_PAIRS],
}

impl Group {
    /// Build a group from the quote token and the non-quote slots.
    ///
    /// Checks performed:
    /// 1. Every slot index is a non-quote index and appears once
    /// 2. Spot markets have a token and an oracle in the same slot
    /// 3. Derivative markets have an oracle
    /// 4. All market weights satisfy the ordering invariant
    pub fn new(
        id: GroupId,
        quote: TokenConfig,
        slots: Vec<(usize, AssetSlot)>,
    ) -> Result<Self, ConfigError> {
        let mut table: [AssetSlot; MAX_PAIRS] = std::array::from_fn(|_| AssetSlot::default());
        let mut seen = [false; MAX_PAIRS];

        for (index, slot) in slots {
            if index >= MAX_PAIRS {
                return Err(ConfigError::SlotOutOfRange {
                    slot: index,
                    max: MAX_PAIRS - 1,
                });
            }
            if seen[index] {
                return Err(ConfigError::Malformed(format!("slot {index} defined twice")));
            }
            seen[index] = true;

            if let Some(weights) = &slot.spot {
                if slot.token.is_none() {
                    return Err(ConfigError::MissingToken { slot: index });
                }
                if slot.oracle.is_none() {
                    return Err(ConfigError::Malformed(format!(
                        "spot market in slot {index} has no oracle"
                    )));
                }
                weights.validate(index)?;
            }
            if let Some(perp) = &slot.perp {
                if slot.oracle.is_none() {
                    return Err(ConfigError::Malformed(format!(
                        "derivative market in slot {index} has no oracle"
                    )));
                }
                perp.weights.validate(index)?;
            }
            table[index] = slot;
        }

        Ok(Self {
            id,
            quote,
            slots: table,
        })
    }

    /// Build from a decoded configuration record.
    pub fn from_config(config: GroupConfig) -> Result<Self, ConfigError> {
        let quote = config.quote.into_token()?;
        let slots = config
            .slots
            .into_iter()
            .map(|record| {
                let token = record.token.map(TokenRecord::into_token).transpose()?;
                Ok((
                    record.index,
                    AssetSlot {
                        oracle: record.oracle,
                        token,
                        spot: record.spot,
                        perp: record.perp,
                    },
                ))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Self::new(config.id, quote, slots)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GroupConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        Self::from_config(config)
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Non-quote slot definition
    pub fn slot(&self, index: usize) -> Result<&AssetSlot, ConfigError> {
        self.slots.get(index).ok_or(ConfigError::SlotOutOfRange {
            slot: index,
            max: MAX_PAIRS - 1,
        })
    }

    pub fn quote_token(&self) -> &TokenConfig {
        &self.quote
    }

    pub fn token(&self, index: usize) -> Option<&TokenConfig> {
        if index == QUOTE_INDEX {
            return Some(&self.quote);
        }
        self.slots.get(index).and_then(|s| s.token.as_ref())
    }

    /// Oracle feeding a slot's price; the quote slot never has one.
    pub fn oracle(&self, index: usize) -> Option<&OracleId> {
        self.slots.get(index).and_then(|s| s.oracle.as_ref())
    }

    /// Spot weights for a slot; the quote slot is always `SlotWeights::UNIT`.
    pub fn spot_weights(&self, index: usize) -> Option<SlotWeights> {
        if index == QUOTE_INDEX {
            return Some(SlotWeights::UNIT);
        }
        self.slots.get(index).and_then(|s| s.spot)
    }

    pub fn perp_market(&self, index: usize) -> Option<&PerpMarketConfig> {
        self.slots.get(index).and_then(|s| s.perp.as_ref())
    }

    /// Non-quote slots with a spot market, ascending
    pub fn spot_market_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_PAIRS).filter(move |&i| self.slots[i].spot.is_some())
    }

    /// Non-quote slots with a derivative market, ascending
    pub fn perp_market_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_PAIRS).filter(move |&i| self.slots[i].perp.is_some())
    }

    /// All slots with a lending token, quote last
    pub fn token_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_PAIRS)
            .filter(move |&i| self.slots[i].token.is_some())
            .chain(std::iter::once(QUOTE_INDEX))
    }
}

// ── Configuration records ────────────────────────────────────────────────

/// Serialized group definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    #[serde(default)]
    pub id: GroupId,
    pub quote: TokenRecord,
    #[serde(default)]
    pub slots: Vec<SlotRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub index: usize,
    #[serde(default)]
    pub oracle: Option<OracleId>,
    #[serde(default)]
    pub token: Option<TokenRecord>,
    #[serde(default)]
    pub spot: Option<SlotWeights>,
    #[serde(default)]
    pub perp: Option<PerpMarketConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(default)]
    pub decimals: u8,
    pub pool: PoolRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub optimal_utilization: FixedPointValue,
    pub optimal_rate: FixedPointValue,
    pub max_rate: FixedPointValue,
    pub deposit_index: FixedPointValue,
    pub borrow_index: FixedPointValue,
    #[serde(default)]
    pub last_updated: u64,
    #[serde(default)]
    pub shards: Vec<PoolShard>,
}

impl TokenRecord {
    fn into_token(self) -> Result<TokenConfig, ConfigError> {
        let p = self.pool;
        let params = RateParams::new(p.optimal_utilization, p.optimal_rate, p.max_rate)?;
        let pool = Pool::new(params, p.deposit_index, p.borrow_index, p.last_updated, p.shards)?;
        Ok(TokenConfig {
            decimals: self.decimals,
            pool,
        })
    }
}
