//! Price/index cache snapshot
//!
//! One oracle price per non-quote slot (native quote per native base), one
//! deposit/borrow index pair per slot and the funding accumulators of every
//! derivative market. A valuation pass reads exactly one snapshot; the
//! refresh layer hands out a fresh immutable copy per refresh.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::ConfigError;
use crate::group::{Group, MAX_PAIRS, MAX_TOKENS, QUOTE_INDEX};
use crate::numeric::FixedPointValue;

/// Cached accrual indices of one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPair {
    pub deposit_index: FixedPointValue,
    pub borrow_index: FixedPointValue,
}

impl Default for IndexPair {
    fn default() -> Self {
        Self {
            deposit_index: FixedPointValue::ONE,
            borrow_index: FixedPointValue::ONE,
        }
    }
}

/// Cached funding accumulators of one derivative market
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingAccumulators {
    pub long_funding: FixedPointValue,
    pub short_funding: FixedPointValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CacheRecord", into = "CacheRecord")]
pub struct PriceIndexCache {
    prices: [FixedPointValue; MAX_PAIRS],
    indices: [IndexPair; MAX_TOKENS],
    funding: [FundingAccumulators; MAX_PAIRS],
    last_updated: u64,
}

impl PriceIndexCache {
    /// Validate and wrap a snapshot.
    ///
    /// Prices must be non-negative and every index at least 1.
    pub fn new(
        prices: [FixedPointValue; MAX_PAIRS],
        indices: [IndexPair; MAX_TOKENS],
        funding: [FundingAccumulators; MAX_PAIRS],
        last_updated: u64,
    ) -> Result<Self, ConfigError> {
        for (slot, price) in prices.iter().enumerate() {
            if price.is_negative() {
                return Err(ConfigError::Malformed(format!(
                    "negative cached price {price} for slot {slot}"
                )));
            }
        }
        for (slot, pair) in indices.iter().enumerate() {
            for value in [pair.deposit_index, pair.borrow_index] {
                if value < FixedPointValue::ONE {
                    return Err(ConfigError::InvalidIndex {
                        slot,
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(Self {
            prices,
            indices,
            funding,
            last_updated,
        })
    }

    /// Snapshot the indices currently held by the group's pools.
    pub fn from_group(
        group: &Group,
        prices: [FixedPointValue; MAX_PAIRS],
        funding: [FundingAccumulators; MAX_PAIRS],
        last_updated: u64,
    ) -> Result<Self, ConfigError> {
        let mut indices = [IndexPair::default(); MAX_TOKENS];
        for slot in group.token_slots() {
            if let Some(token) = group.token(slot) {
                indices[slot] = IndexPair {
                    deposit_index: token.pool.deposit_index(),
                    borrow_index: token.pool.borrow_index(),
                };
            }
        }
        Self::new(prices, indices, funding, last_updated)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Cached price in native quote per native base. The quote slot is 1.
    /// Zero means the slot has not been priced.
    pub fn price(&self, slot: usize) -> FixedPointValue {
        if slot == QUOTE_INDEX {
            return FixedPointValue::ONE;
        }
        self.prices.get(slot).copied().unwrap_or_default()
    }

    pub fn indices(&self, slot: usize) -> IndexPair {
        self.indices.get(slot).copied().unwrap_or_default()
    }

    pub fn deposit_index(&self, slot: usize) -> FixedPointValue {
        self.indices(slot).deposit_index
    }

    pub fn borrow_index(&self, slot: usize) -> FixedPointValue {
        self.indices(slot).borrow_index
    }

    pub fn long_funding(&self, slot: usize) -> FixedPointValue {
        self.funding.get(slot).map(|f| f.long_funding).unwrap_or_default()
    }

    pub fn short_funding(&self, slot: usize) -> FixedPointValue {
        self.funding.get(slot).map(|f| f.short_funding).unwrap_or_default()
    }

    pub fn last_updated(&self) -> u64 {
        self.last_updated
    }
}

/// Sparse serialized form; absent slots get price 0, indices 1, funding 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    #[serde(default)]
    pub last_updated: u64,
    #[serde(default)]
    pub prices: BTreeMap<usize, FixedPointValue>,
    #[serde(default)]
    pub indices: BTreeMap<usize, IndexPair>,
    #[serde(default)]
    pub funding: BTreeMap<usize, FundingAccumulators>,
}

impl TryFrom<CacheRecord> for PriceIndexCache {
    type Error = ConfigError;

    fn try_from(record: CacheRecord) -> Result<Self, Self::Error> {
        let mut prices = [FixedPointValue::ZERO; MAX_PAIRS];
        let mut indices = [IndexPair::default(); MAX_TOKENS];
        let mut funding = [FundingAccumulators::default(); MAX_PAIRS];

        for (slot, price) in record.prices {
            *prices.get_mut(slot).ok_or(ConfigError::SlotOutOfRange {
                slot,
                max: MAX_PAIRS - 1,
            })? = price;
        }
        for (slot, pair) in record.indices {
            *indices.get_mut(slot).ok_or(ConfigError::SlotOutOfRange {
                slot,
                max: MAX_TOKENS - 1,
            })? = pair;
        }
        for (slot, accumulators) in record.funding {
            *funding.get_mut(slot).ok_or(ConfigError::SlotOutOfRange {
                slot,
                max: MAX_PAIRS - 1,
            })? = accumulators;
        }

        Self::new(prices, indices, funding, record.last_updated)
    }
}

impl From<PriceIndexCache> for CacheRecord {
    fn from(cache: PriceIndexCache) -> Self {
        Self {
            last_updated: cache.last_updated,
            prices: cache.prices.into_iter().enumerate().collect(),
            indices: cache.indices.into_iter().enumerate().collect(),
            funding: cache.funding.into_iter().enumerate().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(s: &str) -> FixedPointValue {
        FixedPointValue::from_decimal_string(s).unwrap()
    }

    #[test]
    fn test_quote_price_is_one() {
        let cache = PriceIndexCache::try_from(CacheRecord::default()).unwrap();
        assert_eq!(cache.price(QUOTE_INDEX), FixedPointValue::ONE);
        assert_eq!(cache.price(0), FixedPointValue::ZERO);
        assert_eq!(cache.deposit_index(QUOTE_INDEX), FixedPointValue::ONE);
    }

    #[test]
    fn test_rejects_index_below_one() {
        let mut record = CacheRecord::default();
        record.indices.insert(
            3,
            IndexPair {
                deposit_index: fp("0.5"),
                borrow_index: FixedPointValue::ONE,
            },
        );
        let err = PriceIndexCache::try_from(record).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidIndex { slot: 3, .. }));
    }

    #[test]
    fn test_rejects_out_of_range_slot() {
        let mut record = CacheRecord::default();
        record.prices.insert(MAX_PAIRS, FixedPointValue::ONE);
        assert!(matches!(
            PriceIndexCache::try_from(record),
            Err(ConfigError::SlotOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_price() {
        let mut record = CacheRecord::default();
        record.prices.insert(0, fp("-1"));
        assert!(matches!(
            PriceIndexCache::try_from(record),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_json_sparse() {
        let json = r#"{
            "last_updated": 1700000000,
            "prices": { "0": "25.5" },
            "indices": { "15": { "deposit_index": "1.0005", "borrow_index": "1.002" } },
            "funding": { "0": { "long_funding": "0.1", "short_funding": "0.2" } }
        }"#;
        let cache = PriceIndexCache::from_json(json).unwrap();
        assert_eq!(cache.price(0), fp("25.5"));
        assert_eq!(cache.deposit_index(QUOTE_INDEX), fp("1.0005"));
        assert_eq!(cache.short_funding(0), fp("0.2"));
        assert_eq!(cache.last_updated(), 1_700_000_000);
    }

    #[test]
    fn test_serialize_then_load_keeps_snapshot() {
        let mut record = CacheRecord::default();
        record.prices.insert(2, fp("3.25"));
        let cache = PriceIndexCache::try_from(record).unwrap();
        let json = serde_json::to_string(&cache).unwrap();
        assert_eq!(PriceIndexCache::from_json(&json).unwrap(), cache);
    }
}
