//! Price scaling between native units and the quote currency
//!
//! Cached prices are native quote per native base. The derivative valuator
//! expects them rescaled by the decimal-place difference between the slot's
//! token and the quote token.

use types::cache::PriceIndexCache;
use types::errors::ConfigError;
use types::group::{Group, QUOTE_INDEX};
use types::numeric::FixedPointValue;

/// Decimals assumed for an oracle-backed slot with no configured decimals
pub const DEFAULT_ORACLE_DECIMALS: u8 = 6;

/// Native decimals of a slot.
///
/// A non-quote slot with an oracle but zero configured decimals defaults to
/// `DEFAULT_ORACLE_DECIMALS`. A slot with neither cannot be scaled.
pub fn decimals_of(group: &Group, slot: usize) -> Result<u8, ConfigError> {
    let configured = group.token(slot).map(|t| t.decimals).unwrap_or(0);
    if configured != 0 {
        return Ok(configured);
    }
    if slot != QUOTE_INDEX && group.oracle(slot).is_some() {
        return Ok(DEFAULT_ORACLE_DECIMALS);
    }
    Err(ConfigError::UnresolvableDecimals { slot })
}

/// Cached price of a non-quote slot, which must be positive to be valued.
pub fn required_price(cache: &PriceIndexCache, slot: usize) -> Result<FixedPointValue, ConfigError> {
    let price = cache.price(slot);
    if price.is_positive() {
        Ok(price)
    } else {
        Err(ConfigError::MissingPrice { slot })
    }
}

/// `price(slot) * 10^(decimals(slot) - decimals(quote))`; the quote slot is 1.
///
/// A negative exponent divides by `10^-d` so the result is truncated once.
pub fn normalized_price(
    group: &Group,
    cache: &PriceIndexCache,
    slot: usize,
) -> Result<FixedPointValue, ConfigError> {
    if slot == QUOTE_INDEX {
        return Ok(FixedPointValue::ONE);
    }
    let base = i32::from(decimals_of(group, slot)?);
    let quote = i32::from(decimals_of(group, QUOTE_INDEX)?);
    let price = required_price(cache, slot)?;
    let shift = base - quote;
    if shift >= 0 {
        Ok(price * FixedPointValue::pow10(shift))
    } else {
        Ok(price / FixedPointValue::pow10(-shift))
    }
}

/// Native amount to UI units: `value / 10^decimals`
pub fn native_to_ui(value: FixedPointValue, decimals: u8) -> FixedPointValue {
    value / FixedPointValue::pow10(i32::from(decimals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::group::{AssetSlot, TokenConfig};
    use types::ids::{GroupId, OracleId};
    use types::pool::{Pool, RateParams};

    fn fp(s: &str) -> FixedPointValue {
        FixedPointValue::from_decimal_string(s).unwrap()
    }

    fn token(decimals: u8) -> TokenConfig {
        let params = RateParams::new(fp("0.7"), fp("0.06"), fp("1.5")).unwrap();
        TokenConfig {
            decimals,
            pool: Pool::new(params, FixedPointValue::ONE, FixedPointValue::ONE, 0, vec![]).unwrap(),
        }
    }

    fn group() -> Group {
        let slots = vec![
            (
                0,
                AssetSlot {
                    oracle: Some(OracleId::new("SOL/USD")),
                    token: Some(token(9)),
                    ..AssetSlot::default()
                },
            ),
            (
                1,
                AssetSlot {
                    oracle: Some(OracleId::new("XYZ/USD")),
                    token: Some(token(0)),
                    ..AssetSlot::default()
                },
            ),
            (
                2,
                AssetSlot {
                    token: Some(token(0)),
                    ..AssetSlot::default()
                },
            ),
        ];
        Group::new(GroupId::new(), token(6), slots).unwrap()
    }

    fn cache() -> PriceIndexCache {
        PriceIndexCache::from_json(r#"{ "prices": { "0": "0.025", "1": "3" } }"#).unwrap()
    }

    #[test]
    fn test_decimals_of() {
        let group = group();
        assert_eq!(decimals_of(&group, 0).unwrap(), 9);
        assert_eq!(decimals_of(&group, QUOTE_INDEX).unwrap(), 6);
    }

    #[test]
    fn test_oracle_slot_defaults_to_six() {
        assert_eq!(decimals_of(&group(), 1).unwrap(), DEFAULT_ORACLE_DECIMALS);
    }

    #[test]
    fn test_unresolvable_decimals() {
        let group = group();
        assert_eq!(
            decimals_of(&group, 2),
            Err(ConfigError::UnresolvableDecimals { slot: 2 })
        );
        assert_eq!(
            decimals_of(&group, 7),
            Err(ConfigError::UnresolvableDecimals { slot: 7 })
        );
    }

    #[test]
    fn test_normalized_price() {
        let group = group();
        let cache = cache();
        // 9 native decimals vs 6 for quote: scale by 10^3
        assert_eq!(normalized_price(&group, &cache, 0).unwrap(), fp("0.025") * fp("1000"));
        // defaulted decimals match the quote
        assert_eq!(normalized_price(&group, &cache, 1).unwrap(), fp("3"));
        assert_eq!(
            normalized_price(&group, &cache, QUOTE_INDEX).unwrap(),
            FixedPointValue::ONE
        );
        assert!(normalized_price(&group, &cache, 2).is_err());
    }

    #[test]
    fn test_normalized_price_with_finer_quote() {
        let slots = vec![(
            0,
            AssetSlot {
                oracle: Some(OracleId::new("BTC/USD")),
                token: Some(token(6)),
                ..AssetSlot::default()
            },
        )];
        let group = Group::new(GroupId::new(), token(9), slots).unwrap();
        let cache = PriceIndexCache::from_json(r#"{ "prices": { "0": "30000" } }"#).unwrap();
        // 6 native decimals vs 9 for quote: one division by 10^3
        assert_eq!(normalized_price(&group, &cache, 0).unwrap(), fp("30"));
    }

    #[test]
    fn test_missing_price() {
        let group = group();
        let cache = PriceIndexCache::from_json(r#"{ "prices": { "1": "3" } }"#).unwrap();
        assert_eq!(
            normalized_price(&group, &cache, 0),
            Err(ConfigError::MissingPrice { slot: 0 })
        );
        assert_eq!(required_price(&cache, 1).unwrap(), fp("3"));
    }

    #[test]
    fn test_native_to_ui() {
        assert_eq!(
            native_to_ui(FixedPointValue::from_integer(2_500_000), 6),
            fp("2.5")
        );
        assert_eq!(native_to_ui(fp("42"), 0), fp("42"));
    }
}
