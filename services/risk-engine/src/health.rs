//! Per-slot health formulas
//!
//! Pure functions over already-resolved amounts. All amounts are native
//! units and `price` is native quote per native base.

use types::numeric::FixedPointValue;
use types::order::RestingOrderSplit;

/// Pick the asset weight for a non-negative amount, the liability weight
/// otherwise.
pub fn weight_for(
    amount: FixedPointValue,
    asset_weight: FixedPointValue,
    liab_weight: FixedPointValue,
) -> FixedPointValue {
    if amount.is_negative() {
        liab_weight
    } else {
        asset_weight
    }
}

/// Weighted value of a signed base amount at `price`
pub fn weighted_value(
    amount: FixedPointValue,
    price: FixedPointValue,
    asset_weight: FixedPointValue,
    liab_weight: FixedPointValue,
) -> FixedPointValue {
    amount * price * weight_for(amount, asset_weight, liab_weight)
}

/// Worst-case collateral value of a spot position.
///
/// Without resting orders this is the weighted value of `base_net`.
/// With resting orders both extremes are evaluated (every bid fills, every
/// ask fills) and the lower one is taken. The ask side reuses the weight
/// chosen from the bid side's net position.
///
/// # Panics
/// Panics if `price` is zero while resting orders are present.
pub fn spot_health(
    base_net: FixedPointValue,
    orders: Option<&RestingOrderSplit>,
    price: FixedPointValue,
    asset_weight: FixedPointValue,
    liab_weight: FixedPointValue,
) -> FixedPointValue {
    let Some(orders) = orders else {
        return weighted_value(base_net, price, asset_weight, liab_weight);
    };

    let bids_net = base_net + orders.quote_locked / price + orders.base_free + orders.base_locked;
    let weight = weight_for(bids_net, asset_weight, liab_weight);
    let bids_health = bids_net * weight * price + orders.quote_free;

    let asks_net = base_net - orders.base_locked + orders.base_free;
    let asks_health = asks_net * weight * price
        + price * orders.base_locked
        + orders.quote_free
        + orders.quote_locked;

    bids_health.min(asks_health)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn amount() -> impl Strategy<Value = FixedPointValue> {
        (0i64..1_000_000_000).prop_map(FixedPointValue::from_integer)
    }

    proptest! {
        #[test]
        fn resting_orders_never_beat_face_value(
            base_net in -1_000_000_000i64..1_000_000_000,
            quote_free in amount(),
            quote_locked in amount(),
            base_free in amount(),
            base_locked in amount(),
            price_bits in (1i128 << 32)..(1_000_000i128 << 48),
        ) {
            let asset_weight = FixedPointValue::from_decimal_string("0.8").unwrap();
            let liab_weight = FixedPointValue::from_decimal_string("1.2").unwrap();
            let base_net = FixedPointValue::from_integer(base_net);
            let price = FixedPointValue::from_bits(price_bits);
            let orders = RestingOrderSplit { quote_free, quote_locked, base_free, base_locked };

            let health = spot_health(base_net, Some(&orders), price, asset_weight, liab_weight);
            let face_value = (base_net + base_free + base_locked) * price + quote_free + quote_locked;
            // truncation in `net * weight` is amplified by the price
            let slack = price * FixedPointValue::from_bits(2) + FixedPointValue::from_bits(4);

            prop_assert!(
                health <= face_value + slack,
                "health {} exceeds face value {}", health, face_value
            );
        }

        #[test]
        fn spot_health_is_deterministic(
            base_net in -1_000_000i64..1_000_000,
            quote_locked in amount(),
            base_locked in amount(),
            price in 1i64..100_000,
        ) {
            let orders = RestingOrderSplit { quote_locked, base_locked, ..RestingOrderSplit::default() };
            let price = FixedPointValue::from_integer(price);
            let base_net = FixedPointValue::from_integer(base_net);
            let (aw, lw) = (FixedPointValue::from_decimal_string("0.9").unwrap(), FixedPointValue::from_integer(2));
            prop_assert_eq!(
                spot_health(base_net, Some(&orders), price, aw, lw).to_bits(),
                spot_health(base_net, Some(&orders), price, aw, lw).to_bits()
            );
        }
    }
}
