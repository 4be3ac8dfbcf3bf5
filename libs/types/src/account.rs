//! Account snapshot
//!
//! Raw (pre-index) deposit and borrow balances per slot, the margin basket,
//! resting-order balances and derivative positions. An `Account` is loaded
//! fresh before every valuation pass and never mutated by the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::AccountError;
use crate::group::{MAX_PAIRS, MAX_TOKENS, QUOTE_INDEX};
use crate::ids::AccountId;
use crate::numeric::FixedPointValue;
use crate::order::RestingOrderBalances;
use crate::position::PerpPosition;

/// Validated read model of a margin account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AccountRecord", into = "AccountRecord")]
pub struct Account {
    account_id: AccountId,
    deposits: [FixedPointValue; MAX_TOKENS],
    borrows: [FixedPointValue; MAX_TOKENS],
    in_margin_basket: [bool; MAX_PAIRS],
    resting_orders: [Option<RestingOrderBalances>; MAX_PAIRS],
    perp_positions: [PerpPosition; MAX_PAIRS],
}

impl Account {
    /// All-zero account
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            deposits: [FixedPointValue::ZERO; MAX_TOKENS],
            borrows: [FixedPointValue::ZERO; MAX_TOKENS],
            in_margin_basket: [false; MAX_PAIRS],
            resting_orders: [None; MAX_PAIRS],
            perp_positions: [PerpPosition::default(); MAX_PAIRS],
        }
    }

    /// Build from a decoded snapshot record.
    ///
    /// Checks performed:
    /// 1. Slot indices are in range; only non-quote slots carry orders,
    ///    basket membership or derivative positions
    /// 2. Deposit and borrow balances are non-negative
    /// 3. Resting-order balances are internally consistent
    pub fn from_record(record: AccountRecord) -> Result<Self, AccountError> {
        let mut account = Self::new(record.account_id);

        for (slot, balances) in record.slots {
            if slot >= MAX_TOKENS {
                return Err(AccountError::SlotOutOfRange {
                    slot,
                    max: MAX_TOKENS - 1,
                });
            }
            for (field, value) in [("deposit", balances.deposit), ("borrow", balances.borrow)] {
                if value.is_negative() {
                    return Err(AccountError::NegativeBalance {
                        field,
                        slot,
                        value: value.to_string(),
                    });
                }
            }
            account.deposits[slot] = balances.deposit;
            account.borrows[slot] = balances.borrow;

            let has_market_state = balances.in_margin_basket
                || balances.resting_orders.is_some()
                || balances.perp.is_some();
            if slot == QUOTE_INDEX {
                if has_market_state {
                    return Err(AccountError::SlotOutOfRange {
                        slot,
                        max: MAX_PAIRS - 1,
                    });
                }
                continue;
            }

            if let Some(orders) = &balances.resting_orders {
                orders.validate(slot)?;
            }
            account.in_margin_basket[slot] = balances.in_margin_basket;
            account.resting_orders[slot] = balances.resting_orders;
            account.perp_positions[slot] = balances.perp.unwrap_or_default();
        }

        Ok(account)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Raw deposit balance in shard units
    pub fn deposit(&self, slot: usize) -> FixedPointValue {
        self.deposits.get(slot).copied().unwrap_or_default()
    }

    /// Raw borrow balance in shard units
    pub fn borrow(&self, slot: usize) -> FixedPointValue {
        self.borrows.get(slot).copied().unwrap_or_default()
    }

    pub fn in_margin_basket(&self, slot: usize) -> bool {
        self.in_margin_basket.get(slot).copied().unwrap_or(false)
    }

    /// Resting-order balances, `None` when the slot has no open orders
    pub fn resting_orders(&self, slot: usize) -> Option<&RestingOrderBalances> {
        self.resting_orders.get(slot).and_then(Option::as_ref)
    }

    pub fn perp_position(&self, slot: usize) -> Option<&PerpPosition> {
        self.perp_positions.get(slot)
    }

    /// True when no slot holds any balance, order or position
    pub fn is_empty(&self) -> bool {
        self.deposits.iter().chain(self.borrows.iter()).all(FixedPointValue::is_zero)
            && self.resting_orders.iter().flatten().all(RestingOrderBalances::is_empty)
            && self.perp_positions.iter().all(PerpPosition::is_empty)
    }
}

/// Sparse serialized form keyed by slot index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(default)]
    pub account_id: AccountId,
    #[serde(default)]
    pub slots: BTreeMap<usize, SlotBalances>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotBalances {
    pub deposit: FixedPointValue,
    pub borrow: FixedPointValue,
    pub in_margin_basket: bool,
    pub resting_orders: Option<RestingOrderBalances>,
    pub perp: Option<PerpPosition>,
}

impl TryFrom<AccountRecord> for Account {
    type Error = AccountError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        Self::from_record(record)
    }
}

impl From<Account> for AccountRecord {
    fn from(account: Account) -> Self {
        let mut slots = BTreeMap::new();
        for slot in 0..MAX_TOKENS {
            let (in_margin_basket, resting_orders, perp) = if slot == QUOTE_INDEX {
                (false, None, None)
            } else {
                let perp = account.perp_positions[slot];
                (
                    account.in_margin_basket[slot],
                    account.resting_orders[slot],
                    (!perp.is_empty()).then_some(perp),
                )
            };
            let balances = SlotBalances {
                deposit: account.deposits[slot],
                borrow: account.borrows[slot],
                in_margin_basket,
                resting_orders,
                perp,
            };
            if balances != SlotBalances::default() {
                slots.insert(slot, balances);
            }
        }
        Self {
            account_id: account.account_id,
            slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: i64) -> FixedPointValue {
        FixedPointValue::from_integer(v)
    }

    #[test]
    fn test_new_account_is_empty() {
        let account = Account::new(AccountId::new());
        assert!(account.is_empty());
        assert_eq!(account.deposit(QUOTE_INDEX), FixedPointValue::ZERO);
        assert!(account.resting_orders(0).is_none());
    }

    #[test]
    fn test_from_record() {
        let mut record = AccountRecord::default();
        record.slots.insert(
            QUOTE_INDEX,
            SlotBalances {
                deposit: n(1_000),
                ..SlotBalances::default()
            },
        );
        record.slots.insert(
            2,
            SlotBalances {
                borrow: n(5),
                in_margin_basket: true,
                resting_orders: Some(RestingOrderBalances {
                    base_free: n(1),
                    base_total: n(2),
                    ..RestingOrderBalances::default()
                }),
                ..SlotBalances::default()
            },
        );

        let account = Account::from_record(record).unwrap();
        assert_eq!(account.deposit(QUOTE_INDEX), n(1_000));
        assert_eq!(account.borrow(2), n(5));
        assert!(account.in_margin_basket(2));
        assert_eq!(account.resting_orders(2).unwrap().base_total, n(2));
        assert!(!account.is_empty());
    }

    #[test]
    fn test_rejects_negative_balance() {
        let mut record = AccountRecord::default();
        record.slots.insert(
            1,
            SlotBalances {
                deposit: n(-1),
                ..SlotBalances::default()
            },
        );
        assert!(matches!(
            Account::from_record(record),
            Err(AccountError::NegativeBalance { field: "deposit", slot: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_quote_market_state() {
        let mut record = AccountRecord::default();
        record.slots.insert(
            QUOTE_INDEX,
            SlotBalances {
                in_margin_basket: true,
                ..SlotBalances::default()
            },
        );
        assert!(Account::from_record(record).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_slot() {
        let mut record = AccountRecord::default();
        record.slots.insert(MAX_TOKENS, SlotBalances::default());
        assert!(matches!(
            Account::from_record(record),
            Err(AccountError::SlotOutOfRange { .. })
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_sparse_slots() {
        let json = r#"{ "slots": { "15": { "deposit": "10.5" }, "0": { "borrow": "2" } } }"#;
        let account = Account::from_json(json).unwrap();
        assert_eq!(account.borrow(0), n(2));

        let record = AccountRecord::from(account.clone());
        assert_eq!(record.slots.len(), 2);
        assert_eq!(Account::from_record(record).unwrap(), account);
    }
}
