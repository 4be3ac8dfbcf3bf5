//! Valuation engine orchestrator
//!
//! Ties together pricing, the per-slot health formulas and the derivative
//! valuator. Every method is a pure function of the borrowed group, the
//! borrowed cache snapshot and the account passed in; nothing is cached
//! between calls.

use tracing::{debug, trace, warn};
use types::account::Account;
use types::cache::PriceIndexCache;
use types::errors::ConfigError;
use types::group::{Group, MAX_PAIRS, QUOTE_INDEX};
use types::numeric::FixedPointValue;
use types::order::{RestingOrderBalances, RestingOrderSplit};
use types::risk::{SlotWeights, WeightRegime};

use crate::config::EngineConfig;
use crate::error::ValuationError;
use crate::health;
use crate::pricing;
use crate::report::AccountSummary;
use crate::valuator::DerivativeValuator;

/// Health ratio reported when the account has no liabilities
pub const NO_LIABILITIES_RATIO: f64 = 100.0;

/// Valuation engine bound to one group and one cache snapshot
pub struct ValuationEngine<'a, V: DerivativeValuator + ?Sized> {
    group: &'a Group,
    cache: &'a PriceIndexCache,
    valuator: &'a V,
    config: EngineConfig,
}

impl<'a, V: DerivativeValuator + ?Sized> ValuationEngine<'a, V> {
    /// Create an engine with default configuration
    pub fn new(group: &'a Group, cache: &'a PriceIndexCache, valuator: &'a V) -> Self {
        Self {
            group,
            cache,
            valuator,
            config: EngineConfig::default(),
        }
    }

    /// Create an engine with custom configuration
    pub fn with_config(
        group: &'a Group,
        cache: &'a PriceIndexCache,
        valuator: &'a V,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            group,
            cache,
            valuator,
            config,
        })
    }

    pub fn group(&self) -> &Group {
        self.group
    }

    pub fn cache(&self) -> &PriceIndexCache {
        self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Balances ─────────────────────────────────────────────────────────

    /// Raw deposit times the cached deposit index
    pub fn native_deposit(&self, account: &Account, slot: usize) -> FixedPointValue {
        account.deposit(slot) * self.cache.deposit_index(slot)
    }

    /// Raw borrow times the cached borrow index
    pub fn native_borrow(&self, account: &Account, slot: usize) -> FixedPointValue {
        account.borrow(slot) * self.cache.borrow_index(slot)
    }

    pub fn ui_deposit(&self, account: &Account, slot: usize) -> Result<FixedPointValue, ValuationError> {
        let decimals = pricing::decimals_of(self.group, slot)?;
        Ok(pricing::native_to_ui(self.native_deposit(account, slot), decimals))
    }

    pub fn ui_borrow(&self, account: &Account, slot: usize) -> Result<FixedPointValue, ValuationError> {
        let decimals = pricing::decimals_of(self.group, slot)?;
        Ok(pricing::native_to_ui(self.native_borrow(account, slot), decimals))
    }

    fn net_balance(&self, account: &Account, slot: usize) -> FixedPointValue {
        self.native_deposit(account, slot) - self.native_borrow(account, slot)
    }

    /// Resting orders that count towards margin: basket slots only
    fn margined_book<'b>(&self, account: &'b Account, slot: usize) -> Option<&'b RestingOrderBalances> {
        if !account.in_margin_basket(slot) {
            return None;
        }
        account.resting_orders(slot)
    }

    fn margined_orders(&self, account: &Account, slot: usize) -> Option<RestingOrderSplit> {
        self.margined_book(account, slot).map(|orders| orders.split())
    }

    fn spot_weights(&self, slot: usize) -> SlotWeights {
        self.group.spot_weights(slot).unwrap_or(SlotWeights::UNIT)
    }

    // ── Health ───────────────────────────────────────────────────────────

    /// Worst-case collateral value of the spot position in `slot`.
    ///
    /// An empty slot is worth zero without a price lookup.
    pub fn spot_health(
        &self,
        account: &Account,
        slot: usize,
        asset_weight: FixedPointValue,
        liab_weight: FixedPointValue,
    ) -> Result<FixedPointValue, ValuationError> {
        let base_net = self.net_balance(account, slot);
        let orders = self.margined_orders(account, slot);
        if base_net.is_zero() && orders.is_none() {
            return Ok(FixedPointValue::ZERO);
        }
        Ok(health::spot_health(
            base_net,
            orders.as_ref(),
            pricing::required_price(self.cache, slot)?,
            asset_weight,
            liab_weight,
        ))
    }

    /// Contribution of the derivative position in `slot`, as reported by
    /// the valuator
    pub fn derivative_health(
        &self,
        account: &Account,
        slot: usize,
        asset_weight: FixedPointValue,
        liab_weight: FixedPointValue,
    ) -> Result<FixedPointValue, ValuationError> {
        let market = self.group.perp_market(slot).ok_or_else(|| {
            ConfigError::Malformed(format!("slot {slot} has no derivative market"))
        })?;
        let position = account.perp_position(slot).copied().unwrap_or_default();
        let price = pricing::normalized_price(self.group, self.cache, slot)?;

        Ok(self.valuator.valuate(
            &position,
            market,
            price,
            asset_weight,
            liab_weight,
            self.cache.long_funding(slot),
            self.cache.short_funding(slot),
        ))
    }

    /// Account health under `regime`, in native quote.
    ///
    /// Quote balance plus every configured spot market plus every
    /// configured derivative market. Slots without a market are skipped.
    pub fn health(&self, account: &Account, regime: WeightRegime) -> Result<FixedPointValue, ValuationError> {
        let mut total = self.net_balance(account, QUOTE_INDEX);

        for slot in self.group.spot_market_slots() {
            let weights = self.spot_weights(slot);
            let contribution = self.spot_health(
                account,
                slot,
                weights.asset_weight(regime),
                weights.liab_weight(regime),
            )?;
            trace!(slot, ?regime, contribution = %contribution, "Spot health");
            total += contribution;
        }

        for slot in self.group.perp_market_slots() {
            let weights = match self.group.perp_market(slot) {
                Some(market) => market.weights,
                None => continue,
            };
            let contribution = self.derivative_health(
                account,
                slot,
                weights.asset_weight(regime),
                weights.liab_weight(regime),
            )?;
            trace!(slot, ?regime, contribution = %contribution, "Derivative health");
            total += contribution;
        }

        Ok(total)
    }

    /// Quote borrows plus weighted non-quote borrows, in native quote
    pub fn liabilities_value(&self, account: &Account, regime: WeightRegime) -> Result<FixedPointValue, ValuationError> {
        let mut total = self.native_borrow(account, QUOTE_INDEX);
        for slot in 0..MAX_PAIRS {
            let borrow = self.native_borrow(account, slot);
            if borrow.is_zero() {
                continue;
            }
            let price = pricing::required_price(self.cache, slot)?;
            total += borrow * price * self.spot_weights(slot).liab_weight(regime);
        }
        Ok(total)
    }

    /// Quote deposits plus weighted non-quote deposits and margined
    /// resting-order totals, in native quote
    pub fn assets_value(&self, account: &Account, regime: WeightRegime) -> Result<FixedPointValue, ValuationError> {
        let mut total = self.native_deposit(account, QUOTE_INDEX);
        for slot in 0..MAX_PAIRS {
            let deposit = self.native_deposit(account, slot);
            let orders = self.margined_book(account, slot);
            if deposit.is_zero() && orders.is_none() {
                continue;
            }
            let price = pricing::required_price(self.cache, slot)?;
            let asset_weight = self.spot_weights(slot).asset_weight(regime);

            total += deposit * price * asset_weight;
            if let Some(orders) = orders {
                total += orders.total_base() * price * asset_weight + orders.total_quote();
            }
        }
        Ok(total)
    }

    /// `max(0, health / liabilities * 100)`, or 100 without liabilities.
    pub fn health_ratio(&self, account: &Account, regime: WeightRegime) -> Result<f64, ValuationError> {
        let liabilities = self.liabilities_value(account, regime)?;
        if !liabilities.is_positive() {
            return Ok(NO_LIABILITIES_RATIO);
        }
        let health = self.health(account, regime)?;
        let ratio = health / liabilities * FixedPointValue::from_integer(100);
        Ok(ratio.max(FixedPointValue::ZERO).to_approximate_float())
    }

    // ── Equity ───────────────────────────────────────────────────────────

    /// Face value of all token balances and margined resting orders, in
    /// native quote. Derivative positions are not included.
    pub fn net_equity(&self, account: &Account) -> Result<FixedPointValue, ValuationError> {
        let mut total = self.net_balance(account, QUOTE_INDEX);
        for slot in 0..MAX_PAIRS {
            let net = self.net_balance(account, slot);
            let orders = self.margined_book(account, slot);
            if net.is_zero() && orders.is_none() {
                continue;
            }
            let price = pricing::required_price(self.cache, slot)?;

            total += net * price;
            if let Some(orders) = orders {
                total += orders.total_base() * price + orders.total_quote();
            }
        }
        Ok(total)
    }

    /// `net_equity / 10^quote_decimals`
    pub fn ui_net_equity(&self, account: &Account) -> Result<FixedPointValue, ValuationError> {
        let decimals = pricing::decimals_of(self.group, QUOTE_INDEX)?;
        Ok(pricing::native_to_ui(self.net_equity(account)?, decimals))
    }

    /// Unweighted `liabilities / (assets - liabilities)`; zero without
    /// liabilities or without positive equity.
    pub fn leverage(&self, account: &Account) -> Result<FixedPointValue, ValuationError> {
        let liabilities = self.liabilities_value(account, WeightRegime::Unweighted)?;
        if !liabilities.is_positive() {
            return Ok(FixedPointValue::ZERO);
        }
        let equity = self.assets_value(account, WeightRegime::Unweighted)? - liabilities;
        if !equity.is_positive() {
            return Ok(FixedPointValue::ZERO);
        }
        Ok(liabilities / equity)
    }

    // ── Reporting ────────────────────────────────────────────────────────

    /// Dashboard summary of one account.
    ///
    /// Logs a warning when the maintenance health ratio is below the
    /// configured level. The warning is observational only.
    pub fn summary(&self, account: &Account) -> Result<AccountSummary, ValuationError> {
        let dp = self.config.display_dp;
        let quote_decimals = pricing::decimals_of(self.group, QUOTE_INDEX)?;
        let ui = |value: FixedPointValue| pricing::native_to_ui(value, quote_decimals).to_decimal(dp);

        let maint_health = self.health(account, WeightRegime::Maintenance)?;
        let init_health = self.health(account, WeightRegime::Initiation)?;
        let maint_health_ratio = self.health_ratio(account, WeightRegime::Maintenance)?;
        let init_health_ratio = self.health_ratio(account, WeightRegime::Initiation)?;

        let summary = AccountSummary {
            account_id: account.account_id(),
            cache_updated: self.cache.last_updated(),
            maint_health: ui(maint_health)?,
            init_health: ui(init_health)?,
            maint_health_ratio,
            init_health_ratio,
            net_equity: ui(self.net_equity(account)?)?,
            assets_value: ui(self.assets_value(account, WeightRegime::Unweighted)?)?,
            liabilities_value: ui(self.liabilities_value(account, WeightRegime::Unweighted)?)?,
            leverage: self.leverage(account)?.to_decimal(dp)?,
        };

        debug!(
            account_id = %summary.account_id,
            maint_health = %summary.maint_health,
            init_health = %summary.init_health,
            maint_health_ratio,
            net_equity = %summary.net_equity,
            "Account valuation"
        );
        if maint_health_ratio < self.config.health_ratio_warning {
            warn!(
                account_id = %summary.account_id,
                maint_health_ratio,
                threshold = self.config.health_ratio_warning,
                "Maintenance health ratio below warning level"
            );
        }

        Ok(summary)
    }
}
