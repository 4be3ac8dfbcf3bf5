//! Derivative valuator contract
//!
//! Position sizing, funding settlement and realized PnL of derivative
//! positions live outside this crate. The engine calls the valuator once
//! per configured derivative market and adds the returned contribution to
//! health unchanged.

use types::group::PerpMarketConfig;
use types::numeric::FixedPointValue;
use types::position::PerpPosition;

pub trait DerivativeValuator {
    /// Signed health contribution of one derivative position, in native
    /// quote.
    ///
    /// `price` is the oracle price already normalized for the decimal
    /// difference between base and quote.
    #[allow(clippy::too_many_arguments)]
    fn valuate(
        &self,
        position: &PerpPosition,
        market: &PerpMarketConfig,
        price: FixedPointValue,
        asset_weight: FixedPointValue,
        liab_weight: FixedPointValue,
        long_funding: FixedPointValue,
        short_funding: FixedPointValue,
    ) -> FixedPointValue;
}
