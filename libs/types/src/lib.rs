//! Types library for the cross-margin valuation engine
//!
//! This library provides the read models a valuation pass works on: the
//! group (asset table), the price/index cache snapshot and the account
//! snapshot, plus the fixed-point number type all arithmetic goes through.
//!
//! # Modules
//! - `ids`: Unique identifiers (AccountId, GroupId, OracleId)
//! - `numeric`: Signed 80.48 fixed-point value
//! - `pool`: Lending pool state and rate parameters
//! - `group`: Asset slots, market weights and token configuration
//! - `cache`: Oracle prices, accrual indices and funding accumulators
//! - `order`: Resting-order balances on spot books
//! - `position`: Derivative position records
//! - `account`: Account snapshot
//! - `risk`: Weight regimes and per-market weights
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod pool;
pub mod group;
pub mod cache;
pub mod order;
pub mod position;
pub mod account;
pub mod risk;
pub mod errors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::pool::*;
    pub use crate::group::*;
    pub use crate::cache::*;
    pub use crate::order::*;
    pub use crate::position::*;
    pub use crate::account::*;
    pub use crate::risk::*;
    pub use crate::errors::*;
}
