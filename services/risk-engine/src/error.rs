//! Engine error type

use thiserror::Error;
use types::errors::{AccountError, ConfigError, NumericError};

/// Any failure surfaced by a valuation call. Never retried internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValuationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Numeric(#[from] NumericError),

    #[error(transparent)]
    Account(#[from] AccountError),
}
