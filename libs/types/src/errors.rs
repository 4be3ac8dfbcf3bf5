//! Error types for the valuation data model
//!
//! Comprehensive error taxonomy using thiserror. Arithmetic overflow is not
//! listed here: it panics at the operator (see `numeric`).

use thiserror::Error;

/// Group, pool or cache configuration that cannot be valued
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Slot {slot} has neither an oracle nor configured decimals")]
    UnresolvableDecimals { slot: usize },

    #[error("Slot index {slot} out of range (max {max})")]
    SlotOutOfRange { slot: usize, max: usize },

    #[error("Slot {slot} has no cached price")]
    MissingPrice { slot: usize },

    #[error("Slot {slot} has no token configured")]
    MissingToken { slot: usize },

    #[error("Invalid weights for slot {slot}: {reason}")]
    InvalidWeights { slot: usize, reason: String },

    #[error("Invalid leverage {value}: must be at least 1")]
    InvalidLeverage { value: String },

    #[error("Invalid interest rate parameters: {reason}")]
    InvalidRateParams { reason: String },

    #[error("Invalid index for slot {slot}: {value} (must be >= 1)")]
    InvalidIndex { slot: usize, value: String },

    #[error("Invalid pool {index} index {value} (must be >= 1)")]
    InvalidPoolIndex { index: &'static str, value: String },

    #[error("Invalid engine configuration: {reason}")]
    InvalidEngineConfig { reason: String },

    #[error("Malformed configuration: {0}")]
    Malformed(String),
}

/// Fixed-point parsing and conversion errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("Invalid decimal literal {input:?}: {reason}")]
    Parse { input: String, reason: String },

    #[error("Value {value} does not fit a reporting decimal")]
    DecimalRange { value: String },
}

/// Pool index maintenance errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("{index} index would decrease from {current} to {proposed}")]
    IndexDecrease {
        index: &'static str,
        current: String,
        proposed: String,
    },

    #[error("Update timestamp {proposed} precedes last update {current}")]
    StaleUpdate { current: u64, proposed: u64 },
}

/// Account snapshot errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountError {
    #[error("Negative {field} balance in slot {slot}: {value}")]
    NegativeBalance {
        field: &'static str,
        slot: usize,
        value: String,
    },

    #[error("Resting orders for slot {slot} are inconsistent: {reason}")]
    InconsistentOrders { slot: usize, reason: String },

    #[error("Slot index {slot} out of range (max {max})")]
    SlotOutOfRange { slot: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnresolvableDecimals { slot: 3 };
        assert_eq!(
            err.to_string(),
            "Slot 3 has neither an oracle nor configured decimals"
        );
    }

    #[test]
    fn test_pool_error_display() {
        let err = PoolError::IndexDecrease {
            index: "deposit",
            current: "1.2".to_string(),
            proposed: "1.1".to_string(),
        };
        assert!(err.to_string().contains("deposit"));
        assert!(err.to_string().contains("1.1"));
    }

    #[test]
    fn test_numeric_error_display() {
        let err = NumericError::Parse {
            input: "abc".to_string(),
            reason: "invalid digit".to_string(),
        };
        assert!(err.to_string().contains("\"abc\""));
    }
}
