//! Risk Engine Service
//!
//! Cross-margin valuation over a group, a price/index cache snapshot and
//! an account snapshot:
//! - pricing: decimal scaling between native and quote units
//! - interest: utilization curve for deposit and borrow rates
//! - health: per-slot spot health formulas
//! - engine: health, liabilities, health ratio, net equity
//!
//! Derivative positions are valued by an external `DerivativeValuator`.
//! Nothing here performs I/O or keeps state between calls.

pub mod config;
pub mod engine;
pub mod error;
pub mod health;
pub mod interest;
pub mod pricing;
pub mod report;
pub mod valuator;

pub use config::EngineConfig;
pub use engine::ValuationEngine;
pub use error::ValuationError;
pub use report::{AccountSummary, PoolSummary};
pub use valuator::DerivativeValuator;
