//! Engine configuration
//!
//! Only affects reporting and observability. Valuation results never depend
//! on these values.

use serde::{Deserialize, Serialize};
use types::errors::ConfigError;

/// Largest scale a reporting `Decimal` is rounded to
pub const MAX_DISPLAY_DP: u32 = 18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Decimal places kept in summaries
    pub display_dp: u32,
    /// Maintenance health ratio (percent) below which a warning is logged
    pub health_ratio_warning: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display_dp: 8,
            health_ratio_warning: 110.0,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display_dp > MAX_DISPLAY_DP {
            return Err(ConfigError::InvalidEngineConfig {
                reason: format!("display_dp {} exceeds {}", self.display_dp, MAX_DISPLAY_DP),
            });
        }
        if !self.health_ratio_warning.is_finite() || self.health_ratio_warning < 0.0 {
            return Err(ConfigError::InvalidEngineConfig {
                reason: format!(
                    "health_ratio_warning must be a non-negative number, got {}",
                    self.health_ratio_warning
                ),
            });
        }
        Ok(())
    }
}
