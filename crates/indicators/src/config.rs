use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::ConfigError;

/// Largest accepted Bollinger multiplier.
pub const MAX_BOLLINGER_K: Decimal = Decimal::ONE_THOUSAND;

/// Window parameters for a full indicator run.
///
/// Every field has a default, so a TOML file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub atr_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub sma_periods: BTreeSet<usize>,
    pub bollinger_period: usize,
    /// Number of standard deviations between the middle band and each outer band.
    pub bollinger_k: Decimal,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            atr_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            sma_periods: BTreeSet::from([5, 10, 20, 30]),
            bollinger_period: 20,
            bollinger_k: Decimal::TWO,
        }
    }
}

impl IndicatorConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, period) in [
            ("rsi_period", self.rsi_period),
            ("atr_period", self.atr_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("bollinger_period", self.bollinger_period),
        ] {
            if period == 0 {
                return Err(ConfigError::NonPositivePeriod { field });
            }
        }
        if self.sma_periods.contains(&0) {
            return Err(ConfigError::NonPositivePeriod {
                field: "sma_periods",
            });
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::FastNotBelowSlow {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        // Sample standard deviation needs two observations.
        if self.bollinger_period < 2 {
            return Err(ConfigError::PeriodTooShort {
                field: "bollinger_period",
                period: self.bollinger_period,
                minimum: 2,
            });
        }
        if self.bollinger_k <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveMultiplier(self.bollinger_k));
        }
        if self.bollinger_k > MAX_BOLLINGER_K {
            return Err(ConfigError::MultiplierTooLarge {
                value: self.bollinger_k,
                maximum: MAX_BOLLINGER_K,
            });
        }
        Ok(())
    }
}
