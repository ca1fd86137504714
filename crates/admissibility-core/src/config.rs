//! Adjudication configuration.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default reimbursement cap for consultation charges.
pub const DEFAULT_CONSULTATION_CAP: Decimal = Decimal::from_parts(300, 0, 0, false, 0);

/// Default currency symbol used in reason texts.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Environment variable overriding the consultation cap.
pub const ENV_CONSULTATION_CAP: &str = "ADMISSIBILITY_CONSULTATION_CAP";

/// Environment variable overriding the currency symbol.
pub const ENV_CURRENCY_SYMBOL: &str = "ADMISSIBILITY_CURRENCY_SYMBOL";

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid consultation cap: {0}")]
    InvalidCap(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Business constants applied during adjudication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjudicationConfig {
    /// Maximum admissible amount for a single consultation charge
    pub consultation_cap: Decimal,
    /// Prefix for amounts in reason texts; empty to leave currency to the presenter
    pub currency_symbol: String,
}

impl Default for AdjudicationConfig {
    fn default() -> Self {
        Self {
            consultation_cap: DEFAULT_CONSULTATION_CAP,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

impl AdjudicationConfig {
    /// Create a configuration with a custom consultation cap.
    pub fn with_cap(consultation_cap: Decimal) -> ConfigResult<Self> {
        Ok(Self {
            consultation_cap: validate_cap(consultation_cap)?,
            ..Self::default()
        })
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CONSULTATION_CAP) {
            let cap = Decimal::from_str(raw.trim())
                .map_err(|_| ConfigError::InvalidCap(raw.clone()))?;
            config.consultation_cap = validate_cap(cap)?;
        }

        if let Some(symbol) = lookup(ENV_CURRENCY_SYMBOL) {
            config.currency_symbol = symbol;
        }

        Ok(config)
    }
}

fn validate_cap(cap: Decimal) -> ConfigResult<Decimal> {
    if cap < Decimal::ZERO {
        return Err(ConfigError::InvalidCap(cap.to_string()));
    }
    Ok(cap)
}
