//! Configuration from environment variables.

use serde::{Deserialize, Serialize};
use shared_types::Amount;
use std::env;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// LOGGING
// =============================================================================

/// Configuration for the logging stack.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "data-exchange".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DX_SERVICE_NAME`: Service name (default: data-exchange)
    /// - `DX_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `DX_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            service_name: lookup("DX_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("DX_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("DX_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),
        }
    }
}

// =============================================================================
// EXCHANGE
// =============================================================================

/// Runtime parameters of the exchange and the batch ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Floor for the initial audit budget of new orders.
    pub minimum_audit_budget: Amount,

    /// Length of a batch's challenge window.
    pub challenge_period_secs: u64,

    /// Bond posted by a payer per batch and by each challenger.
    pub challenge_bond: Amount,

    /// Upper bound on leaves in one batch.
    pub max_batch_leaves: u64,

    /// Decimal places of the settlement token.
    pub token_decimals: u8,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            minimum_audit_budget: 0,
            challenge_period_secs: 3600,
            challenge_bond: 10,
            max_batch_leaves: 65_536,
            token_decimals: 9,
        }
    }
}

impl ExchangeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DX_MIN_AUDIT_BUDGET` (default: 0)
    /// - `DX_CHALLENGE_PERIOD_SECS` (default: 3600)
    /// - `DX_CHALLENGE_BOND` (default: 10)
    /// - `DX_MAX_BATCH_LEAVES` (default: 65536)
    /// - `DX_TOKEN_DECIMALS` (default: 9)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            minimum_audit_budget: parse_or(&lookup, "DX_MIN_AUDIT_BUDGET", defaults.minimum_audit_budget),
            challenge_period_secs: parse_or(
                &lookup,
                "DX_CHALLENGE_PERIOD_SECS",
                defaults.challenge_period_secs,
            ),
            challenge_bond: parse_or(&lookup, "DX_CHALLENGE_BOND", defaults.challenge_bond),
            max_batch_leaves: parse_or(&lookup, "DX_MAX_BATCH_LEAVES", defaults.max_batch_leaves),
            token_decimals: parse_or(&lookup, "DX_TOKEN_DECIMALS", defaults.token_decimals),
        }
    }

    /// Reject values the ledger cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.challenge_period_secs == 0 {
            return Err(ConfigError::Invalid(
                "challenge_period_secs must be positive".to_string(),
            ));
        }
        if self.max_batch_leaves == 0 {
            return Err(ConfigError::Invalid(
                "max_batch_leaves must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// One whole token in base units.
    pub fn one_token(&self) -> Amount {
        10u128.saturating_pow(u32::from(self.token_decimals))
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
