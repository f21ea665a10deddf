//! # Data-Exchange Telemetry
//!
//! Logging initialisation and environment-driven configuration.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dx_telemetry::{init_logging, ExchangeConfig, TelemetryConfig};
//!
//! fn main() {
//!     init_logging(&TelemetryConfig::from_env()).expect("logging");
//!     let config = ExchangeConfig::from_env();
//!     config.validate().expect("config");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DX_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `DX_JSON_LOGS` | `false` | JSON log lines |
//! | `DX_MIN_AUDIT_BUDGET` | `0` | Audit budget floor for new orders |
//! | `DX_CHALLENGE_PERIOD_SECS` | `3600` | Batch challenge window |
//! | `DX_CHALLENGE_BOND` | `10` | Payer and challenger bond |
//! | `DX_MAX_BATCH_LEAVES` | `65536` | Leaf limit per batch |
//! | `DX_TOKEN_DECIMALS` | `9` | Token decimal places |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::{ConfigError, ExchangeConfig, TelemetryConfig};
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log level string is not a valid filter.
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber was already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}
