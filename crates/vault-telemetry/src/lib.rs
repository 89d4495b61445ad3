//! # Vault Telemetry
//!
//! Structured logging for the multisig vault engine.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vault_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config).expect("logging");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VAULT_SERVICE_NAME` | `vault-engine` | Service name attached to startup log |
//! | `VAULT_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `VAULT_JSON_LOGS` | `false` | Emit JSON lines instead of human output |
//! | `VAULT_LOG_ANSI` | `true` | Colourise human output |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

#[doc(hidden)]
pub use tracing;

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber is already installed.
    #[error("Failed to install log subscriber: {0}")]
    SubscriberInit(String),

    /// Log filter directive did not parse.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
