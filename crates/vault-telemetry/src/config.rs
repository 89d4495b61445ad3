//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name reported at startup.
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error, or directives).
    pub log_level: String,

    /// Emit JSON lines.
    pub json_logs: bool,

    /// Colourise human-readable output.
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "vault-engine".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("VAULT_SERVICE_NAME")
                .unwrap_or_else(|_| "vault-engine".to_string()),

            log_level: env::var("VAULT_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("VAULT_JSON_LOGS").map(|v| flag(&v)).unwrap_or(false),

            ansi: env::var("VAULT_LOG_ANSI").map(|v| !v.eq_ignore_ascii_case("false") && v != "0").unwrap_or(true),
        }
    }

    /// Quiet configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            service_name: "vault-tests".to_string(),
            log_level: "warn".to_string(),
            json_logs: false,
            ansi: false,
        }
    }
}
