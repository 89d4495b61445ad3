//! # Engine Configuration
//!
//! Timeouts, cache sizes and service endpoints for the vault engine.

use crate::domain::EngineError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Vault engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deadline for each chain storage read, in milliseconds.
    pub chain_read_timeout_ms: u64,

    /// Deadline for one metadata-service fetch, in milliseconds.
    pub call_data_timeout_ms: u64,

    /// Deadline for one fee estimate, in milliseconds.
    pub fee_estimate_timeout_ms: u64,

    /// Call-data cache capacity (entries).
    pub call_data_cache_size: usize,

    /// Age after which a cached call-data entry is dropped, in seconds.
    pub call_data_max_age_secs: u64,

    /// Capacity of each block metadata cache (hash by height, timestamp by hash).
    pub block_cache_size: usize,

    /// GraphQL endpoint of the metadata service.
    pub metadata_service_url: String,

    /// Where the call-data cache is persisted. `None` keeps it in memory only.
    pub cache_path: Option<PathBuf>,

    /// First reconnect delay, in milliseconds.
    pub reconnect_initial_ms: u64,

    /// Reconnect delay ceiling, in milliseconds.
    pub reconnect_max_ms: u64,

    /// Connection attempts per read before giving up.
    pub reconnect_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chain_read_timeout_ms: 10_000,
            call_data_timeout_ms: 8_000,
            fee_estimate_timeout_ms: 5_000,
            call_data_cache_size: 1_024,
            call_data_max_age_secs: 7 * 24 * 60 * 60,
            block_cache_size: 4_096,
            metadata_service_url: "http://localhost:8080/v1/graphql".to_string(),
            cache_path: None,
            reconnect_initial_ms: 500,
            reconnect_max_ms: 30_000,
            reconnect_attempts: 5,
        }
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, EngineError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| EngineError::InvalidConfig(format!("{}={:?}", name, value))),
        Err(_) => Ok(default),
    }
}

impl EngineConfig {
    /// Create a config for testing (short timeouts, small caches).
    pub fn for_testing() -> Self {
        Self {
            chain_read_timeout_ms: 500,
            call_data_timeout_ms: 200,
            fee_estimate_timeout_ms: 200,
            call_data_cache_size: 64,
            call_data_max_age_secs: 60,
            block_cache_size: 64,
            metadata_service_url: "http://127.0.0.1:9/v1/graphql".to_string(),
            cache_path: None,
            reconnect_initial_ms: 1,
            reconnect_max_ms: 10,
            reconnect_attempts: 3,
        }
    }

    /// Defaults overridden by `VAULT_*` environment variables, then validated.
    pub fn from_env() -> Result<Self, EngineError> {
        let d = Self::default();
        let config = Self {
            chain_read_timeout_ms: env_parse("VAULT_CHAIN_READ_TIMEOUT_MS", d.chain_read_timeout_ms)?,
            call_data_timeout_ms: env_parse("VAULT_CALL_DATA_TIMEOUT_MS", d.call_data_timeout_ms)?,
            fee_estimate_timeout_ms: env_parse("VAULT_FEE_TIMEOUT_MS", d.fee_estimate_timeout_ms)?,
            call_data_cache_size: env_parse("VAULT_CALL_DATA_CACHE_SIZE", d.call_data_cache_size)?,
            call_data_max_age_secs: env_parse("VAULT_CALL_DATA_MAX_AGE_SECS", d.call_data_max_age_secs)?,
            block_cache_size: env_parse("VAULT_BLOCK_CACHE_SIZE", d.block_cache_size)?,
            metadata_service_url: env::var("VAULT_METADATA_URL").unwrap_or(d.metadata_service_url),
            cache_path: env::var_os("VAULT_CACHE_PATH").map(PathBuf::from).or(d.cache_path),
            reconnect_initial_ms: env_parse("VAULT_RECONNECT_INITIAL_MS", d.reconnect_initial_ms)?,
            reconnect_max_ms: env_parse("VAULT_RECONNECT_MAX_MS", d.reconnect_max_ms)?,
            reconnect_attempts: env_parse("VAULT_RECONNECT_ATTEMPTS", d.reconnect_attempts)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would block forever or disable caching.
    pub fn validate(&self) -> Result<(), EngineError> {
        let nonzero = [
            ("chain_read_timeout_ms", self.chain_read_timeout_ms),
            ("call_data_timeout_ms", self.call_data_timeout_ms),
            ("fee_estimate_timeout_ms", self.fee_estimate_timeout_ms),
            ("call_data_cache_size", self.call_data_cache_size as u64),
            ("block_cache_size", self.block_cache_size as u64),
            ("reconnect_attempts", self.reconnect_attempts as u64),
        ];
        for (name, value) in nonzero {
            if value == 0 {
                return Err(EngineError::InvalidConfig(format!("{} must be > 0", name)));
            }
        }
        if self.reconnect_initial_ms > self.reconnect_max_ms {
            return Err(EngineError::InvalidConfig(
                "reconnect_initial_ms exceeds reconnect_max_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Chain read deadline.
    pub fn chain_read_timeout(&self) -> Duration {
        Duration::from_millis(self.chain_read_timeout_ms)
    }

    /// Metadata fetch deadline.
    pub fn call_data_timeout(&self) -> Duration {
        Duration::from_millis(self.call_data_timeout_ms)
    }

    /// Fee estimate deadline.
    pub fn fee_estimate_timeout(&self) -> Duration {
        Duration::from_millis(self.fee_estimate_timeout_ms)
    }

    /// Cached call-data lifetime.
    pub fn call_data_max_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.call_data_max_age_secs.min(i64::MAX as u64) as i64)
    }
}
