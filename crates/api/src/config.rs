//! Application configuration loaded from environment variables.

use reservation_engine::EngineConfig;
use reservation_engine::config::{DEFAULT_CACHE_KEY_PREFIX, DEFAULT_MAX_ATTEMPTS};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; unset selects the in-memory store
/// - `REDIS_URL`: Redis URL; unset selects the in-memory cache
/// - `RESERVE_MAX_ATTEMPTS`: reservation retry ceiling (default: `3`)
/// - `CACHE_KEY_PREFIX`: availability key prefix (default: `"inventory_availability:"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub reserve_max_attempts: u32,
    pub cache_key_prefix: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            redis_url: lookup("REDIS_URL").filter(|url| !url.is_empty()),
            reserve_max_attempts: lookup("RESERVE_MAX_ATTEMPTS")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.reserve_max_attempts),
            cache_key_prefix: lookup("CACHE_KEY_PREFIX").unwrap_or(defaults.cache_key_prefix),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the engine settings carried by this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_max_attempts(self.reserve_max_attempts)
            .with_cache_key_prefix(self.cache_key_prefix.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            redis_url: None,
            reserve_max_attempts: DEFAULT_MAX_ATTEMPTS,
            cache_key_prefix: DEFAULT_CACHE_KEY_PREFIX.to_string(),
        }
    }
}
