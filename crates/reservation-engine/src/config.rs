//! Engine configuration.

/// Default number of attempts a reservation gets before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default namespace for availability cache keys.
pub const DEFAULT_CACHE_KEY_PREFIX: &str = "inventory_availability:";

/// Tunables for the reservation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Attempts allowed per reserve or cancel call. Values below 1 are
    /// treated as 1.
    pub max_attempts: u32,

    /// Prefix prepended to the item id to form the cache key.
    pub cache_key_prefix: String,
}

impl EngineConfig {
    /// Sets the retry ceiling.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the cache key prefix.
    pub fn with_cache_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_key_prefix = prefix.into();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cache_key_prefix: DEFAULT_CACHE_KEY_PREFIX.to_string(),
        }
    }
}
