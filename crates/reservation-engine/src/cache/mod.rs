//! Derived availability cache.
//!
//! The cache holds the last known available quantity per item. It is never
//! authoritative: the engine treats any failure as a miss and keeps going.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryAvailabilityCache;
pub use self::redis::RedisAvailabilityCache;

/// Errors raised by a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend cannot be reached.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Redis returned an error.
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Key-value cache of available quantities.
///
/// Writes are last-writer-wins with no locking. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait AvailabilityCache: Send + Sync {
    /// Returns the cached value for `key`, or None on a miss.
    async fn get(&self, key: &str) -> Result<Option<u32>, CacheError>;

    /// Overwrites the value for `key`.
    async fn set(&self, key: &str, available: u32) -> Result<(), CacheError>;
}
