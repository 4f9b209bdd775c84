//! Redis-backed availability cache.
//!
//! Entries are plain integer strings under `{prefix}{item_id}` with no TTL;
//! every engine write overwrites them.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use super::{AvailabilityCache, CacheError};

/// Availability cache stored in Redis.
///
/// Clones share the same `ConnectionManager`, which reconnects on its own
/// after a dropped connection.
#[derive(Clone)]
pub struct RedisAvailabilityCache {
    conn_manager: ConnectionManager,
}

impl RedisAvailabilityCache {
    /// Connects to the Redis server at `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the server cannot be
    /// reached.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn_manager = ConnectionManager::new(client).await?;

        tracing::info!("RedisAvailabilityCache initialized");

        Ok(Self { conn_manager })
    }
}

#[async_trait]
impl AvailabilityCache for RedisAvailabilityCache {
    async fn get(&self, key: &str) -> Result<Option<u32>, CacheError> {
        let mut conn = self.conn_manager.clone();
        let value: Option<u32> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, available: u32) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn.set(key, available).await?;
        Ok(())
    }
}
