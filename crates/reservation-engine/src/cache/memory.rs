use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AvailabilityCache, CacheError};

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, u32>,
    unavailable: bool,
}

/// In-memory availability cache for testing and single-node runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAvailabilityCache {
    state: Arc<RwLock<CacheState>>,
}

impl InMemoryAvailabilityCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads an entry without going through the trait, for assertions.
    pub async fn peek(&self, key: &str) -> Option<u32> {
        self.state.read().await.entries.get(key).copied()
    }

    /// Makes every call fail until switched back.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Drops all entries.
    pub async fn clear(&self) {
        self.state.write().await.entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

#[async_trait]
impl AvailabilityCache for InMemoryAvailabilityCache {
    async fn get(&self, key: &str) -> Result<Option<u32>, CacheError> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(CacheError::Unavailable("in-memory cache switched off".to_string()));
        }
        Ok(state.entries.get(key).copied())
    }

    async fn set(&self, key: &str, available: u32) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(CacheError::Unavailable("in-memory cache switched off".to_string()));
        }
        state.entries.insert(key.to_string(), available);
        Ok(())
    }
}
