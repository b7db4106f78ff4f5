//! In-memory cache store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::traits::store::{CacheEntry, CacheStore};

/// In-memory storage for cache entries.
///
/// Created once at process start and held by the cache for the life of
/// the process. Contents are lost on restart.
pub struct MemoryCacheStore<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for MemoryCacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryCacheStore<V> {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Clear all stored entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl<V> CacheStore<V> for MemoryCacheStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, entry: CacheEntry<V>) {
        self.entries.write().await.insert(entry.key.clone(), entry);
    }

    async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
