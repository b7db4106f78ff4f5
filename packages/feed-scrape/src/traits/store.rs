//! Storage trait for cached values.
//!
//! The TTL cache keeps its entries behind `CacheStore` so the backing
//! store can be swapped without touching single-flight coordination.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A cached value with its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Cache key (one per content source)
    pub key: String,

    /// Stored value
    pub value: V,

    /// Instant after which the entry is stale
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Create a new entry.
    pub fn new(key: impl Into<String>, value: V, expires_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value,
            expires_at,
        }
    }

    /// Check if the entry is still valid at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Keyed store for cache entries.
///
/// Stores never expire entries on their own; validity is decided by the
/// cache using `CacheEntry::is_valid_at`.
#[async_trait]
pub trait CacheStore<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Get an entry by key, valid or not.
    async fn get(&self, key: &str) -> Option<CacheEntry<V>>;

    /// Insert or replace an entry.
    async fn put(&self, entry: CacheEntry<V>);

    /// Remove an entry. Returns true if one was present.
    async fn invalidate(&self, key: &str) -> bool;

    /// Number of stored entries.
    async fn len(&self) -> usize;
}
