//! TTL cache with single-flight compute.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::CacheComputeError;
use crate::stores::MemoryCacheStore;
use crate::traits::store::{CacheEntry, CacheStore};

/// A compute shared by every request that arrives while it runs.
type Flight<V, E> = Shared<BoxFuture<'static, Result<V, Arc<E>>>>;

type FlightMap<V, E> = Arc<Mutex<HashMap<String, Flight<V, E>>>>;

/// Keyed cache with expiry and at most one in-flight compute per key.
///
/// The registration lock guards both the store lookup and the in-flight
/// map, so "check entry, else join or start a compute" is atomic. A
/// finishing compute stores its value and deregisters under the same
/// lock. The compute itself runs outside the lock, on its own task: a
/// dropped caller stops waiting but never stops the compute.
///
/// # Example
///
/// ```rust,ignore
/// let cache: TtlCache<Extraction, FetchError> = TtlCache::new();
/// let records = cache
///     .get_or_compute("mcp-so:feed", Duration::from_secs(3600), || async move {
///         let html = fetcher.fetch(&url, &strategy).await?;
///         Ok(extract(&html, &schema, &base))
///     })
///     .await?;
/// ```
pub struct TtlCache<V, E, S = MemoryCacheStore<V>> {
    store: Arc<S>,
    inflight: FlightMap<V, E>,
    clock: Arc<dyn Clock>,
}

impl<V, E> TtlCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a cache backed by an in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryCacheStore::new())
    }
}

impl<V, E> Default for TtlCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E, S> TtlCache<V, E, S>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
    S: CacheStore<V> + 'static,
{
    /// Create a cache over a custom store.
    pub fn with_store(store: S) -> Self {
        Self {
            store: Arc::new(store),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Access the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of computes currently running.
    pub async fn in_flight(&self) -> usize {
        self.inflight.lock().await.len()
    }

    /// Return the cached value for `key`, computing it if absent or expired.
    ///
    /// A valid entry is returned without side effects. Otherwise the
    /// request joins the compute already running for `key`, or starts one.
    /// Failures are shared with every waiter and are not stored.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<V, CacheComputeError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let flight = {
            let mut inflight = self.inflight.lock().await;

            if let Some(entry) = self.store.get(key).await {
                if entry.is_valid_at(self.clock.now()) {
                    debug!(key = %key, expires_at = %entry.expires_at, "Cache hit");
                    return Ok(entry.value);
                }
                debug!(key = %key, "Cache entry expired");
            }

            match inflight.get(key) {
                Some(flight) => {
                    debug!(key = %key, "Joining in-flight compute");
                    flight.clone()
                }
                None => {
                    debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache miss, computing");
                    let flight = self.start_flight(key, ttl, compute());
                    inflight.insert(key.to_string(), flight.clone());
                    flight
                }
            }
        };

        flight.await.map_err(CacheComputeError::new)
    }

    fn start_flight<Fut>(&self, key: &str, ttl: Duration, compute: Fut) -> Flight<V, E>
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let inflight = Arc::clone(&self.inflight);
        let clock = Arc::clone(&self.clock);
        let key = key.to_string();
        let registry = Arc::clone(&self.inflight);
        let registered = key.clone();

        // Spawned so the compute finishes, deregisters and releases its
        // resources even if every waiter is dropped.
        let task = tokio::spawn(async move {
            let result = compute.await;

            let mut inflight = inflight.lock().await;
            inflight.remove(&key);

            match result {
                Ok(value) => {
                    let expires_at = expiry(clock.now(), ttl);
                    store
                        .put(CacheEntry::new(key, value.clone(), expires_at))
                        .await;
                    Ok(value)
                }
                Err(e) => {
                    warn!(key = %key, "Cache compute failed, nothing stored");
                    Err(Arc::new(e))
                }
            }
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => match e.try_into_panic() {
                    Ok(payload) => {
                        registry.lock().await.remove(&registered);
                        std::panic::resume_unwind(payload)
                    }
                    // Runtime shutting down; waiters are dropped with it.
                    Err(_) => futures::future::pending().await,
                },
            }
        }
        .boxed()
        .shared()
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Boom(&'static str);

    fn counting(
        calls: &Arc<AtomicUsize>,
        value: &'static str,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<String, Boom>> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(value.to_string())
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_second_call_before_expiry_is_cached() {
        let cache: TtlCache<String, Boom> = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        let first = cache.get_or_compute("k", ttl, counting(&calls, "one")).await.unwrap();
        let second = cache.get_or_compute("k", ttl, counting(&calls, "two")).await.unwrap();

        assert_eq!(first, "one");
        assert_eq!(second, "one");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.in_flight().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_compute() {
        let cache: Arc<TtlCache<String, Boom>> = Arc::new(TtlCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = Arc::clone(&cache);
            let compute = counting(&calls, if i == 0 { "leader" } else { "follower" });
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("shared", Duration::from_secs(60), compute)
                    .await
            }));
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_expired_entry_recomputes_once() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache: TtlCache<String, Boom> = TtlCache::new().with_clock(clock.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(30);

        cache.get_or_compute("k", ttl, counting(&calls, "old")).await.unwrap();
        clock.advance(chrono::Duration::seconds(29));
        let still = cache.get_or_compute("k", ttl, counting(&calls, "new")).await.unwrap();
        assert_eq!(still, "old");

        clock.advance(chrono::Duration::seconds(1));
        let fresh = cache.get_or_compute("k", ttl, counting(&calls, "new")).await.unwrap();
        let again = cache.get_or_compute("k", ttl, counting(&calls, "newer")).await.unwrap();

        assert_eq!(fresh, "new");
        assert_eq!(again, "new");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_not_stored() {
        let cache: Arc<TtlCache<String, Boom>> = Arc::new(TtlCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = |calls: Arc<AtomicUsize>| {
            move || {
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err::<String, _>(Boom("origin down"))
                }
                .boxed()
            }
        };

        let a = {
            let cache = Arc::clone(&cache);
            let compute = failing(Arc::clone(&calls));
            tokio::spawn(async move { cache.get_or_compute("k", Duration::from_secs(60), compute).await })
        };
        let b = {
            let cache = Arc::clone(&cache);
            let compute = failing(Arc::clone(&calls));
            tokio::spawn(async move { cache.get_or_compute("k", Duration::from_secs(60), compute).await })
        };

        let a = a.await.unwrap().unwrap_err();
        let b = b.await.unwrap().unwrap_err();
        assert_eq!(a.inner(), &Boom("origin down"));
        assert_eq!(b.inner(), &Boom("origin down"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.store().len().await, 0);

        let recovered = cache
            .get_or_compute("k", Duration::from_secs(60), counting(&calls, "back"))
            .await
            .unwrap();
        assert_eq!(recovered, "back");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache: TtlCache<String, Boom> = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        let a = cache.get_or_compute("a", ttl, counting(&calls, "A")).await.unwrap();
        let b = cache.get_or_compute("b", ttl, counting(&calls, "B")).await.unwrap();

        assert_eq!((a.as_str(), b.as_str()), ("A", "B"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.store().len().await, 2);
    }

    #[tokio::test]
    async fn test_dropped_leader_compute_still_completes() {
        let cache: TtlCache<String, Boom> = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        // Leader gives up long before the 20ms compute finishes.
        let abandoned = tokio::time::timeout(
            Duration::from_millis(5),
            cache.get_or_compute("k", ttl, counting(&calls, "kept")),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(cache.in_flight().await, 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.in_flight().await, 0);
        assert_eq!(cache.store().len().await, 1);

        let value = cache.get_or_compute("k", ttl, counting(&calls, "again")).await.unwrap();
        assert_eq!(value, "kept");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_expiry_saturates() {
        let now = Utc::now();
        assert_eq!(expiry(now, Duration::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(expiry(now, Duration::from_secs(1)), now + chrono::Duration::seconds(1));
    }
}
