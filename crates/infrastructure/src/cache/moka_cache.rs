//! Moka in-memory cache
//!
//! Thread-safe TTL cache used for forecasts and geocoding results.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use moka::future::Cache;
use tracing::debug;

/// Hit and miss counters of a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// Moka-based TTL cache for cloneable values
pub struct MokaCache<V> {
    name: &'static str,
    cache: Cache<String, V>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> fmt::Debug for MokaCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MokaCache")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<V> MokaCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Cache holding up to `max_entries` values for `ttl`
    #[must_use]
    pub fn new(name: &'static str, max_entries: u64, ttl: Duration) -> Self {
        Self {
            name,
            cache: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let value = self.cache.get(key).await;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(cache = self.name, key = %key, "Cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(cache = self.name, key = %key, "Cache miss");
        }
        value
    }

    pub async fn insert(&self, key: String, value: V) {
        self.cache.insert(key, value).await;
    }

    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_hits_and_misses() {
        let cache: MokaCache<String> = MokaCache::new("test", 10, Duration::from_secs(60));
        assert!(cache.get("k").await.is_none());

        cache.insert("k".into(), "v".into()).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache: MokaCache<u8> = MokaCache::new("test", 10, Duration::from_secs(60));
        cache.insert("k".into(), 1).await;
        cache.invalidate("k").await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache: MokaCache<u8> = MokaCache::new("test", 10, Duration::from_millis(20));
        cache.insert("k".into(), 1).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get("k").await.is_none());
    }
}
