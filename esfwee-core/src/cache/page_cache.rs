//! `src/cache/page_cache.rs`
//! ============================================================================
//! # Page image cache
//!
//! Bounded async cache of fetched page bytes keyed by page URL. Pages that
//! leave the render window stay cached until evicted, so flipping back a few
//! spreads does not refetch.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use bytes::Bytes;
use moka::future::Cache;
use tracing::{debug, trace};

use crate::config::PrefetchConfig;

/// Page URL as a cheaply clonable key.
pub type PageKey = Arc<str>;

#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStatsSnapshot {
    #[expect(clippy::cast_precision_loss, reason = "Expected precision loss")]
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Clone)]
pub struct PageCache {
    inner: Cache<PageKey, Bytes>,
    stats: Arc<CacheStats>,
}

impl PageCache {
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let stats = Arc::new(CacheStats::default());
        let stats_clone = Arc::clone(&stats);

        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .eviction_listener(move |_key, _value, _cause| {
                stats_clone.record_eviction();
            })
            .build();

        Self { inner, stats }
    }

    #[must_use]
    pub fn with_config(config: &PrefetchConfig) -> Self {
        Self::new(config.cache_capacity)
    }

    pub async fn get(&self, url: &str) -> Option<Bytes> {
        let result: Option<Bytes> = self.inner.get(url).await;

        if result.is_some() {
            self.stats.record_hit();
            trace!(url, "page cache hit");
        } else {
            self.stats.record_miss();
        }

        result
    }

    pub async fn insert(&self, url: &str, bytes: Bytes) {
        debug!(url, len = bytes.len(), "caching page");
        self.inner.insert(Arc::from(url), bytes).await;
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.inner.contains_key(url)
    }

    /// Drop every cached page.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    #[must_use]
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("entries", &self.inner.entry_count())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hits_and_misses_are_counted() {
        let cache = PageCache::new(8);
        assert!(cache.get("http://e/p/1").await.is_none());

        cache.insert("http://e/p/1", Bytes::from_static(b"jpeg")).await;
        assert!(cache.contains("http://e/p/1"));
        assert_eq!(
            cache.get("http://e/p/1").await,
            Some(Bytes::from_static(b"jpeg"))
        );

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn clear_drops_entries() {
        let cache = PageCache::new(8);
        cache.insert("a", Bytes::from_static(b"1")).await;
        cache.clear();
        assert!(cache.get("a").await.is_none());
    }
}
