//! Backend selection and the cache facade used by the generator.

use super::backend::{CacheStore, MemoryCache};
use super::key::CacheKey;
use super::redis::RedisCache;
use crate::config::CacheSettings;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
        }
    }
}

/// Owns the active [`CacheStore`] for one client.
///
/// The backend is chosen once, in [`CacheProvider::connect`], and never
/// re-evaluated: a process that started on the memory fallback stays there even
/// if Redis comes up later, and vice versa.
pub struct CacheProvider {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
    stats: AtomicStats,
}

impl CacheProvider {
    /// Probe Redis and fall back to the bounded memory cache if it is unreachable
    /// or not configured.
    pub async fn connect(settings: &CacheSettings) -> Self {
        let Some(url) = settings.redis_url.as_deref() else {
            tracing::info!("redis not configured, using in-memory cache");
            return Self::memory(settings.max_entries, settings.ttl);
        };

        match RedisCache::connect(url, settings.redis_connect_timeout).await {
            Ok(redis) => {
                tracing::info!(url, "redis connection established");
                Self::with_store(Arc::new(redis), settings.ttl)
            }
            Err(e) => {
                tracing::warn!(
                    url,
                    error = %e,
                    "redis connection failed, falling back to in-memory cache"
                );
                Self::memory(settings.max_entries, settings.ttl)
            }
        }
    }

    pub fn memory(max_entries: usize, ttl: Duration) -> Self {
        Self::with_store(Arc::new(MemoryCache::with_ttl(max_entries, ttl)), ttl)
    }

    pub fn with_store(store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self {
            store,
            default_ttl,
            stats: AtomicStats::default(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        let value = self.store.get(key).await;
        let counter = if value.is_some() {
            &self.stats.hits
        } else {
            &self.stats.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Store `value` under `key` with the provider's default TTL.
    pub async fn set(&self, key: &CacheKey, value: &str) {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    pub async fn set_with_ttl(&self, key: &CacheKey, value: &str, ttl: Duration) {
        self.store.set_with_expiry(key, ttl, value).await;
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            key = %key,
            backend = self.backend_name(),
            size = value.len(),
            "saved response to cache"
        );
    }

    pub async fn clear(&self) {
        self.store.clear().await;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }
}
