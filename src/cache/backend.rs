//! Cache store contract and the in-process bounded implementation.

use super::key::CacheKey;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Capability contract every cache backend implements.
///
/// None of the operations can fail from the caller's point of view: a backend that
/// hits an internal error reports a miss on read and silently drops writes.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<String>;
    async fn set_with_expiry(&self, key: &CacheKey, ttl: Duration, value: &str);
    async fn clear(&self);
    fn name(&self) -> &'static str;
}

struct CacheEntry {
    value: String,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Bounded in-process cache with per-entry TTL.
///
/// Eviction is FIFO by insertion time: reads use `peek` and never promote an
/// entry, so the entry evicted under capacity pressure is always the one that
/// was (re)inserted longest ago. One mutex guards the whole store.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    default_ttl: Duration,
}

impl MemoryCache {
    pub const DEFAULT_CAPACITY: usize = 1000;
    pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

    pub fn new(max_entries: usize) -> Self {
        Self::with_ttl(max_entries, Self::DEFAULT_TTL)
    }

    pub fn with_ttl(max_entries: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            default_ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Raw entry count; expired entries still count until they are next read.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<String> {
        let mut entries = self.lock();
        let expired = match entries.peek(key.as_str()) {
            Some(entry) if !entry.is_expired() => {
                tracing::debug!(key = %key, "memory cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key.as_str());
            tracing::debug!(key = %key, "memory cache entry expired");
        }
        None
    }

    async fn set_with_expiry(&self, key: &CacheKey, ttl: Duration, value: &str) {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let mut entries = self.lock();
        // Re-inserting an existing key moves it to the newest position.
        if entries.contains(key.as_str()) {
            entries.pop(key.as_str());
        }
        let entry = CacheEntry::new(value.to_string(), ttl);
        let evicted = entries.push(key.as_str().to_string(), entry);
        if let Some((old_key, _)) = evicted {
            tracing::debug!(evicted = %old_key, "memory cache full, removed oldest entry");
        }
        tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "memory cache set");
    }

    async fn clear(&self) {
        self.lock().clear();
        tracing::info!("memory cache cleared");
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
