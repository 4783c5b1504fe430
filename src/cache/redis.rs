//! Redis-backed cache store.

use super::backend::CacheStore;
use super::key::CacheKey;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Duration;

/// Thin adapter over a Redis server; expiry is delegated to `SETEX`.
///
/// Holds one multiplexed connection that is cloned per command, so concurrent
/// requests share a single socket without a lock on our side.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// Open a connection to `url` and verify it with `PING`, all within `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            Error::cache_with_context(
                format!("invalid Redis URL: {e}"),
                ErrorContext::new().with_field_path("REDIS_URL"),
            )
        })?;

        let probe = async {
            let conn = client.get_multiplexed_async_connection().await?;
            let cache = Self { conn };
            cache.ping().await?;
            Ok::<_, Error>(cache)
        };

        match tokio::time::timeout(timeout, probe).await {
            Ok(result) => result,
            Err(_) => Err(Error::cache_with_context(
                "connection timed out",
                ErrorContext::new()
                    .with_source("redis_cache")
                    .with_details(format!("{}ms", timeout.as_millis())),
            )),
        }
    }

    /// Liveness probe.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::debug!(reply = %pong, "redis ping");
        Ok(())
    }

    async fn try_get(&self, key: &CacheKey) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key.as_str())
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn try_set(&self, key: &CacheKey, ttl: Duration, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero expiry.
        let secs = ttl.as_secs().max(1);
        redis::cmd("SETEX")
            .arg(key.as_str())
            .arg(secs)
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn try_flush(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("FLUSHALL").query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &CacheKey) -> Option<String> {
        match self.try_get(key).await {
            Ok(Some(value)) => {
                tracing::debug!(key = %key, "redis cache hit");
                Some(value)
            }
            Ok(None) => {
                tracing::debug!(key = %key, "redis cache miss");
                None
            }
            Err(e) => {
                tracing::error!(key = %key, error = %e, "redis get failed");
                None
            }
        }
    }

    async fn set_with_expiry(&self, key: &CacheKey, ttl: Duration, value: &str) {
        match self.try_set(key, ttl, value).await {
            Ok(()) => tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "redis cache set"),
            Err(e) => tracing::error!(key = %key, error = %e, "redis setex failed"),
        }
    }

    async fn clear(&self) {
        match self.try_flush().await {
            Ok(()) => tracing::info!("redis cache cleared"),
            Err(e) => tracing::error!(error = %e, "redis flushall failed"),
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
