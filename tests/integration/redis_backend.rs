//! Redis-backed cache tests.
//!
//! Requires a running Redis. Run with:
//! REDIS_URL=redis://127.0.0.1:6379/15 cargo test redis -- --ignored

use hf_inference_chat::cache::{CacheKey, CacheProvider, CacheStore, RedisCache};
use hf_inference_chat::config::CacheSettings;
use std::time::Duration;

fn redis_url() -> Option<String> {
    let url = std::env::var("REDIS_URL").ok().filter(|u| !u.is_empty());
    if url.is_none() {
        eprintln!("REDIS_URL not set, skipping redis integration test");
    }
    url
}

#[tokio::test]
#[ignore = "requires redis; run with: REDIS_URL=... cargo test redis -- --ignored"]
async fn provider_selects_redis_when_reachable() {
    let Some(url) = redis_url() else { return };
    let settings = CacheSettings {
        redis_url: Some(url),
        ..CacheSettings::default()
    };
    let provider = CacheProvider::connect(&settings).await;
    assert_eq!(provider.backend_name(), "redis");

    let key = CacheKey::new("hf_cache:integration-roundtrip");
    provider.set(&key, "cached via redis").await;
    assert_eq!(provider.get(&key).await.as_deref(), Some("cached via redis"));

    provider.clear().await;
    assert_eq!(provider.get(&key).await, None);
}

#[tokio::test]
#[ignore = "requires redis; run with: REDIS_URL=... cargo test redis -- --ignored"]
async fn redis_entries_expire() {
    let Some(url) = redis_url() else { return };
    let cache = RedisCache::connect(&url, Duration::from_secs(2)).await.unwrap();

    let key = CacheKey::new("hf_cache:integration-expiry");
    cache.set_with_expiry(&key, Duration::from_secs(1), "short lived").await;
    assert_eq!(cache.get(&key).await.as_deref(), Some("short lived"));

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(cache.get(&key).await, None);
}

#[tokio::test]
async fn unreachable_redis_falls_back_to_memory() {
    let settings = CacheSettings {
        redis_url: Some("redis://127.0.0.1:1/0".to_string()),
        redis_connect_timeout: Duration::from_millis(200),
        ..CacheSettings::default()
    };
    let provider = CacheProvider::connect(&settings).await;
    assert_eq!(provider.backend_name(), "memory");
}
