//! Response caching with an in-process store and a Redis store behind one trait.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheStore`] | Backend contract: get, set with expiry, clear |
//! | [`MemoryCache`] | Bounded in-process store, per-entry TTL, FIFO eviction |
//! | [`RedisCache`] | Redis adapter using `GET` / `SETEX` / `FLUSHALL` |
//! | [`CacheProvider`] | Picks Redis or memory once at startup; counts hits and misses |
//! | [`CacheKeyGenerator`] | Deterministic keys from prompt, trailing context and parameters |
//!
//! ## Example
//!
//! ```rust
//! use hf_inference_chat::cache::{CacheKeyGenerator, CacheProvider};
//! use hf_inference_chat::types::GenerationParams;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let provider = CacheProvider::memory(1000, Duration::from_secs(3600));
//! let key = CacheKeyGenerator::default().generate("Hello", &[], &GenerationParams::default());
//!
//! provider.set(&key, "Hi there!").await;
//! assert_eq!(provider.get(&key).await.as_deref(), Some("Hi there!"));
//! # });
//! ```
//!
//! Backend failures never surface to callers: a failed read is a miss and a
//! failed write is dropped after logging.

mod backend;
mod key;
mod provider;
mod redis;

pub use backend::{CacheStore, MemoryCache};
pub use key::{CacheKey, CacheKeyGenerator};
pub use provider::{CacheProvider, CacheStats};
pub use self::redis::RedisCache;
