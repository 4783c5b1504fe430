//! # hf-inference-chat
//!
//! Chat runtime over a Hugging Face text-generation endpoint, with response
//! caching and incremental streaming.
//!
//! ## Overview
//!
//! A prompt plus the trailing conversation window and the generation parameters
//! map to one deterministic cache key. A cache hit is replayed character by
//! character so it looks like a live generation; a miss is streamed from the
//! endpoint, forwarded as it arrives, and cached once complete.
//!
//! ## Key Features
//!
//! - **Unified Client**: [`InferenceClient`] is the single entry point for streaming and blocking calls
//! - **Caching**: Redis when reachable at startup, otherwise a bounded in-process TTL cache
//! - **Streaming Pipeline**: Tolerant line decoder for both `generated_text` and `token` chunk shapes
//! - **Token Accounting**: Per-call usage deltas through a pluggable [`tokens::UsageSink`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use hf_inference_chat::{GenerationParams, InferenceClientBuilder, Message, Settings};
//!
//! #[tokio::main]
//! async fn main() -> hf_inference_chat::Result<()> {
//!     let client = InferenceClientBuilder::new(Settings::from_env()).build().await?;
//!
//!     let history = vec![Message::user("Hi"), Message::assistant("Hello!")];
//!     let mut stream = client.generate_stream("Write a haiku", &history, &GenerationParams::default());
//!     while let Some(fragment) = stream.next().await {
//!         print!("{fragment}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Inference client and builder |
//! | [`cache`] | Cache backends, provider and key derivation |
//! | [`pipeline`] | Streaming chunk decoding, accumulation and replay |
//! | [`transport`] | HTTP transport to the inference endpoint |
//! | [`prompt`] | ChatML prompt rendering |
//! | [`types`] | Messages, conversation window, generation parameters |
//! | [`tokens`] | Token counting and usage reporting |
//! | [`attachment`] | Text file attachments for prompts |
//! | [`config`] | Environment-driven settings |

pub mod attachment;
pub mod cache;
pub mod client;
pub mod config;
pub mod pipeline;
pub mod prompt;
pub mod tokens;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{GenerationStream, InferenceClient, InferenceClientBuilder};
pub use config::Settings;
pub use types::{
    message::{Message, MessageRole},
    params::GenerationParams,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A specialized Result for pipeline operations
pub type PipeResult<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `PipeResult<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = PipeResult<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
