//! Inference client.
//!
//! Keep the public surface small: build a client from [`crate::Settings`], then
//! call [`InferenceClient::generate_stream`] or [`InferenceClient::generate`].
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
pub mod stream;

pub use self::core::InferenceClient;
pub use builder::InferenceClientBuilder;
pub use stream::GenerationStream;
