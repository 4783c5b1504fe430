//! Core data types for chat requests.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat turn with role and text content |
//! | [`MessageRole`] | Turn role (system, user, assistant) |
//! | [`ConversationWindow`] | Trailing history slice visible to prompt and cache |
//! | [`GenerationParams`] | Generation controls hashed into the cache key |
//!
//! ```rust
//! use hf_inference_chat::types::{ConversationWindow, GenerationParams, Message};
//!
//! let history = vec![Message::user("What is Rust?"), Message::assistant("A language.")];
//! let window = ConversationWindow::default();
//! assert_eq!(window.select(&history).len(), 2);
//!
//! let params = GenerationParams::default().with_temperature(0.2);
//! assert!(params.validate().is_ok());
//! ```

pub mod message;
pub mod params;

pub use message::{ConversationWindow, Message, MessageRole};
pub use params::GenerationParams;
