//! Streaming response pipeline.
//!
//! ```text
//! Raw Bytes → decode_chunks → StreamAccumulator → fragments to caller
//!     │             │                 │
//!   HTTP      line split +       full text kept
//!             shape match        for the cache
//!
//! Cached text → replay_chars → fragments to caller
//! ```
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`decode`] | Line decoding and chunk shape matching |
//! | [`accumulate`] | Per-request text buffer and received-token count |
//! | [`replay`] | Paced character replay of cached text |

pub mod accumulate;
pub mod decode;
pub mod replay;

pub use accumulate::StreamAccumulator;
pub use decode::{decode_chunks, generated_text, parse_line, Chunk};
pub use replay::replay_chars;
