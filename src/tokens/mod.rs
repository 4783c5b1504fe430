//! Token accounting.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TokenCounter`] | Trait for counting implementations |
//! | [`WordCounter`] | Whitespace word count used for both directions |
//! | [`TokenUsage`] | Sent/received delta for one completed call |
//! | [`UsageSink`] | Destination for usage deltas |
//! | [`SessionUsage`] | Running session totals |

mod counter;
mod usage;

pub use counter::{TokenCounter, WordCounter};
pub use usage::{noop_sink, NoopUsageSink, SessionUsage, TokenUsage, UsageSink};
