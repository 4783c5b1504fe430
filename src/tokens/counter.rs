//! Token counter implementations.

use crate::types::Message;

pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;

    fn count_messages(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.count(&m.content)).sum()
    }
}

/// Counts whitespace-separated words.
///
/// The endpoint does not report usage, so words stand in for tokens on both
/// the request and the response side.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCounter;

impl WordCounter {
    pub fn new() -> Self {
        Self
    }
}

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
