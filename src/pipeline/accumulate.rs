use super::decode::Chunk;
use crate::tokens::{TokenCounter, WordCounter};

/// Buffers the text of one in-flight generation.
///
/// Lives only as long as its stream; the finished text is handed to the cache
/// through [`StreamAccumulator::finish`] and nothing else is persisted.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    tokens_received: u64,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the fragment to forward to the caller.
    ///
    /// Block chunks count their words, token chunks count one each.
    pub fn push(&mut self, chunk: Chunk) -> String {
        match chunk {
            Chunk::GeneratedText(text) => {
                self.tokens_received += WordCounter.count(&text) as u64;
                self.text.push_str(&text);
                text
            }
            Chunk::Token(text) => {
                self.tokens_received += 1;
                self.text.push_str(&text);
                text
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens_received(&self) -> u64 {
        self.tokens_received
    }

    /// The accumulated text, or `None` when nothing was produced.
    pub fn finish(self) -> Option<(String, u64)> {
        if self.text.is_empty() {
            None
        } else {
            Some((self.text, self.tokens_received))
        }
    }
}
