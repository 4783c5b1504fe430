//! Conversation turns shared by prompt formatting and cache-key derivation.

use serde::{Deserialize, Serialize};

/// A single chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    /// Role tag used when rendering a prior turn into the prompt.
    /// Only user turns keep their tag; everything else speaks as the assistant.
    pub fn chat_tag(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            _ => "assistant",
        }
    }
}

/// The trailing slice of a conversation that is visible to the model and the cache.
///
/// Both the prompt formatter and the key generator select turns through this type,
/// so they can never disagree about which history participates in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationWindow {
    /// Window size including the live prompt; `max_messages - 1` prior turns are kept.
    pub max_messages: usize,
    /// Per-message character budget applied to each kept turn.
    pub char_budget: usize,
}

impl ConversationWindow {
    pub const DEFAULT_MAX_MESSAGES: usize = 10;
    pub const DEFAULT_CHAR_BUDGET: usize = 100;

    pub fn new(max_messages: usize, char_budget: usize) -> Self {
        Self {
            max_messages,
            char_budget,
        }
    }

    /// Select the trailing turns of `history` (which must not contain the live prompt),
    /// truncating each content to the character budget.
    pub fn select(&self, history: &[Message]) -> Vec<Message> {
        let keep = self.max_messages.saturating_sub(1);
        let start = history.len().saturating_sub(keep);
        history[start..]
            .iter()
            .map(|m| Message {
                role: m.role,
                content: truncate_chars(&m.content, self.char_budget),
            })
            .collect()
    }
}

impl Default for ConversationWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_MESSAGES, Self::DEFAULT_CHAR_BUDGET)
    }
}

fn truncate_chars(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
