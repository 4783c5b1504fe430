//! ChatML prompt rendering.

use crate::types::{ConversationWindow, Message};

pub const SYSTEM_PREAMBLE: &str =
    "You are a helpful AI coding assistant. You provide clear, concise, and accurate responses.";

/// Renders the live prompt plus the trailing conversation window into one ChatML string.
#[derive(Debug, Clone)]
pub struct PromptFormatter {
    window: ConversationWindow,
    system: String,
}

impl PromptFormatter {
    pub fn new(window: ConversationWindow) -> Self {
        Self {
            window,
            system: SYSTEM_PREAMBLE.to_string(),
        }
    }

    pub fn format(&self, prompt: &str, history: &[Message]) -> String {
        let mut out = String::new();
        push_turn(&mut out, "system", &self.system);
        for turn in self.window.select(history) {
            push_turn(&mut out, turn.role.chat_tag(), &turn.content);
        }
        push_turn(&mut out, "user", prompt);
        out.push_str("<|im_start|>assistant\n");
        out
    }
}

impl Default for PromptFormatter {
    fn default() -> Self {
        Self::new(ConversationWindow::default())
    }
}

fn push_turn(out: &mut String, role: &str, content: &str) {
    out.push_str("<|im_start|>");
    out.push_str(role);
    out.push('\n');
    out.push_str(content);
    out.push_str("\n<|im_end|>\n");
}
