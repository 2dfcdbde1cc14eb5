//! Conversation text helpers for the recall query.

use mnemos_protocol::{Message, Role};

/// Approximate characters per token.
const CHARS_PER_TOKEN: usize = 4;

/// Render messages as `Speaker: content` lines.
pub fn buffer_string(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| format!("{}: {}", speaker(message.role), message.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::System => "System",
        Role::User => "Human",
        Role::Assistant => "AI",
        Role::Tool => "Tool",
    }
}

/// Estimate token count for a string (rough estimate: ~4 chars per token).
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(CHARS_PER_TOKEN)
}

/// Keep the trailing `budget` tokens of `text`, cut on a char boundary.
pub fn last_tokens(text: &str, budget: usize) -> &str {
    let max_bytes = budget.saturating_mul(CHARS_PER_TOKEN);
    if text.len() <= max_bytes {
        return text;
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
