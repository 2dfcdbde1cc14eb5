//! In-memory transcript storage keyed by owner and thread.

use log::debug;
use mnemos_protocol::{Message, Role};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Thread history shared by concurrent turns.
#[derive(Clone, Default)]
pub struct ThreadStore {
    threads: Arc<RwLock<HashMap<(String, String), Vec<Message>>>>,
    max_messages: Option<usize>,
}

impl ThreadStore {
    /// Store that keeps every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that drops the oldest turns once a thread holds more than
    /// `max_messages` messages.
    pub fn with_limit(max_messages: usize) -> Self {
        Self {
            threads: Arc::default(),
            max_messages: Some(max_messages),
        }
    }

    /// Messages recorded for a thread so far; empty for an unknown thread.
    pub fn history(&self, owner_id: &str, thread_id: &str) -> Vec<Message> {
        self.threads
            .read()
            .get(&(owner_id.to_string(), thread_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// At most `max_messages` of the newest messages, starting on a user
    /// message so no tool result is separated from its call.
    pub fn recent(&self, owner_id: &str, thread_id: &str, max_messages: usize) -> Vec<Message> {
        let threads = self.threads.read();
        let Some(messages) = threads.get(&(owner_id.to_string(), thread_id.to_string())) else {
            return Vec::new();
        };
        messages[window_start(messages, max_messages)..].to_vec()
    }

    /// Append a turn transcript to a thread.
    pub fn append(&self, owner_id: &str, thread_id: &str, messages: &[Message]) {
        let mut threads = self.threads.write();
        let thread = threads
            .entry((owner_id.to_string(), thread_id.to_string()))
            .or_default();
        thread.extend_from_slice(messages);
        let dropped = match self.max_messages {
            Some(limit) => {
                let start = window_start(thread, limit);
                thread.drain(..start);
                start
            }
            None => 0,
        };
        debug!(
            "appended transcript (owner_id={}, thread_id={}, messages={}, dropped={}, kept={})",
            owner_id,
            thread_id,
            messages.len(),
            dropped,
            thread.len()
        );
    }

    /// Drop a thread; returns whether it existed.
    pub fn clear(&self, owner_id: &str, thread_id: &str) -> bool {
        self.threads
            .write()
            .remove(&(owner_id.to_string(), thread_id.to_string()))
            .is_some()
    }
}

/// First index of the newest window of at most `max` messages that begins
/// with a user message. Falls back to the last user message when a single
/// turn is longer than `max`.
fn window_start(messages: &[Message], max: usize) -> usize {
    if messages.len() <= max {
        return 0;
    }
    let from = messages.len() - max;
    messages[from..]
        .iter()
        .position(|message| message.role == Role::User)
        .map(|offset| from + offset)
        .or_else(|| messages.iter().rposition(|message| message.role == Role::User))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_protocol::ToolCall;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tool_turn(text: &str) -> Vec<Message> {
        let call = ToolCall::new("search_memory", json!({ "query": text }));
        vec![
            Message::user(text),
            Message::assistant_with_tool_calls("", vec![call.clone()]),
            Message::tool_result(&call, "[]"),
            Message::assistant("done"),
        ]
    }

    #[test]
    fn threads_are_isolated_by_owner_and_id() {
        let store = ThreadStore::new();
        store.append("u1", "t1", &[Message::user("hello")]);
        store.append("u1", "t1", &[Message::assistant("hi")]);
        store.append("u2", "t1", &[Message::user("other")]);

        assert_eq!(store.history("u1", "t1").len(), 2);
        assert_eq!(store.history("u2", "t1").len(), 1);
        assert!(store.history("u1", "t2").is_empty());

        assert!(store.clear("u1", "t1"));
        assert!(!store.clear("u1", "t1"));
        assert!(store.history("u1", "t1").is_empty());
    }

    #[test]
    fn limit_drops_whole_turns_from_the_front() {
        let store = ThreadStore::with_limit(6);
        for text in ["one", "two", "three"] {
            store.append("u1", "t1", &tool_turn(text));
        }
        let history = store.history("u1", "t1");
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "three");
    }

    #[test]
    fn recent_window_starts_on_a_user_message() {
        let store = ThreadStore::new();
        store.append("u1", "t1", &tool_turn("one"));
        store.append("u1", "t1", &tool_turn("two"));

        let window = store.recent("u1", "t1", 5);
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].content, "two");
        assert_eq!(store.recent("u1", "t1", 8).len(), 8);
        // A single turn longer than the window is kept whole.
        assert_eq!(store.recent("u1", "t1", 2).len(), 4);
        assert!(store.recent("u1", "missing", 4).is_empty());
    }
}
