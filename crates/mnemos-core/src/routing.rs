//! Routing policy after the agent node.

use mnemos_protocol::{Message, Role};

/// Next step after the agent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Execute the requested tool calls, then return to the agent.
    Tools,
    /// Finish the turn.
    End,
}

/// `Tools` iff the latest message is an assistant message carrying at least
/// one tool call.
pub fn route(last_message: &Message) -> Route {
    if last_message.role == Role::Assistant && last_message.has_tool_calls() {
        Route::Tools
    } else {
        Route::End
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_protocol::ToolCall;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn plain_reply_ends_turn() {
        assert_eq!(route(&Message::assistant("hello")), Route::End);
    }

    #[test]
    fn tool_calls_route_to_tools() {
        let message = Message::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("search_memory", json!({ "query": "tea" }))],
        );
        assert_eq!(route(&message), Route::Tools);
    }

    #[test]
    fn non_assistant_messages_end() {
        assert_eq!(route(&Message::user("hi")), Route::End);
    }
}
