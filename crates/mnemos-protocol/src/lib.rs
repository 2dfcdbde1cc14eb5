//! Wire types shared across Mnemos crates: messages, tool calls, and turn events.

mod tool;

pub use tool::ToolError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Owner of memories and threads; every memory read and write is scoped by it.
pub type OwnerId = String;
pub type ThreadId = String;
pub type TurnId = Uuid;
/// Provider-assigned id pairing a tool call with its result message.
pub type ToolCallId = String;

/// Who produced a message. Serialized in lowercase, matching chat APIs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Output of a tool call, answering an assistant request.
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A structured request from the model to invoke a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back on the tool result.
    pub id: ToolCallId,
    /// Tool name.
    pub name: String,
    /// Tool arguments as a JSON object.
    pub arguments: Value,
}

impl ToolCall {
    /// Build a tool call with a freshly generated id.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: name.into(),
            arguments,
        }
    }
}

/// Role-tagged conversation message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role that produced the message.
    pub role: Role,
    /// Message text content.
    pub content: String,
    /// Tool calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Call id a tool message responds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<ToolCallId>,
    /// Tool name for tool messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
            created_at: Utc::now(),
        }
    }

    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Build an assistant message without tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Build an assistant message requesting tool calls.
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::with_role(Role::Assistant, content)
        }
    }

    /// Build a tool result message answering a tool call.
    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            name: Some(call.name.clone()),
            ..Self::with_role(Role::Tool, content)
        }
    }

    /// Whether this message requests at least one tool call.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Envelope for a turn event, stamped with the turn's owner and thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMsg {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub thread_id: ThreadId,
    pub created_at: DateTime<Utc>,
    pub payload: EventPayload,
}

impl EventMsg {
    /// Build an event stamped with a fresh id and the current time.
    pub fn new(owner_id: &str, thread_id: &str, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            thread_id: thread_id.to_string(),
            created_at: Utc::now(),
            payload,
        }
    }
}

/// Progress of a turn through the engine graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum EventPayload {
    TurnStarted { turn_id: TurnId },
    /// Core and recall memories were loaded for the turn.
    MemoriesLoaded {
        turn_id: TurnId,
        core_count: usize,
        recall_count: usize,
    },
    /// Emitted before a tool call runs, in request order.
    ToolCallStarted {
        turn_id: TurnId,
        tool_call_id: ToolCallId,
        tool_name: String,
        arguments: Value,
    },
    /// `success` is false for in-band `Error: ...` results.
    ToolCallFinished {
        turn_id: TurnId,
        tool_call_id: ToolCallId,
        result: String,
        success: bool,
    },
    /// The model answered without tool calls.
    TurnCompleted {
        turn_id: TurnId,
        message: String,
        iterations: usize,
    },
    /// The turn ended with an error; nothing was appended to the thread.
    Error { turn_id: TurnId, message: String },
}

/// Receives turn events synchronously from the engine.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EventMsg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn role_wire_names_match_serde() {
        for role in [Role::System, Role::User, Role::Assistant, Role::Tool] {
            let encoded = serde_json::to_value(role).expect("serialize");
            assert_eq!(encoded, json!(role.as_str()));
        }
    }

    #[test]
    fn tool_result_echoes_call_identity() {
        let call = ToolCall::new("search_memory", json!({ "query": "tea" }));
        let message = Message::tool_result(&call, "[]");
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id, Some(call.id.clone()));
        assert_eq!(message.name.as_deref(), Some("search_memory"));
        assert!(!message.has_tool_calls());
    }

    #[test]
    fn message_omits_empty_tool_fields_on_the_wire() {
        let encoded = serde_json::to_value(Message::user("hi")).expect("serialize");
        let object = encoded.as_object().expect("object");
        assert!(!object.contains_key("tool_calls"));
        assert!(!object.contains_key("tool_call_id"));
        assert_eq!(object["role"], json!("user"));
    }

    #[test]
    fn event_payload_is_tagged() {
        let event = EventMsg::new(
            "owner",
            "thread",
            EventPayload::ToolCallFinished {
                turn_id: Uuid::nil(),
                tool_call_id: "call_1".to_string(),
                result: "Memory stored.".to_string(),
                success: true,
            },
        );
        let encoded = serde_json::to_value(&event).expect("serialize");
        assert_eq!(encoded["payload"]["type"], json!("tool_call_finished"));
        assert_eq!(encoded["payload"]["payload"]["success"], json!(true));
    }
}
