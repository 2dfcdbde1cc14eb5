use async_trait::async_trait;
use mnemos_core::{ChatModel, ChatRequest, LlmError};
use mnemos_protocol::{Message, ToolCall};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Replays queued replies in order and records every request.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<Message>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Message>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue another reply.
    pub fn push(&self, reply: Message) {
        self.replies.lock().push_back(reply);
    }

    /// Handle to the recorded requests.
    pub fn requests(&self) -> Arc<Mutex<Vec<ChatRequest>>> {
        self.requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(&self, request: ChatRequest) -> Result<Message, LlmError> {
        self.requests.lock().push(request);
        self.replies.lock().pop_front().ok_or(LlmError::Empty)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Always fails with an API error.
#[derive(Clone, Default)]
pub struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    async fn chat(&self, _request: ChatRequest) -> Result<Message, LlmError> {
        Err(LlmError::Api {
            status: 500,
            body: "boom".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Requests the same tool call on every invocation.
#[derive(Clone)]
pub struct LoopingModel {
    tool_name: String,
    arguments: serde_json::Value,
    calls: Arc<Mutex<usize>>,
}

impl LoopingModel {
    pub fn new(tool_name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl ChatModel for LoopingModel {
    async fn chat(&self, _request: ChatRequest) -> Result<Message, LlmError> {
        *self.calls.lock() += 1;
        Ok(Message::assistant_with_tool_calls(
            "",
            vec![ToolCall::new(self.tool_name.clone(), self.arguments.clone())],
        ))
    }

    fn model_name(&self) -> &str {
        "looping"
    }
}

/// Sleeps before answering, for cancellation and timeout tests.
#[derive(Clone)]
pub struct SlowModel {
    delay: Duration,
    reply: String,
}

impl SlowModel {
    pub fn new(delay: Duration, reply: impl Into<String>) -> Self {
        Self {
            delay,
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl ChatModel for SlowModel {
    async fn chat(&self, _request: ChatRequest) -> Result<Message, LlmError> {
        tokio::time::sleep(self.delay).await;
        Ok(Message::assistant(self.reply.clone()))
    }

    fn model_name(&self) -> &str {
        "slow"
    }
}
