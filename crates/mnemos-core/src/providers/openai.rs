//! OpenAI-compatible chat completions and embeddings clients.

use crate::llm::{ChatModel, ChatRequest, LlmError};
use async_trait::async_trait;
use log::debug;
use mnemos_config::{EmbedderConfig, ModelConfig};
use mnemos_memory::{Embedder, MemoryError};
use mnemos_protocol::{Message, Role, ToolCall};
use mnemos_tools::ToolSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OpenAiToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OpenAiToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: OpenAiFunctionCall,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OpenAiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAiFunction,
}

#[derive(Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

fn function_type() -> String {
    "function".to_string()
}

/// Chat model speaking the OpenAI chat completions protocol.
pub struct OpenAiChatModel {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    http_client: reqwest::Client,
}

impl OpenAiChatModel {
    pub fn new(base_url: Option<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.into(),
            api_key,
            temperature: None,
            max_tokens: None,
            http_client: reqwest::Client::new(),
        }
    }

    /// Build a client from the `model` config section.
    pub fn from_config(config: &ModelConfig, api_key: Option<String>) -> Self {
        let mut client = Self::new(config.base_url.clone(), config.name.clone(), api_key);
        client.temperature = config.temperature;
        client.max_tokens = config.max_tokens;
        client
    }

    fn build_messages(request: &ChatRequest) -> Vec<OpenAiMessage> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(OpenAiMessage {
            role: "system".to_string(),
            content: Some(request.system_prompt.clone()),
            ..OpenAiMessage::default()
        });
        for msg in &request.messages {
            messages.push(OpenAiMessage {
                role: msg.role.as_str().to_string(),
                content: Some(msg.content.clone()),
                tool_calls: msg
                    .tool_calls
                    .iter()
                    .map(|call| OpenAiToolCall {
                        id: call.id.clone(),
                        kind: function_type(),
                        function: OpenAiFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.to_string(),
                        },
                    })
                    .collect(),
                tool_call_id: msg.tool_call_id.clone(),
            });
        }
        messages
    }

    fn build_tools(tools: &[ToolSpec]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .map(|spec| OpenAiTool {
                kind: "function",
                function: OpenAiFunction {
                    name: spec.name.clone(),
                    description: spec.description.clone(),
                    parameters: spec.args_schema.clone(),
                },
            })
            .collect()
    }

    fn build_request_body(&self, request: &ChatRequest) -> OpenAiRequest {
        OpenAiRequest {
            model: self.model.clone(),
            messages: Self::build_messages(request),
            tools: Self::build_tools(&request.tools),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn parse_response(response: OpenAiResponse) -> Result<Message, LlmError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::Empty)?;
        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| {
                let arguments = parse_arguments(&call.function.arguments);
                let mut parsed = ToolCall::new(call.function.name, arguments);
                if !call.id.is_empty() {
                    parsed.id = call.id;
                }
                parsed
            })
            .collect();
        let content = choice.message.content.unwrap_or_default();
        Ok(Message::assistant_with_tool_calls(content, tool_calls))
    }
}

/// Decode a tool call argument string; unparseable text is kept as a string
/// so the tool layer can reject it.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<Message, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&request);
        debug!(
            "sending chat request (model={}, messages={}, tools={})",
            self.model,
            body.messages.len(),
            body.tools.len()
        );

        let mut http_req = self.http_client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            http_req = http_req.bearer_auth(key);
        }
        let response = http_req
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let decoded: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        Self::parse_response(decoded)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedder backed by the OpenAI embeddings endpoint.
pub struct OpenAiEmbedder {
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
    http_client: reqwest::Client,
}

impl OpenAiEmbedder {
    /// Build an embedder from the `memory.embedder` config section.
    pub fn from_config(config: &EmbedderConfig, api_key: Option<String>) -> Self {
        Self {
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            api_key,
            dimension: config.dimension,
            http_client: reqwest::Client::new(),
        }
    }

    fn collect(&self, mut response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>, MemoryError> {
        if response.data.len() != expected {
            return Err(MemoryError::Embedding(format!(
                "expected {expected} embeddings, got {}",
                response.data.len()
            )));
        }
        response.data.sort_by_key(|item| item.index);
        let mut vectors = Vec::with_capacity(expected);
        for item in response.data {
            if item.embedding.len() != self.dimension {
                return Err(MemoryError::Embedding(format!(
                    "embedding has dimension {}, expected {}",
                    item.embedding.len(),
                    self.dimension
                )));
            }
            vectors.push(item.embedding);
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| MemoryError::Embedding("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoryError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimension,
        };
        let mut http_req = self.http_client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            http_req = http_req.bearer_auth(key);
        }
        let response = http_req
            .send()
            .await
            .map_err(|e| MemoryError::EmbeddingUnavailable(format!("embedding request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::EmbeddingUnavailable(format!(
                "embedding API error {status}: {body}"
            )));
        }
        let decoded: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| MemoryError::Embedding(format!("failed to parse embedding response: {e}")))?;
        self.collect(decoded, texts.len())
    }
}
