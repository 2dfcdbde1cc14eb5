//! Configuration schema for Mnemos.

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Root config for a Mnemos process.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MnemosConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl MnemosConfig {
    /// Builder starting from `MnemosConfig::default()`.
    pub fn builder() -> MnemosConfigBuilder {
        MnemosConfigBuilder::new()
    }

    /// Check value ranges that the schema alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.name.trim().is_empty() {
            return Err(invalid("model.name", "must not be empty"));
        }
        if self.memory.recall_k == 0 {
            return Err(invalid("memory.recall_k", "must be a positive integer"));
        }
        if self.memory.recall_query_token_budget == 0 {
            return Err(invalid(
                "memory.recall_query_token_budget",
                "must be a positive integer",
            ));
        }
        if self.memory.embedder.dimension == 0 {
            return Err(invalid(
                "memory.embedder.dimension",
                "must be a positive integer",
            ));
        }
        if self.memory.store == MemoryStoreKind::Jsonl && self.memory.path.is_none() {
            return Err(invalid("memory.path", "required when store is \"jsonl\""));
        }
        if self.engine.max_iterations == 0 {
            return Err(invalid("engine.max_iterations", "must be a positive integer"));
        }
        if self.engine.call_timeout_secs == 0 {
            return Err(invalid(
                "engine.call_timeout_secs",
                "must be a positive integer",
            ));
        }
        if self.engine.max_history_messages == 0 {
            return Err(invalid(
                "engine.max_history_messages",
                "must be a positive integer",
            ));
        }
        if self.tools.web_search.max_results == 0 {
            return Err(invalid(
                "tools.web_search.max_results",
                "must be a positive integer",
            ));
        }
        Ok(())
    }
}

fn invalid(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_string(),
        message: message.to_string(),
    }
}

/// Builder for assembling a `MnemosConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct MnemosConfigBuilder {
    config: MnemosConfig,
}

impl MnemosConfigBuilder {
    /// Fresh builder over the default config.
    pub fn new() -> Self {
        Self {
            config: MnemosConfig::default(),
        }
    }

    /// Set the `model` section.
    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    /// Set the `memory` section.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Set the `tools` section.
    pub fn tools(mut self, tools: ToolsConfig) -> Self {
        self.config.tools = tools;
        self
    }

    /// Set the `engine` section.
    pub fn engine(mut self, engine: EngineConfig) -> Self {
        self.config.engine = engine;
        self
    }

    /// Returns the assembled config without validating it.
    pub fn build(self) -> MnemosConfig {
        self.config
    }
}

/// Chat model provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_provider")]
    pub provider: String,
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_model_provider(),
            name: default_model_name(),
            base_url: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

fn default_model_provider() -> String {
    "openai".to_string()
}

fn default_model_name() -> String {
    "gpt-4o".to_string()
}

/// Backing vector store selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryStoreKind {
    /// Process-local store, lost on exit.
    #[default]
    Memory,
    /// JSONL log persisted under `memory.path`.
    Jsonl,
}

/// Embedding provider selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderProvider {
    /// Local feature-hashing embedder.
    #[default]
    Hashing,
    /// OpenAI-compatible embeddings endpoint.
    Openai,
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    #[serde(default)]
    pub provider: EmbedderProvider,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: EmbedderProvider::default(),
            model: None,
            base_url: None,
            dimension: default_embedding_dimension(),
        }
    }
}

/// Default embedding width, matching LaBSE-sized models.
fn default_embedding_dimension() -> usize {
    768
}

/// Memory subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub store: MemoryStoreKind,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub embedder: EmbedderConfig,
    #[serde(default = "default_recall_k")]
    pub recall_k: usize,
    #[serde(default = "default_recall_query_token_budget")]
    pub recall_query_token_budget: usize,
    #[serde(default)]
    pub min_score: Option<f32>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            store: MemoryStoreKind::default(),
            path: None,
            embedder: EmbedderConfig::default(),
            recall_k: default_recall_k(),
            recall_query_token_budget: default_recall_query_token_budget(),
            min_score: None,
        }
    }
}

/// Default number of recall memories loaded per turn.
fn default_recall_k() -> usize {
    5
}

/// Default token budget for the recall search query.
fn default_recall_query_token_budget() -> usize {
    2048
}

/// Tool allow/deny policy.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ToolPolicy {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

impl ToolPolicy {
    /// `allow: ["*"]` with an empty deny list.
    pub fn allow_all() -> Self {
        Self {
            allow: vec!["*".to_string()],
            deny: Vec::new(),
        }
    }

    /// Whether a tool name passes the policy.
    pub fn permits(&self, name: &str) -> bool {
        if self.deny.iter().any(|entry| entry == name) {
            return false;
        }
        if self.allow.is_empty() || self.allow.iter().any(|entry| entry == "*") {
            return true;
        }
        self.allow.iter().any(|entry| entry == name)
    }
}

/// The `tools` section: policy plus per-tool settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub policy: ToolPolicy,
    #[serde(default)]
    pub web_search: WebSearchConfig,
}

/// Web search tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default = "default_web_provider")]
    pub provider: String,
    #[serde(default = "default_web_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            provider: default_web_provider(),
            max_results: default_web_max_results(),
            base_url: None,
        }
    }
}

fn default_web_provider() -> String {
    "tavily".to_string()
}

fn default_web_max_results() -> usize {
    1
}

/// Execution engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Thread messages kept and replayed to the model.
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            call_timeout_secs: default_call_timeout_secs(),
            max_history_messages: default_max_history_messages(),
            system_prompt: None,
        }
    }
}

/// Default cap on agent node executions per turn.
fn default_max_iterations() -> usize {
    10
}

/// Default timeout for a single external call.
fn default_call_timeout_secs() -> u64 {
    120
}

fn default_max_history_messages() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tool_policy_deny_wins_over_allow() {
        let policy = ToolPolicy {
            allow: vec!["*".to_string()],
            deny: vec!["web_search".to_string()],
        };
        assert!(!policy.permits("web_search"));
        assert!(policy.permits("search_memory"));
    }

    #[test]
    fn tool_policy_allowlist_is_exclusive() {
        let policy = ToolPolicy {
            allow: vec!["search_memory".to_string()],
            deny: Vec::new(),
        };
        assert!(policy.permits("search_memory"));
        assert!(!policy.permits("store_core_memory"));
        assert!(ToolPolicy::default().permits("anything"));
    }

    #[test]
    fn validate_rejects_jsonl_without_path() {
        let config = MnemosConfig::builder()
            .memory(MemoryConfig {
                store: MemoryStoreKind::Jsonl,
                ..MemoryConfig::default()
            })
            .build();
        let err = config.validate().expect_err("missing path");
        assert_eq!(
            err.to_string(),
            "invalid config at memory.path: required when store is \"jsonl\""
        );
    }

    #[test]
    fn defaults_pass_validation() {
        let config = MnemosConfig::default();
        config.validate().expect("defaults are valid");
        assert_eq!(config.memory.recall_k, 5);
        assert_eq!(config.engine.max_iterations, 10);
        assert_eq!(config.engine.max_history_messages, 50);
        assert_eq!(config.tools.web_search.max_results, 1);
    }

    #[test]
    fn validate_rejects_zero_history_window() {
        let config = MnemosConfig::builder()
            .engine(EngineConfig {
                max_history_messages: 0,
                ..EngineConfig::default()
            })
            .build();
        let err = config.validate().expect_err("zero window");
        assert!(err.to_string().contains("engine.max_history_messages"));
    }
}
