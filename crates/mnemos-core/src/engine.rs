//! Turn execution graph: load memories, agent, tools, end.

use crate::context::{buffer_string, estimate_tokens, last_tokens};
use crate::error::CoreError;
use crate::llm::{ChatModel, ChatRequest};
use crate::prompt::PromptBuilder;
use crate::routing::{Route, route};
use crate::state::ConversationState;
use crate::threads::ThreadStore;
use chrono::Utc;
use log::{debug, error, info};
use mnemos_config::MnemosConfig;
use mnemos_memory::{DEFAULT_TOP_K, MemoryStore};
use mnemos_protocol::{EventMsg, EventPayload, EventSink, Message, Role, ToolCall, TurnId};
use mnemos_tools::{ToolContext, ToolRegistry, ToolServices};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Limits and prompt settings for turns.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Maximum agent node executions per turn.
    pub max_iterations: usize,
    /// Deadline applied to each external call.
    pub call_timeout: Duration,
    /// Recall results loaded at turn start.
    pub recall_k: usize,
    /// Token budget for the recall search query.
    pub recall_query_token_budget: usize,
    /// Thread messages replayed to the model each turn.
    pub max_history_messages: usize,
    /// Persona replacing the default one.
    pub system_prompt: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            call_timeout: Duration::from_secs(120),
            recall_k: DEFAULT_TOP_K,
            recall_query_token_budget: 2048,
            max_history_messages: 50,
            system_prompt: None,
        }
    }
}

impl EngineSettings {
    /// Derive settings from a loaded config.
    pub fn from_config(config: &MnemosConfig) -> Self {
        Self {
            max_iterations: config.engine.max_iterations,
            call_timeout: Duration::from_secs(config.engine.call_timeout_secs),
            recall_k: config.memory.recall_k,
            recall_query_token_budget: config.memory.recall_query_token_budget,
            max_history_messages: config.engine.max_history_messages,
            system_prompt: config.engine.system_prompt.clone(),
        }
    }
}

/// One external invocation of the engine.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub owner_id: String,
    pub thread_id: String,
    pub user_message: String,
}

impl TurnRequest {
    pub fn new(
        owner_id: impl Into<String>,
        thread_id: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            thread_id: thread_id.into(),
            user_message: user_message.into(),
        }
    }
}

/// Outcome of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub owner_id: String,
    pub thread_id: String,
    pub turn_id: TurnId,
    /// Content of the final assistant message.
    pub final_message: String,
    /// Every message appended in this turn, starting with the user message.
    pub transcript: Vec<Message>,
    pub core_memories: Vec<String>,
    pub recall_memories: Vec<String>,
    /// Agent node executions.
    pub iterations: usize,
}

/// Graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    LoadMemories,
    Agent,
    Tools,
    End,
}

/// Identity of a running turn.
struct TurnScope<'a> {
    owner_id: &'a str,
    thread_id: &'a str,
    turn_id: TurnId,
    cancel: &'a CancellationToken,
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
    model: Arc<dyn ChatModel>,
    services: Arc<ToolServices>,
    registry: ToolRegistry,
    threads: Option<ThreadStore>,
    settings: EngineSettings,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl EngineBuilder {
    /// Start from a model and the shared tool services.
    pub fn new(model: Arc<dyn ChatModel>, services: Arc<ToolServices>) -> Self {
        Self {
            model,
            services,
            registry: ToolRegistry::new(),
            threads: None,
            settings: EngineSettings::default(),
            event_sink: None,
        }
    }

    /// Apply engine settings and the tool policy from a config.
    pub fn config(mut self, config: &MnemosConfig) -> Self {
        self.settings = EngineSettings::from_config(config);
        self.registry = ToolRegistry::with_policy(&config.tools.policy);
        self
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Share a thread store with other engines. Without one, the engine
    /// keeps its own store capped at `max_history_messages`.
    pub fn threads(mut self, threads: ThreadStore) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn build(self) -> Engine {
        let threads = self
            .threads
            .unwrap_or_else(|| ThreadStore::with_limit(self.settings.max_history_messages));
        Engine {
            model: self.model,
            memory: self.services.memory.clone(),
            services: self.services,
            registry: self.registry,
            threads,
            prompt: PromptBuilder::new(self.settings.system_prompt.clone()),
            settings: self.settings,
            event_sink: self.event_sink,
        }
    }
}

/// Runs turns through the memory-augmented agent graph.
///
/// The engine is shared across concurrent turns; each turn owns its
/// [`ConversationState`].
pub struct Engine {
    model: Arc<dyn ChatModel>,
    memory: Arc<MemoryStore>,
    services: Arc<ToolServices>,
    registry: ToolRegistry,
    threads: ThreadStore,
    prompt: PromptBuilder,
    settings: EngineSettings,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl Engine {
    pub fn builder(model: Arc<dyn ChatModel>, services: Arc<ToolServices>) -> EngineBuilder {
        EngineBuilder::new(model, services)
    }

    /// Thread transcripts recorded by this engine.
    pub fn threads(&self) -> &ThreadStore {
        &self.threads
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one turn for `request`.
    ///
    /// On success the turn transcript is appended to the thread history.
    /// Failed or cancelled turns leave the history untouched; memory writes
    /// that already landed are kept.
    pub async fn invoke(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> Result<TurnResult, CoreError> {
        let turn_id = Uuid::new_v4();
        let scope = TurnScope {
            owner_id: &request.owner_id,
            thread_id: &request.thread_id,
            turn_id,
            cancel: &cancel,
        };
        info!(
            "starting turn (owner_id={}, thread_id={}, turn_id={}, prompt_len={})",
            request.owner_id,
            request.thread_id,
            turn_id,
            request.user_message.len()
        );
        self.emit(&scope, EventPayload::TurnStarted { turn_id });

        let history = self.threads.recent(
            &request.owner_id,
            &request.thread_id,
            self.settings.max_history_messages,
        );
        let state = ConversationState::new(history, Message::user(request.user_message.clone()));
        match self.run_graph(&scope, state).await {
            Ok(state) => {
                let transcript = state.transcript().to_vec();
                let final_message = state
                    .last_message()
                    .map(|message| message.content.clone())
                    .unwrap_or_default();
                self.threads
                    .append(&request.owner_id, &request.thread_id, &transcript);
                info!(
                    "turn completed (turn_id={}, iterations={}, response_len={})",
                    turn_id,
                    state.iterations,
                    final_message.len()
                );
                self.emit(
                    &scope,
                    EventPayload::TurnCompleted {
                        turn_id,
                        message: final_message.clone(),
                        iterations: state.iterations,
                    },
                );
                Ok(TurnResult {
                    owner_id: request.owner_id.clone(),
                    thread_id: request.thread_id.clone(),
                    turn_id,
                    final_message,
                    transcript,
                    core_memories: state.core_memories,
                    recall_memories: state.recall_memories,
                    iterations: state.iterations,
                })
            }
            Err(err) => {
                error!("turn failed (turn_id={}, error={})", turn_id, err);
                self.emit(
                    &scope,
                    EventPayload::Error {
                        turn_id,
                        message: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }

    async fn run_graph(
        &self,
        scope: &TurnScope<'_>,
        mut state: ConversationState,
    ) -> Result<ConversationState, CoreError> {
        let mut node = Node::LoadMemories;
        loop {
            if scope.cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }
            debug!("entering node (turn_id={}, node={:?})", scope.turn_id, node);
            node = match node {
                Node::LoadMemories => {
                    self.load_memories(scope, &mut state).await?;
                    Node::Agent
                }
                Node::Agent => {
                    if state.iterations >= self.settings.max_iterations {
                        return Err(CoreError::TurnAborted {
                            iterations: state.iterations,
                        });
                    }
                    state.iterations += 1;
                    let reply = self.agent(scope, &state).await?;
                    let next = match route(&reply) {
                        Route::Tools => Node::Tools,
                        Route::End => Node::End,
                    };
                    state.push(reply);
                    next
                }
                Node::Tools => {
                    self.run_tools(scope, &mut state).await?;
                    Node::Agent
                }
                Node::End => return Ok(state),
            };
        }
    }

    /// Load core memories and recall memories keyed by the newest part of
    /// the conversation.
    async fn load_memories(
        &self,
        scope: &TurnScope<'_>,
        state: &mut ConversationState,
    ) -> Result<(), CoreError> {
        let core = self
            .guard(scope, "fetch_core", self.memory.fetch_core(scope.owner_id))
            .await?;
        let conversation = buffer_string(&state.messages);
        let query = last_tokens(&conversation, self.settings.recall_query_token_budget);
        let recall = self
            .guard(
                scope,
                "search_recall",
                self.memory
                    .search_recall(scope.owner_id, query, self.settings.recall_k),
            )
            .await?;
        debug!(
            "memories loaded (turn_id={}, core={}, recall={}, query_tokens={})",
            scope.turn_id,
            core.memories.len(),
            recall.len(),
            estimate_tokens(query)
        );
        self.emit(
            scope,
            EventPayload::MemoriesLoaded {
                turn_id: scope.turn_id,
                core_count: core.memories.len(),
                recall_count: recall.len(),
            },
        );
        state.core_memories = core.memories;
        state.recall_memories = recall;
        Ok(())
    }

    /// Invoke the model with the memory prompt and all enabled tools bound.
    async fn agent(
        &self,
        scope: &TurnScope<'_>,
        state: &ConversationState,
    ) -> Result<Message, CoreError> {
        let request = ChatRequest {
            system_prompt: self
                .prompt
                .build(&state.core_memories, &state.recall_memories, Utc::now()),
            messages: state.messages.clone(),
            tools: self.registry.specs(),
        };
        debug!(
            "calling model (turn_id={}, model={}, iteration={}, messages={})",
            scope.turn_id,
            self.model.model_name(),
            state.iterations,
            request.messages.len()
        );
        let mut reply = self.guard(scope, "model call", self.model.chat(request)).await?;
        reply.role = Role::Assistant;
        for call in reply.tool_calls.iter_mut() {
            if call.id.trim().is_empty() {
                call.id = ToolCall::new(call.name.clone(), serde_json::Value::Null).id;
            }
        }
        Ok(reply)
    }

    /// Execute every tool call of the latest message in request order.
    async fn run_tools(
        &self,
        scope: &TurnScope<'_>,
        state: &mut ConversationState,
    ) -> Result<(), CoreError> {
        let calls = state
            .last_message()
            .map(|message| message.tool_calls.clone())
            .unwrap_or_default();
        let ctx = ToolContext::new(scope.owner_id, scope.thread_id, self.services.clone())
            .with_turn(scope.turn_id);
        for call in calls {
            self.emit(
                scope,
                EventPayload::ToolCallStarted {
                    turn_id: scope.turn_id,
                    tool_call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    arguments: call.arguments.clone(),
                },
            );
            let outcome = self
                .guard(scope, "tool call", self.registry.dispatch(&ctx, &call))
                .await?;
            info!(
                "tool call finished (turn_id={}, tool={}, call_id={}, success={})",
                scope.turn_id, outcome.name, outcome.call_id, outcome.success
            );
            self.emit(
                scope,
                EventPayload::ToolCallFinished {
                    turn_id: scope.turn_id,
                    tool_call_id: outcome.call_id.clone(),
                    result: outcome.content.clone(),
                    success: outcome.success,
                },
            );
            state.push(Message::tool_result(&call, outcome.content));
        }
        Ok(())
    }

    /// Race a suspension point against cancellation and the call deadline.
    async fn guard<T, E, F>(
        &self,
        scope: &TurnScope<'_>,
        operation: &'static str,
        future: F,
    ) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, E>>,
        CoreError: From<E>,
    {
        tokio::select! {
            biased;
            _ = scope.cancel.cancelled() => Err(CoreError::Cancelled),
            result = tokio::time::timeout(self.settings.call_timeout, future) => match result {
                Ok(inner) => inner.map_err(CoreError::from),
                Err(_) => Err(CoreError::Timeout {
                    operation,
                    seconds: self.settings.call_timeout.as_secs(),
                }),
            },
        }
    }

    fn emit(&self, scope: &TurnScope<'_>, payload: EventPayload) {
        if let Some(sink) = &self.event_sink {
            sink.emit(EventMsg::new(scope.owner_id, scope.thread_id, payload));
        }
    }
}
