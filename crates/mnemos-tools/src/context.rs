//! Tool execution context.

use crate::web::WebProvider;
use mnemos_memory::{DEFAULT_TOP_K, MemoryStore};
use std::sync::Arc;
use uuid::Uuid;

/// Defaults applied when a tool call omits optional arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDefaults {
    /// `top_k` for `search_memory`.
    pub search_top_k: usize,
    /// Result count requested from the web provider.
    pub web_max_results: usize,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            search_top_k: DEFAULT_TOP_K,
            web_max_results: 1,
        }
    }
}

/// Shared service dependencies (constructed once, shared via Arc).
pub struct ToolServices {
    /// Memory facade for the memory tools.
    pub memory: Arc<MemoryStore>,
    /// Optional web provider for `web_search`.
    pub web: Option<Arc<dyn WebProvider>>,
    pub defaults: ToolDefaults,
}

impl ToolServices {
    pub fn new(memory: Arc<MemoryStore>) -> Self {
        Self {
            memory,
            web: None,
            defaults: ToolDefaults::default(),
        }
    }

    /// Attach a web provider.
    pub fn with_web(mut self, web: Arc<dyn WebProvider>) -> Self {
        self.web = Some(web);
        self
    }

    pub fn with_defaults(mut self, defaults: ToolDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

/// Context passed to every tool handler.
///
/// Identity fields are per invocation; services are shared behind an `Arc`.
#[derive(Clone)]
pub struct ToolContext {
    /// Owner all memory reads and writes are scoped to.
    pub owner_id: String,
    /// Thread the tool call was made in.
    pub thread_id: String,
    /// Turn that issued the call, when running inside the engine.
    pub turn_id: Option<Uuid>,
    pub services: Arc<ToolServices>,
}

impl ToolContext {
    pub fn new(
        owner_id: impl Into<String>,
        thread_id: impl Into<String>,
        services: Arc<ToolServices>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            thread_id: thread_id.into(),
            turn_id: None,
            services,
        }
    }

    /// Tag the context with the calling turn.
    pub fn with_turn(mut self, turn_id: Uuid) -> Self {
        self.turn_id = Some(turn_id);
        self
    }
}
