//! Component wiring from a loaded config.

use log::{info, warn};
use mnemos_config::{EmbedderProvider, MemoryStoreKind, MnemosConfig};
use mnemos_core::providers::{OpenAiChatModel, OpenAiEmbedder, TavilySearchProvider};
use mnemos_core::{ChatModel, Engine, EventSink};
use mnemos_memory::{
    Embedder, HashingEmbedder, InMemoryVectorStore, JsonlVectorStore, MemoryError, MemoryStore,
    VectorStore,
};
use mnemos_tools::{ToolDefaults, ToolServices};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling the engine.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("memory setup failed: {0}")]
    Memory(#[from] MemoryError),
    #[error("unsupported {section} provider: {name}")]
    UnsupportedProvider { section: &'static str, name: String },
    #[error("memory.path is required for the jsonl store")]
    MissingStorePath,
}

/// API keys read by the entry point.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
}

impl Credentials {
    /// Read `OPENAI_API_KEY` and `TAVILY_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            tavily_api_key: non_empty_var("TAVILY_API_KEY"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Build the configured embedder.
pub fn build_embedder(
    config: &MnemosConfig,
    credentials: &Credentials,
) -> Result<Arc<dyn Embedder>, BootstrapError> {
    let embedder = &config.memory.embedder;
    Ok(match embedder.provider {
        EmbedderProvider::Hashing => Arc::new(HashingEmbedder::new(embedder.dimension)?),
        EmbedderProvider::Openai => {
            if credentials.openai_api_key.is_none() {
                warn!("openai embedder configured without OPENAI_API_KEY");
            }
            Arc::new(OpenAiEmbedder::from_config(
                embedder,
                credentials.openai_api_key.clone(),
            ))
        }
    })
}

/// Build the memory facade over the configured store and embedder.
pub fn build_memory(
    config: &MnemosConfig,
    credentials: &Credentials,
) -> Result<Arc<MemoryStore>, BootstrapError> {
    let store: Arc<dyn VectorStore> = match config.memory.store {
        MemoryStoreKind::Memory => Arc::new(InMemoryVectorStore::new()),
        MemoryStoreKind::Jsonl => {
            let path = config
                .memory
                .path
                .as_deref()
                .ok_or(BootstrapError::MissingStorePath)?;
            Arc::new(JsonlVectorStore::open(path)?)
        }
    };
    let embedder = build_embedder(config, credentials)?;
    info!(
        "memory store ready (store={:?}, embedder={:?}, dimension={})",
        config.memory.store,
        config.memory.embedder.provider,
        embedder.dimension()
    );
    Ok(Arc::new(
        MemoryStore::new(store, embedder).with_min_score(config.memory.min_score),
    ))
}

/// Build the tool services, attaching a web provider when credentials allow.
pub fn build_services(
    config: &MnemosConfig,
    memory: Arc<MemoryStore>,
    credentials: &Credentials,
) -> Result<ToolServices, BootstrapError> {
    let web = &config.tools.web_search;
    let mut services = ToolServices::new(memory).with_defaults(ToolDefaults {
        search_top_k: config.memory.recall_k,
        web_max_results: web.max_results,
    });
    match web.provider.as_str() {
        "tavily" => match &credentials.tavily_api_key {
            Some(key) => {
                services = services.with_web(Arc::new(TavilySearchProvider::from_config(web, key)));
            }
            None => warn!("TAVILY_API_KEY not set; web_search will report an error"),
        },
        other => {
            return Err(BootstrapError::UnsupportedProvider {
                section: "tools.web_search",
                name: other.to_string(),
            });
        }
    }
    Ok(services)
}

fn build_model(
    config: &MnemosConfig,
    credentials: &Credentials,
) -> Result<Arc<dyn ChatModel>, BootstrapError> {
    match config.model.provider.as_str() {
        "openai" => {
            if credentials.openai_api_key.is_none() && config.model.base_url.is_none() {
                warn!("OPENAI_API_KEY not set; model calls will likely be rejected");
            }
            Ok(Arc::new(OpenAiChatModel::from_config(
                &config.model,
                credentials.openai_api_key.clone(),
            )))
        }
        other => Err(BootstrapError::UnsupportedProvider {
            section: "model",
            name: other.to_string(),
        }),
    }
}

/// Assemble an engine with every component taken from `config`.
pub fn build_engine(
    config: &MnemosConfig,
    credentials: &Credentials,
    event_sink: Option<Arc<dyn EventSink>>,
) -> Result<Engine, BootstrapError> {
    let memory = build_memory(config, credentials)?;
    let services = build_services(config, memory, credentials)?;
    let model = build_model(config, credentials)?;
    let mut builder = Engine::builder(model, Arc::new(services)).config(config);
    if let Some(sink) = event_sink {
        builder = builder.event_sink(sink);
    }
    let engine = builder.build();
    info!(
        "engine ready (model={}, tools={:?})",
        config.model.name,
        engine.registry().list()
    );
    Ok(engine)
}
