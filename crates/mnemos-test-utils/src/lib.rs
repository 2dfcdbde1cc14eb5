//! Test helpers shared across Mnemos crates.

pub mod context;
pub mod events;
pub mod llm;
pub mod memory;
pub mod web;

pub use context::tool_services;
pub use events::RecordingSink;
pub use llm::{FailingModel, LoopingModel, ScriptedModel, SlowModel};
pub use memory::{DownStore, RecordingEmbedder, memory_store, memory_store_over};
pub use web::StubWebProvider;
