//! The closed Mnemos tool set: specs, typed invocations, handlers and the
//! policy-filtered registry used by the execution engine.

pub mod context;
mod handlers;
pub mod invocation;
pub mod kind;
pub mod registry;
pub mod web;

/// Tool execution context and shared services.
pub use context::{ToolContext, ToolDefaults, ToolServices};
/// Typed tool invocations.
pub use invocation::{
    SaveRecallMemoryArgs, SearchMemoryArgs, StoreCoreMemoryArgs, ToolInvocation, WebSearchArgs,
};
/// Tool kinds and their model-facing specs.
pub use kind::{ToolKind, ToolSpec};
/// Registry and dispatch result.
pub use registry::{ToolOutcome, ToolRegistry};
/// Web provider types.
pub use web::{WebProvider, WebSearchResult};

/// Confirmation returned by `store_core_memory`.
pub const MEMORY_STORED: &str = "Memory stored.";
/// In-band rejection for an out-of-range core memory index.
pub const INDEX_OUT_OF_BOUNDS: &str = "Error: Index out of bounds.";
