use mnemos_memory::MemoryStore;
use mnemos_tools::ToolServices;
use std::sync::Arc;

/// Tool services over `memory` with default settings and no web provider.
pub fn tool_services(memory: Arc<MemoryStore>) -> Arc<ToolServices> {
    Arc::new(ToolServices::new(memory))
}
