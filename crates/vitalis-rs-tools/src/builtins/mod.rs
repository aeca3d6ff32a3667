//! Tools available to every assistant unless a custom registry is supplied.

mod memory;

use crate::ToolRegistry;
use log::info;
use std::sync::Arc;

pub use memory::{UPSERT_MEMORY_TOOL, UpsertMemoryTool};

/// Add the built-in tools to `registry`, replacing same-named entries.
pub fn register_builtin_tools(registry: &ToolRegistry) {
    registry.register(Arc::new(UpsertMemoryTool));
    info!("registered built-in tools (tools={:?})", registry.list());
}

/// Registry holding only the built-in tools.
pub fn builtin_tool_registry() -> ToolRegistry {
    let registry = ToolRegistry::new();
    register_builtin_tools(&registry);
    registry
}
