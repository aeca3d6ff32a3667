//! Tool dispatch for the Vitalis assistant.
//!
//! Tools are looked up by name in a [`ToolRegistry`] and invoked with a
//! [`ToolContext`] that carries the user scope and turn-shared services.

pub mod builtins;
pub mod context;
pub mod registry;
pub mod tool;

/// Built-in tool registry and registration helper.
pub use builtins::{
    UPSERT_MEMORY_TOOL, UpsertMemoryTool, builtin_tool_registry, register_builtin_tools,
};
/// Tool context and turn-shared services.
pub use context::{ToolContext, TurnServices};
/// Tool registry type.
pub use registry::ToolRegistry;
/// Tool trait and spec type.
pub use tool::{Tool, ToolSpec, parse_args};
