//! Test helpers shared across Vitalis crates.

pub mod context;
pub mod events;
pub mod llm;
pub mod memory;
pub mod tools;

pub use context::base_tool_context;
pub use events::RecordingSink;
pub use llm::{FailingLLM, FixedChatResponse, RecordedCall, ScriptedLLM, tool_call};
pub use memory::FailingStore;
pub use tools::{BarrierTool, EchoTool, FailingTool};
