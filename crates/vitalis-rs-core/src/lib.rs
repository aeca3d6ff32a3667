//! Core conversation primitives for Vitalis.
//!
//! This crate owns the model gateway, memory retrieval and evaluation, tool
//! execution, the turn state machine, and the assistant facade used by the
//! server and CLI.

pub mod error;
pub mod evaluation;
pub mod executor;
pub mod gateway;
pub mod health;
pub mod orchestrator;
pub mod prompt;
pub mod retrieval;

pub use error::VitalisCoreError;
pub use evaluation::MemoryEvaluator;
pub use executor::ToolExecutor;
pub use gateway::{ModelGateway, ModelId, resolve_provider};
pub use health::HealthProfile;
/// Assistant facade and chat types.
pub use orchestrator::{
    Assistant, AssistantBuilder, ChatReply, ChatRequest, ChatStream, Thread, ThreadStore,
    TurnOutcome,
};
pub use retrieval::{MemoryRetriever, RetrievedMemories};
pub use vitalis_rs_protocol::EventSink;
