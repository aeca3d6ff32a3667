//! Error types for the core conversation crate.

use thiserror::Error;

/// Errors returned by turn orchestration and the assistant facade.
#[derive(Debug, Error)]
pub enum VitalisCoreError {
    /// The memory store could not be searched while building the prompt.
    #[error("retrieval error: {0}")]
    Retrieval(String),
    /// The structured evaluation call failed or returned garbage.
    ///
    /// Turns never surface this; evaluation degrades to `SKIP`.
    #[error("evaluation error: {0}")]
    Evaluation(String),
    /// A model invocation failed while generating a reply.
    #[error("generation error: {0}")]
    Generation(String),
    /// A tool call failed or named an unknown tool.
    #[error("tool execution error: {0}")]
    ToolExecution(String),
    /// Model identifier or credentials are missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The turn used more state transitions than allowed.
    #[error("step limit exceeded (limit={limit})")]
    StepLimitExceeded { limit: usize },
    /// Memory store error outside of retrieval.
    #[error("memory error: {0}")]
    Memory(String),
    /// Thread id is unknown for the requesting user.
    #[error("unknown thread: {0}")]
    UnknownThread(String),
    /// Request is missing required fields.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
