use thiserror::Error;

/// Failure of a single tool call.
///
/// The orchestrator surfaces every variant as a tool execution error for the
/// turn; the variants exist so logs and tests can tell them apart.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The model named a tool that is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// The memory store or write policy rejected the write.
    #[error("memory write failed: {0}")]
    MemoryWrite(String),
    #[error("tool failed: {0}")]
    Failed(String),
}
