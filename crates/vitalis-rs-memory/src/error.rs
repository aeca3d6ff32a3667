//! Error types for memory operations.

/// Errors returned by memory stores and helpers.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Regex compilation error.
    #[error("regex error: {0}")]
    Regex(String),
    /// Namespace is missing a collection or user id.
    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),
    /// Backend could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
