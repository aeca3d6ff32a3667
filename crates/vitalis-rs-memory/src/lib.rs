//! Namespaced long-term memory store for Vitalis users.

pub mod error;
pub mod model;
pub mod policy;
pub mod recall;
pub mod store;

/// Memory error type.
pub use error::MemoryError;
/// Namespaces, stored values, and search results.
pub use model::{MemoryItem, MemoryValue, Namespace};
/// Write-time content policy.
pub use policy::MemoryWritePolicy;
/// Recall scoring options.
pub use recall::MemoryRecallOptions;
/// Store contract and the in-memory implementation.
pub use store::{InMemoryStore, MemoryStore};
