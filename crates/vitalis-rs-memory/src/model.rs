//! Memory records, namespaces, and search results.

use crate::error::MemoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Partition of the store: `(collection, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// Collection name, e.g. `memories`.
    pub collection: String,
    /// Owning user.
    pub user_id: String,
}

impl Namespace {
    pub fn new(collection: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            user_id: user_id.into(),
        }
    }

    /// Reject namespaces with blank components.
    pub fn validate(&self) -> Result<(), MemoryError> {
        if self.collection.trim().is_empty() {
            return Err(MemoryError::InvalidNamespace(
                "collection must not be empty".to_string(),
            ));
        }
        if self.user_id.trim().is_empty() {
            return Err(MemoryError::InvalidNamespace(
                "user_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.user_id)
    }
}

/// Value stored under a memory key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MemoryValue {
    /// The remembered fact.
    pub content: String,
    /// Optional circumstances the fact was learned in; empty when absent.
    #[serde(default)]
    pub context: String,
}

impl MemoryValue {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            context: String::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Whether the value carries any content worth showing.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Whether a context annotation is present.
    pub fn has_context(&self) -> bool {
        !self.context.trim().is_empty()
    }
}

/// A stored memory as returned by search and get.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryItem {
    /// Key, unique within the namespace.
    pub key: String,
    /// Namespace the item lives in.
    pub namespace: Namespace,
    /// Stored value.
    pub value: MemoryValue,
    /// Similarity score for ranked searches; `None` for broad retrieval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last upsert timestamp.
    pub updated_at: DateTime<Utc>,
}
