//! Memory retrieval: targeted plus general recall merged into a prompt block.

use crate::error::VitalisCoreError;
use crate::prompt::memory_block;
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;
use vitalis_rs_config::MemoryConfig;
use vitalis_rs_memory::{MemoryItem, MemoryStore, Namespace};

/// Result of a retrieval pass.
#[derive(Debug, Clone, Default)]
pub struct RetrievedMemories {
    /// Merged records, unique by key, targeted hits first.
    pub items: Vec<MemoryItem>,
    /// Prompt-ready text; empty when no record has content.
    pub block: String,
}

impl RetrievedMemories {
    /// Records that contributed a bullet to the block.
    pub fn rendered_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.value.has_content())
            .count()
    }
}

/// Reads a user's memories ahead of generation.
#[derive(Clone)]
pub struct MemoryRetriever {
    store: Arc<dyn MemoryStore>,
    collection: String,
    targeted_limit: usize,
    general_limit: usize,
}

impl MemoryRetriever {
    pub fn new(store: Arc<dyn MemoryStore>, config: &MemoryConfig) -> Self {
        Self {
            store,
            collection: config.collection.clone(),
            targeted_limit: config.targeted_limit,
            general_limit: config.general_limit,
        }
    }

    /// Search by the latest user message and by recency, then merge and format.
    pub async fn retrieve(
        &self,
        user_id: &str,
        last_user_message: &str,
    ) -> Result<RetrievedMemories, VitalisCoreError> {
        let namespace = Namespace::new(self.collection.clone(), user_id);
        let targeted = self
            .store
            .search(&namespace, last_user_message, self.targeted_limit)
            .await
            .map_err(|err| VitalisCoreError::Retrieval(err.to_string()))?;
        let general = self
            .store
            .search(&namespace, "", self.general_limit)
            .await
            .map_err(|err| VitalisCoreError::Retrieval(err.to_string()))?;
        debug!(
            "memories searched (namespace={}, targeted={}, general={})",
            namespace,
            targeted.len(),
            general.len()
        );

        let items = merge_memories(targeted, general);
        let block = memory_block(&format_memory_bullets(&items));
        Ok(RetrievedMemories { items, block })
    }
}

/// Concatenate result sets keeping the first record seen for each key.
pub fn merge_memories(targeted: Vec<MemoryItem>, general: Vec<MemoryItem>) -> Vec<MemoryItem> {
    let mut seen = HashSet::new();
    targeted
        .into_iter()
        .chain(general)
        .filter(|item| seen.insert(item.key.clone()))
        .collect()
}

/// One bullet per record with content: `- content (context)` or `- content`.
pub fn format_memory_bullets(items: &[MemoryItem]) -> Vec<String> {
    items
        .iter()
        .filter(|item| item.value.has_content())
        .map(|item| {
            if item.value.has_context() {
                format!("- {} ({})", item.value.content, item.value.context)
            } else {
                format!("- {}", item.value.content)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use vitalis_rs_memory::{InMemoryStore, MemoryValue};
    use vitalis_rs_test_utils::FailingStore;

    fn item(key: &str, content: &str, context: &str) -> MemoryItem {
        MemoryItem {
            key: key.to_string(),
            namespace: Namespace::new("memories", "u"),
            value: MemoryValue::new(content).with_context(context),
            score: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn merge_keeps_first_occurrence_per_key() {
        let merged = merge_memories(
            vec![item("a", "targeted a", ""), item("b", "b", "")],
            vec![item("a", "general a", ""), item("c", "c", "")],
        );
        let keys: Vec<_> = merged.iter().map(|item| item.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(merged[0].value.content, "targeted a");
    }

    #[test]
    fn bullets_include_context_and_skip_blank_content() {
        let bullets = format_memory_bullets(&[
            item("a", "Walks 8000 steps", "Daily activity tracking data"),
            item("b", "   ", "ignored"),
            item("c", "Likes tea", ""),
        ]);
        assert_eq!(
            bullets,
            vec![
                "- Walks 8000 steps (Daily activity tracking data)".to_string(),
                "- Likes tea".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn empty_store_yields_empty_block() {
        let store = Arc::new(InMemoryStore::new());
        let retriever = MemoryRetriever::new(store, &MemoryConfig::default());
        let retrieved = retriever.retrieve("u", "hello").await.expect("retrieve");
        assert!(retrieved.items.is_empty());
        assert_eq!(retrieved.block, "");
        assert_eq!(retrieved.rendered_count(), 0);
    }

    #[tokio::test]
    async fn unreachable_store_is_a_retrieval_error() {
        let retriever = MemoryRetriever::new(Arc::new(FailingStore), &MemoryConfig::default());
        let err = retriever.retrieve("u", "hello").await.expect_err("fail");
        assert!(matches!(err, VitalisCoreError::Retrieval(_)));
    }

    #[tokio::test]
    async fn targeted_and_general_hits_are_merged_without_duplicates() {
        let store = Arc::new(InMemoryStore::new());
        let namespace = Namespace::new("memories", "u");
        store
            .put(&namespace, "name", MemoryValue::new("User's name is Sam"))
            .await
            .expect("put");
        store
            .put(
                &namespace,
                "goal",
                MemoryValue::new("Goal is 10000 steps").with_context("Fitness and health goals"),
            )
            .await
            .expect("put");
        let retriever = MemoryRetriever::new(store, &MemoryConfig::default());
        let retrieved = retriever
            .retrieve("u", "What's my name?")
            .await
            .expect("retrieve");
        let keys: Vec<_> = retrieved.items.iter().map(|item| item.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "goal"]);
        assert!(retrieved.block.contains("- User's name is Sam\n"));
        assert!(retrieved.block.contains("- Goal is 10000 steps (Fitness and health goals)"));

        let again = retriever
            .retrieve("u", "What's my name?")
            .await
            .expect("retrieve");
        assert_eq!(again.block, retrieved.block);
    }
}
