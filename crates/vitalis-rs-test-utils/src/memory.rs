use async_trait::async_trait;
use vitalis_rs_memory::{MemoryError, MemoryItem, MemoryStore, MemoryValue, Namespace};

/// Store whose every operation reports the backend as unavailable.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

impl FailingStore {
    fn unavailable() -> MemoryError {
        MemoryError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl MemoryStore for FailingStore {
    async fn put(
        &self,
        _namespace: &Namespace,
        _key: &str,
        _value: MemoryValue,
    ) -> Result<(), MemoryError> {
        Err(Self::unavailable())
    }

    async fn get(
        &self,
        _namespace: &Namespace,
        _key: &str,
    ) -> Result<Option<MemoryItem>, MemoryError> {
        Err(Self::unavailable())
    }

    async fn search(
        &self,
        _namespace: &Namespace,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<MemoryItem>, MemoryError> {
        Err(Self::unavailable())
    }

    async fn delete(&self, _namespace: &Namespace, _key: &str) -> Result<bool, MemoryError> {
        Err(Self::unavailable())
    }
}
