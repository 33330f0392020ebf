use async_trait::async_trait;
use outing_core::repository::{KeyValueStore, StoreError};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store used when no Redis URL is configured, and in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save_batch(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        // Single write guard keeps the batch all-or-nothing for readers
        let mut guard = self.entries.write().await;
        guard.extend(entries);
        Ok(())
    }
}
