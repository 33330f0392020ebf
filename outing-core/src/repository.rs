use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to encode value for key {key}: {reason}")]
    Encode { key: String, reason: String },

    #[error("Failed to decode value for key {key}: {reason}")]
    Decode { key: String, reason: String },
}

/// Best-effort key-value persistence port.
///
/// Values are JSON documents. `save_batch` must apply all entries or none.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn save_batch(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError>;

    async fn save(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.save_batch(vec![(key.to_string(), value)]).await
    }
}

/// Loads and decodes a typed document.
pub async fn load_typed<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.load(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Decode {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Encodes a typed document into a batch entry.
pub fn encode_entry<T: Serialize>(key: &str, value: &T) -> Result<(String, Value), StoreError> {
    let encoded = serde_json::to_value(value).map_err(|e| StoreError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok((key.to_string(), encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<HashMap<String, Value>>,
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn save_batch(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
            self.entries.lock().unwrap().extend(entries);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_typed_load_and_encode() {
        let store = MapStore::default();
        let entry = encode_entry("numbers", &vec![1, 2, 3]).unwrap();
        store.save_batch(vec![entry]).await.unwrap();

        let loaded: Option<Vec<i32>> = load_typed(&store, "numbers").await.unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));

        let missing: Option<Vec<i32>> = load_typed(&store, "missing").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_decode_error_names_key() {
        let store = MapStore::default();
        store.save("numbers", serde_json::json!("not a list")).await.unwrap();

        let err = load_typed::<Vec<i32>>(&store, "numbers").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { ref key, .. } if key == "numbers"));
    }
}
