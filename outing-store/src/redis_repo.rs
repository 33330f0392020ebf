use async_trait::async_trait;
use outing_core::repository::{KeyValueStore, StoreError};
use redis::AsyncCommands;
use serde_json::Value;
use tracing::{debug, error};

/// Redis-backed key-value store. Documents are stored as JSON strings under
/// a namespaced key.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    namespace: String,
}

impl RedisStore {
    pub fn new(connection_string: &str, namespace: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self {
            client,
            namespace: namespace.to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!("Redis connection failed: {}", e);
                StoreError::Unavailable(e.to_string())
            })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(self.key(key))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match raw {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::Decode {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn save_batch(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;

        // MULTI/EXEC so the coupon list and usage ledger land together
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in &entries {
            let encoded = serde_json::to_string(value).map_err(|e| StoreError::Encode {
                key: key.clone(),
                reason: e.to_string(),
            })?;
            pipe.set(self.key(key), encoded).ignore();
        }

        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        debug!(keys = entries.len(), namespace = %self.namespace, "Persisted batch to Redis");
        Ok(())
    }
}
