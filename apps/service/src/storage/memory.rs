use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Collection, Storage, check_id};
use crate::error::StoreError;

/// Process-local store, handy for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<(Collection, String), Value>>,
}

#[async_trait]
impl Storage for MemoryStore {
    async fn read(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        self.records
            .read()
            .await
            .get(&(collection, id.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound { collection: collection.as_str(), id: id.to_string() })
    }

    async fn update(&self, collection: Collection, id: &str, record: &Value) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(&(collection, id.to_string())) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound { collection: collection.as_str(), id: id.to_string() }),
        }
    }

    async fn list(&self, collection: Collection) -> Result<Vec<String>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .keys()
            .filter(|(c, _)| *c == collection)
            .map(|(_, id)| id.clone())
            .collect())
    }

    async fn create(&self, collection: Collection, id: &str, record: &Value) -> Result<(), StoreError> {
        check_id(id)?;
        let mut records = self.records.write().await;
        let key = (collection, id.to_string());
        if records.contains_key(&key) {
            return Err(StoreError::AlreadyExists { collection: collection.as_str(), id: id.to_string() });
        }
        records.insert(key, record.clone());
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .remove(&(collection, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound { collection: collection.as_str(), id: id.to_string() })
    }
}
