use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use super::storage::{StorageBackend, StorageChange};
use crate::error::Result;

const CHANGE_CAPACITY: usize = 64;

/// In-process storage backend, used when the engine is embedded in the host
/// process and in tests
pub struct MemoryStorage {
    values: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_values(std::iter::empty())
    }

    pub fn with_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            values: RwLock::new(values.into_iter().collect()),
            changes,
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn store(&self, key: &str, value: Value) -> Result<()> {
        let previous = self
            .values
            .write()
            .await
            .insert(key.to_string(), value.clone());

        if previous.as_ref() != Some(&value) {
            // No subscribers is fine
            let _ = self.changes.send(StorageChange {
                key: key.to_string(),
                value,
            });
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
