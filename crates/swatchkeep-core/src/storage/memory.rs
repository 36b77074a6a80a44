//! In-memory storage implementation.

use super::{BoxFuture, Items, Storage, StorageError, StorageResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get(&self, keys: &[&str]) -> BoxFuture<'_, StorageResult<Items>> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        Box::pin(async move {
            let entries = self.entries.read().map_err(|e| {
                StorageError::Other(format!("Lock error: {}", e))
            })?;
            Ok(keys
                .into_iter()
                .filter_map(|key| entries.get(&key).cloned().map(|value| (key, value)))
                .collect())
        })
    }

    fn set(&self, items: Items) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let mut entries = self.entries.write().map_err(|e| {
                StorageError::Other(format!("Lock error: {}", e))
            })?;
            entries.extend(items);
            Ok(())
        })
    }
}
