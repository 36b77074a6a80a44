//! Storage abstraction for persistence.
//!
//! Backends are plain key-value stores shaped like `chrome.storage.local`:
//! `get` a set of keys and `set` a batch of entries. Palette
//! state lives under two keys, [`COLLECTIONS_KEY`] and
//! [`CURRENT_COLLECTION_KEY`], and is read and written through
//! [`load_state`] and [`save_state`].

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::{FileStorage, STORAGE_FILE_NAME, default_data_dir};

use crate::collection::{CollectionMap, CollectionStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Key holding the name → slots mapping.
pub const COLLECTIONS_KEY: &str = "collections";

/// Key holding the name of the current collection.
pub const CURRENT_COLLECTION_KEY: &str = "currentCollection";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A batch of stored entries.
pub type Items = serde_json::Map<String, Value>;

/// Trait for key-value storage backends.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    /// Fetch the entries stored under `keys`. Missing keys are left out.
    fn get(&self, keys: &[&str]) -> BoxFuture<'_, StorageResult<Items>>;

    /// Write every entry of `items`, leaving other keys alone.
    fn set(&self, items: Items) -> BoxFuture<'_, StorageResult<()>>;
}

/// Trait for key-value storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    /// Fetch the entries stored under `keys`. Missing keys are left out.
    fn get(&self, keys: &[&str]) -> BoxFuture<'_, StorageResult<Items>>;

    /// Write every entry of `items`, leaving other keys alone.
    fn set(&self, items: Items) -> BoxFuture<'_, StorageResult<()>>;
}

/// Palette state as it sits in storage. Either key may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<CollectionMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_collection: Option<String>,
}

impl PersistedState {
    /// Snapshot a store for writing.
    pub fn from_store(store: &CollectionStore) -> Self {
        Self {
            collections: Some(store.collections().clone()),
            current_collection: Some(store.current_name().to_string()),
        }
    }

    /// Decode the palette keys out of a fetched batch.
    pub fn from_items(items: &Items) -> StorageResult<Self> {
        let collections = items
            .get(COLLECTIONS_KEY)
            .filter(|value| !value.is_null())
            .map(|value| serde_json::from_value::<CollectionMap>(value.clone()))
            .transpose()?;
        let current_collection = items
            .get(CURRENT_COLLECTION_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            collections,
            current_collection,
        })
    }

    /// Encode the present keys into a batch for [`Storage::set`].
    pub fn into_items(self) -> StorageResult<Items> {
        let mut items = Items::new();
        if let Some(collections) = self.collections {
            items.insert(COLLECTIONS_KEY.to_string(), serde_json::to_value(collections)?);
        }
        if let Some(current) = self.current_collection {
            items.insert(CURRENT_COLLECTION_KEY.to_string(), Value::String(current));
        }
        Ok(items)
    }

    /// Build a store, filling in defaults for whatever is missing.
    pub fn into_store(self) -> CollectionStore {
        CollectionStore::from_parts(self.collections, self.current_collection)
    }
}

/// Read the palette keys.
pub async fn load_state<S: Storage + ?Sized>(storage: &S) -> StorageResult<PersistedState> {
    let items = storage
        .get(&[COLLECTIONS_KEY, CURRENT_COLLECTION_KEY])
        .await?;
    PersistedState::from_items(&items)
}

/// Write whichever palette keys `state` carries.
pub async fn save_state<S: Storage + ?Sized>(storage: &S, state: PersistedState) -> StorageResult<()> {
    let items = state.into_items()?;
    if items.is_empty() {
        return Ok(());
    }
    storage.set(items).await
}

/// Load the persisted store, falling back to defaults when the stored data
/// cannot be decoded.
pub async fn load_store<S: Storage + ?Sized>(storage: &S) -> StorageResult<CollectionStore> {
    match load_state(storage).await {
        Ok(state) => Ok(state.into_store()),
        Err(StorageError::Serialization(e)) => {
            log::warn!("Stored palette is unreadable, starting fresh: {}", e);
            Ok(CollectionStore::new())
        }
        Err(e) => Err(e),
    }
}
