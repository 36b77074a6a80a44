//! File-based storage implementation for native platforms.

use super::{BoxFuture, Items, Storage, StorageError, StorageResult};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default file name inside the data directory.
pub const STORAGE_FILE_NAME: &str = "storage.json";

/// File-based storage for native platforms.
///
/// Keeps every key in a single JSON object, rewritten on each `set`.
pub struct FileStorage {
    /// Path of the JSON file.
    path: PathBuf,
}

impl FileStorage {
    /// Create a file storage writing to `path`.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn new(path: PathBuf) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Io(format!("Failed to create storage directory: {}", e))
                })?;
            }
        }
        Ok(Self { path })
    }

    /// Create file storage inside `dir` using [`STORAGE_FILE_NAME`].
    pub fn in_dir(dir: &Path) -> StorageResult<Self> {
        Self::new(dir.join(STORAGE_FILE_NAME))
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/swatchkeep/storage.json`
    /// On Windows: `%LOCALAPPDATA%\swatchkeep\storage.json`
    pub fn default_location() -> StorageResult<Self> {
        Self::in_dir(&default_data_dir()?)
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> StorageResult<Items> {
        if !self.path.exists() {
            return Ok(Items::new());
        }

        let json = fs::read_to_string(&self.path).map_err(|e| {
            StorageError::Io(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        if json.trim().is_empty() {
            return Ok(Items::new());
        }

        match serde_json::from_str::<Value>(&json) {
            Ok(Value::Object(items)) => Ok(items),
            Ok(_) => Err(StorageError::Serialization(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(StorageError::Serialization(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write_items(&self, items: &Items) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, json).map_err(|e| {
            StorageError::Io(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

/// The platform data directory for SwatchKeep.
pub fn default_data_dir() -> StorageResult<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
    Ok(base.join("swatchkeep"))
}

impl Storage for FileStorage {
    fn get(&self, keys: &[&str]) -> BoxFuture<'_, StorageResult<Items>> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        Box::pin(async move {
            let mut items = self.read_items()?;
            Ok(keys
                .into_iter()
                .filter_map(|key| items.remove(&key).map(|value| (key, value)))
                .collect())
        })
    }

    fn set(&self, new_items: Items) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let mut items = self.read_items()?;
            items.extend(new_items);
            self.write_items(&items)
        })
    }
}
