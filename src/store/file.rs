//! JSON-file backed store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use super::{KeyValueStore, Listener, Listeners};
use crate::error::StoreError;

/// Keeps every key in a single JSON object file, rewritten on each write.
pub struct FileStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
    listeners: Listeners,
}

impl FileStore {
    /// Open the store at `path`. A missing, empty or malformed file is an
    /// empty store; the next write replaces a malformed one.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                match serde_json::from_str(&raw) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "ignoring malformed store file"
                        );
                        BTreeMap::new()
                    }
                }
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = data.len(), "opened store");

        Ok(Self {
            path,
            data: RwLock::new(data),
            listeners: Listeners::default(),
        })
    }

    /// `<data dir>/counton/store.json`, if the platform has a data dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("counton").join("store.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, data: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        {
            let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
            data.insert(key.to_string(), value.to_string());
            self.flush(&data)?;
        }
        self.listeners.notify(key, value);
        Ok(())
    }

    fn subscribe(&self, listener: Listener) {
        self.listeners.push(listener);
    }
}
