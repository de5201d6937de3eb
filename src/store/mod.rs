//! Key-value persistence.
//!
//! The calculator keeps its history, settings and formula library as JSON
//! strings under fixed keys. Stores take `&self` for writes so one store
//! can be shared (via `Arc`) between the evaluator and the formula library.

mod file;
pub mod history;

pub use file::FileStore;
pub use history::{HISTORY_LIMIT, History, HistoryItem, HistoryStore, Settings};

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::StoreError;

pub const HISTORY_KEY: &str = "calcHistory";
pub const SETTINGS_KEY: &str = "calcSettings";
pub const FORMULAS_KEY: &str = "custom-formulas";

/// Called with `(key, value)` after every successful write.
pub type Listener = Box<dyn Fn(&str, &str) + Send + Sync>;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn subscribe(&self, listener: Listener);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn subscribe(&self, listener: Listener) {
        (**self).subscribe(listener)
    }
}

#[derive(Default)]
pub(crate) struct Listeners {
    inner: RwLock<Vec<Listener>>,
}

impl Listeners {
    pub(crate) fn push(&self, listener: Listener) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub(crate) fn notify(&self, key: &str, value: &str) {
        let listeners = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener(key, value);
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
    listeners: Listeners,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        self.listeners.notify(key, value);
        Ok(())
    }

    fn subscribe(&self, listener: Listener) {
        self.listeners.push(listener);
    }
}

/// Read and decode a JSON value. Missing, unreadable or malformed
/// entries all come back as `None`.
pub fn load_json<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "failed to read stored value");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed stored value");
            None
        }
    }
}

/// Encode and write a JSON value, logging instead of failing.
pub fn save_json<T: Serialize + ?Sized>(store: &impl KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(StoreError::from)
        .and_then(|raw| store.set(key, &raw));

    match result {
        Ok(()) => debug!(key, "persisted"),
        Err(e) => warn!(key, error = %e, "failed to persist value"),
    }
}
