//! Persisted key-value store behind favorites, PIN and cached listings.
//!
//! Components receive a [`SharedStore`] at construction instead of reaching
//! for global state, so tests swap in [`MemoryStore`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use directories::ProjectDirs;

use crate::errors::IptvError;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> Result<(), IptvError>;
    fn remove(&self, key: &str) -> Result<(), IptvError>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;

/// In-memory store, used by tests and as a fallback when the data dir is unavailable
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), IptvError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| IptvError::Store(format!("Failed to lock store: {}", e)))?;
        guard.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), IptvError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| IptvError::Store(format!("Failed to lock store: {}", e)))?;
        guard.remove(key);
        Ok(())
    }
}

/// A JSON object file; every write rewrites the whole file.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: PathBuf) -> Result<Self, anyhow::Error> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("store {} unreadable, starting empty: {}", path.display(), e);
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// `store.json` in the platform data dir
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "tenfoot", "tenfoot-iptv")
            .map(|dirs| dirs.data_dir().join("store.json"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), IptvError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| IptvError::Store(e.to_string()))?;
        }
        let content =
            serde_json::to_string_pretty(entries).map_err(|e| IptvError::Store(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| IptvError::Store(e.to_string()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), IptvError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| IptvError::Store(format!("Failed to lock store: {}", e)))?;
        guard.insert(key.to_string(), value);
        self.flush(&guard)
    }

    fn remove(&self, key: &str) -> Result<(), IptvError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| IptvError::Store(format!("Failed to lock store: {}", e)))?;
        if guard.remove(key).is_some() {
            self.flush(&guard)?;
        }
        Ok(())
    }
}
