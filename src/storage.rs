//! Durable key-value store collaborators
//!
//! The preference layer talks to an abstract store holding serialized JSON
//! values under logical keys. The store is eventually persistent and not
//! transactional across keys. `FjallStore` is the on-device implementation;
//! `MemoryStore` backs tests and ephemeral runs.

use crate::error::CityWeatherError;
use async_trait::async_trait;
use fjall::Keyspace;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokio::task;

/// Abstract durable key-value store holding JSON string values
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<String>, CityWeatherError>;

    /// Write `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: String) -> Result<(), CityWeatherError>;

    /// Remove `key` entirely; removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<(), CityWeatherError>;
}

/// On-disk store backed by a fjall keyspace
pub struct FjallStore {
    store: Keyspace,
}

fn persistence_err(e: impl std::fmt::Display) -> CityWeatherError {
    CityWeatherError::persistence(e.to_string())
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>, CityWeatherError> {
    Ok(store
        .get(key)
        .map_err(persistence_err)?
        .map(|v| v.to_vec()))
}

impl FjallStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CityWeatherError> {
        let db = fjall::Database::builder(&path)
            .open()
            .map_err(persistence_err)?;
        let items = db
            .keyspace("preferences", fjall::KeyspaceCreateOptions::default)
            .map_err(persistence_err)?;
        Ok(Self { store: items })
    }
}

#[async_trait]
impl DurableStore for FjallStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CityWeatherError> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes = task::spawn_blocking(move || get_from_store(store, key_bytes))
            .await
            .map_err(persistence_err)??;

        maybe_bytes
            .map(|bytes| String::from_utf8(bytes).map_err(persistence_err))
            .transpose()
    }

    async fn put(&self, key: &str, value: String) -> Result<(), CityWeatherError> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let bytes = value.into_bytes();

        task::spawn_blocking(move || store.insert(key, bytes))
            .await
            .map_err(persistence_err)?
            .map_err(persistence_err)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CityWeatherError> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();

        task::spawn_blocking(move || store.remove(key))
            .await
            .map_err(persistence_err)?
            .map_err(persistence_err)?;
        Ok(())
    }
}

/// In-process store with no durability, for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key currently exists, distinct from holding an empty value
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    /// Snapshot of the current contents
    #[must_use]
    pub fn contents(&self) -> HashMap<String, String> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CityWeatherError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), CityWeatherError> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CityWeatherError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();

        assert_eq!(store.get("favorites").await.unwrap(), None);

        store
            .put("favorites", "[\"Lahore\"]".to_string())
            .await
            .unwrap();
        assert_eq!(
            store.get("favorites").await.unwrap(),
            Some("[\"Lahore\"]".to_string())
        );

        store.remove("favorites").await.unwrap();
        assert!(!store.contains_key("favorites"));
        // Removing again is a no-op
        store.remove("favorites").await.unwrap();
    }

    #[tokio::test]
    async fn test_fjall_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FjallStore::open(temp_dir.path()).unwrap();

        assert_eq!(store.get("settings").await.unwrap(), None);

        store
            .put("settings", "{\"useCelsius\":true}".to_string())
            .await
            .unwrap();
        assert_eq!(
            store.get("settings").await.unwrap(),
            Some("{\"useCelsius\":true}".to_string())
        );

        store.put("settings", "{}".to_string()).await.unwrap();
        assert_eq!(store.get("settings").await.unwrap(), Some("{}".to_string()));

        store.remove("settings").await.unwrap();
        assert_eq!(store.get("settings").await.unwrap(), None);
    }
}
