use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by key-value storage implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Requested key does not exist.
    #[error("entry not found for key: {key}")]
    NotFound { key: String },
    /// Underlying storage failure.
    #[error("storage failure: {reason}")]
    Storage { reason: String },
}

/// Local device storage: one opaque blob per key, whole-value overwrite.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Persist a value under a key, overwriting any existing entry.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Retrieve the value for a key.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        (**self).get(key).await
    }
}

/// Process-local store for tests and `--ephemeral` runs. Clones share data.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut map = self.inner.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let map = self.inner.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;

        map.get(key).cloned().ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_returns_latest_value() {
        let store = InMemoryStore::new();
        store.put("tasksState", b"first").await.expect("put");
        store.put("tasksState", b"second").await.expect("put");

        let value = store.get("tasksState").await.expect("get");
        assert_eq!(value, b"second");
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.get("nope").await.expect_err("should be missing");
        assert_eq!(
            err,
            StoreError::NotFound {
                key: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = InMemoryStore::new();
        let shared = Arc::new(store.clone());
        shared.put("k", b"v").await.expect("put through arc");
        assert_eq!(store.get("k").await.expect("get"), b"v");
    }
}
