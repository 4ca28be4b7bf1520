//! Non-keychain credential stores.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use super::credentials::{CredentialStore, StoreError};

/// Local storage file name in the cache directory
const LOCAL_STORAGE_FILE: &str = "local_storage.json";

/// Plain JSON key-value file, the desktop stand-in for browser local storage.
///
/// Values are not encrypted. Writes within one process are serialized.
pub struct LocalStorage {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl LocalStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            path: dir.join(LOCAL_STORAGE_FILE),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StoreError::Corrupt(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, values: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(values)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        if values.remove(key).is_some() {
            self.write_all(&values).await?;
        }
        Ok(())
    }
}

/// Volatile store; nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.values
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.values()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let store = LocalStorage::new(dir.path().to_path_buf());
        store.set("token", "abc").await.unwrap();
        store.set("uid", "u1").await.unwrap();

        let reopened = LocalStorage::new(dir.path().to_path_buf());
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("abc"));
        assert_eq!(reopened.get("uid").await.unwrap().as_deref(), Some("u1"));
        assert_eq!(reopened.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_local_storage_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStorage::new(dir.path().join("nested"));

        // no file yet
        store.delete("token").await.unwrap();

        store.set("token", "abc").await.unwrap();
        store.delete("token").await.unwrap();
        store.delete("token").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_local_storage_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStorage::new(dir.path().to_path_buf());
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.get("token").await, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_memory_store_delete_missing_key() {
        let store = MemoryStore::new();
        store.delete("token").await.unwrap();
        store.set("token", "t").await.unwrap();
        store.delete("token").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
    }
}
