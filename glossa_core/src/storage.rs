//! Key/value storage areas with change notifications.
//!
//! Two areas exist, mirroring the browser's `local` and `sync` storage. Every
//! mutation is broadcast as a [`StorageChange`] to all current subscribers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One key's transition. `None` means the key was absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageChange {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

#[async_trait]
pub trait StorageArea: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
    /// Receive every change made after this call.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// The `local` and `sync` areas handed to the service.
#[derive(Clone)]
pub struct Storage {
    pub local: Arc<dyn StorageArea>,
    pub sync: Arc<dyn StorageArea>,
}

impl Storage {
    pub fn new(local: Arc<dyn StorageArea>, sync: Arc<dyn StorageArea>) -> Self {
        Self { local, sync }
    }

    /// Both areas in memory; nothing survives the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    /// Both areas as JSON files under `dir` (`local.json`, `sync.json`).
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(
            Arc::new(FileStorage::new(dir.join("local.json"))),
            Arc::new(FileStorage::new(dir.join("sync.json"))),
        )
    }
}

fn notify(tx: &broadcast::Sender<StorageChange>, change: StorageChange) {
    // No subscribers is fine.
    let _ = tx.send(change);
}

fn removal_changes(map: HashMap<String, Value>) -> Vec<StorageChange> {
    let mut changes: Vec<_> = map
        .into_iter()
        .map(|(key, old)| StorageChange {
            key,
            old_value: Some(old),
            new_value: None,
        })
        .collect();
    changes.sort_by(|a, b| a.key.cmp(&b.key));
    changes
}

/// A simple in-memory area, mainly for testing.
pub struct MemoryStorage {
    map: std::sync::Mutex<HashMap<String, Value>>,
    tx: broadcast::Sender<StorageChange>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            map: std::sync::Mutex::new(HashMap::new()),
            tx,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, StoreError> {
        self.map
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    pub fn len(&self) -> usize {
        self.map.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageArea for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let old_value = self.lock()?.insert(key.to_string(), value.clone());
        notify(
            &self.tx,
            StorageChange {
                key: key.to_string(),
                old_value,
                new_value: Some(value),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        if let Some(old) = self.lock()?.remove(key) {
            notify(
                &self.tx,
                StorageChange {
                    key: key.to_string(),
                    old_value: Some(old),
                    new_value: None,
                },
            );
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let drained = std::mem::take(&mut *self.lock()?);
        for change in removal_changes(drained) {
            notify(&self.tx, change);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.tx.subscribe()
    }
}

/// A JSON file holding one area's whole map.
///
/// Every operation reads the file and mutations rewrite it, so edits made by
/// another process between calls are picked up (but not broadcast).
pub struct FileStorage {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
    tx: broadcast::Sender<StorageChange>,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path,
            write_lock: tokio::sync::Mutex::new(()),
            tx,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<HashMap<String, Value>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) if s.trim().is_empty() => Ok(HashMap::new()),
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, map: &HashMap<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let s = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&self.path, s).await?;
        debug!(path = %self.path.display(), keys = map.len(), "storage written");
        Ok(())
    }
}

#[async_trait]
impl StorageArea for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read_map().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        let old_value = map.insert(key.to_string(), value.clone());
        self.write_map(&map).await?;
        notify(
            &self.tx,
            StorageChange {
                key: key.to_string(),
                old_value,
                new_value: Some(value),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        if let Some(old) = map.remove(key) {
            self.write_map(&map).await?;
            notify(
                &self.tx,
                StorageChange {
                    key: key.to_string(),
                    old_value: Some(old),
                    new_value: None,
                },
            );
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let map = self.read_map().await?;
        self.write_map(&HashMap::new()).await?;
        for change in removal_changes(map) {
            notify(&self.tx, change);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_set_get_notifies() {
        let area = MemoryStorage::new();
        let mut rx = area.subscribe();

        area.set("config", json!({"a": 1})).await.unwrap();
        area.set("config", json!({"a": 2})).await.unwrap();
        assert_eq!(area.get("config").await.unwrap(), Some(json!({"a": 2})));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.old_value, None);
        assert_eq!(first.new_value, Some(json!({"a": 1})));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.old_value, Some(json!({"a": 1})));
        assert_eq!(second.new_value, Some(json!({"a": 2})));
    }

    #[tokio::test]
    async fn test_memory_clear_reports_each_key() {
        let area = MemoryStorage::new();
        area.set("b", json!(2)).await.unwrap();
        area.set("a", json!(1)).await.unwrap();
        let mut rx = area.subscribe();

        area.clear().await.unwrap();
        assert!(area.is_empty());
        assert_eq!(rx.recv().await.unwrap().key, "a");
        assert_eq!(rx.recv().await.unwrap().key, "b");
    }

    #[tokio::test]
    async fn test_memory_remove_missing_is_silent() {
        let area = MemoryStorage::new();
        let mut rx = area.subscribe();
        area.remove("nothing").await.unwrap();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_file_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sync.json");
        let area = FileStorage::new(path.clone());

        assert_eq!(area.get("config").await.unwrap(), None);
        area.set("config", json!({"active": false})).await.unwrap();

        let reopened = FileStorage::new(path);
        assert_eq!(
            reopened.get("config").await.unwrap(),
            Some(json!({"active": false}))
        );

        let mut rx = reopened.subscribe();
        reopened.clear().await.unwrap();
        assert_eq!(area.get("config").await.unwrap(), None);
        let change = rx.recv().await.unwrap();
        assert_eq!(change.key, "config");
        assert_eq!(change.new_value, None);
    }

    #[tokio::test]
    async fn test_file_corrupt_is_serde_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "{not json").unwrap();
        let area = FileStorage::new(path);
        assert!(matches!(area.get("x").await, Err(StoreError::Serde(_))));
    }
}
