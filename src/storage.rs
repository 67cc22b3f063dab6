// Browser-style key/value storage
// Values are JSON documents stored under string keys. Writes are last-write-wins,
// there is a single writer per store.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

// Persisted keys
pub const SEARCH_DATA_KEY: &str = "searchData";
pub const LANGUAGE_KEY: &str = "language";
pub const BOOKINGS_KEY: &str = "bookings";
pub const CURRENT_BOOKING_KEY: &str = "currentBooking";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage quota exceeded: {used} + {requested} > {quota} bytes")]
    QuotaExceeded {
        used: usize,
        requested: usize,
        quota: usize,
    },

    #[error("Storage is disabled")]
    Unavailable,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Raw string storage, the equivalent of window.localStorage
pub trait KeyValueStore: Send + Sync + 'static {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Bytes an entry occupies against the quota
pub fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

// In-memory store with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    quota_bytes: Option<usize>,
    disabled: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    // Simulates a browser with storage turned off (private mode, policy)
    pub fn set_enabled(&self, enabled: bool) {
        self.disabled.store(!enabled, Ordering::SeqCst);
    }

    pub fn used_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry_size(entry.key(), entry.value()))
            .sum()
    }

    fn check_enabled(&self) -> Result<(), StorageError> {
        if self.disabled.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_enabled()?;
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.check_enabled()?;

        if let Some(quota) = self.quota_bytes {
            let replaced = self
                .entries
                .get(key)
                .map(|old| entry_size(key, &old))
                .unwrap_or(0);
            let used = self.used_bytes() - replaced;
            let requested = entry_size(key, &value);
            if used + requested > quota {
                return Err(StorageError::QuotaExceeded {
                    used,
                    requested,
                    quota,
                });
            }
        }

        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check_enabled()?;
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.check_enabled()?;
        self.entries.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// Store backed by a single JSON file, rewritten on every change
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    // Opens (or lazily creates) the file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };

        tracing::debug!(path = %path.display(), "Opened file storage");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(entries)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        let previous = entries.insert(key.to_string(), value);
        if let Err(err) = self.flush(&entries) {
            // Keep memory and disk in agreement
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        entries.clear();
        self.flush(&entries)
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// JSON view over a [`KeyValueStore`].
///
/// Failures never propagate out of the plain accessors: reads fall back to
/// `None`/the default and writes report `false`, with the cause logged. Use
/// [`Storage::try_set`] when the caller needs the error itself.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("entries", &self.backend.len())
            .finish()
    }
}

impl Storage {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(key, error = %err, "Storage read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "Discarding unreadable stored value");
                None
            }
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.backend.set_item(key, raw)
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.try_set(key, value) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key, error = %err, "Storage write failed");
                false
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.backend.remove_item(key) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key, error = %err, "Storage remove failed");
                false
            }
        }
    }

    pub fn clear(&self) -> bool {
        match self.backend.clear() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Storage clear failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip_through_memory_store() {
        let storage = Storage::in_memory();
        assert!(storage.set(LANGUAGE_KEY, "ar"));
        assert_eq!(storage.get::<String>(LANGUAGE_KEY).as_deref(), Some("ar"));
        assert_eq!(storage.backend().len(), 1);

        assert!(storage.remove(LANGUAGE_KEY));
        assert_eq!(storage.get::<String>(LANGUAGE_KEY), None);
    }

    #[test]
    fn test_unreadable_value_falls_back_to_default() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set_item(BOOKINGS_KEY, "{not json".to_string())
            .unwrap();
        let storage = Storage::new(backend);

        let bookings: Vec<String> = storage.get_or(BOOKINGS_KEY, Vec::new());
        assert!(bookings.is_empty());
    }

    #[test]
    fn test_quota_exceeded_reports_false_and_keeps_old_value() {
        let backend = Arc::new(MemoryStore::with_quota(32));
        let storage = Storage::new(backend.clone());

        assert!(storage.set("k", "short"));
        let oversized = "x".repeat(64);
        assert!(!storage.set("k", &oversized));
        assert_eq!(storage.get::<String>("k").as_deref(), Some("short"));

        match storage.try_set("k", &oversized) {
            Err(StorageError::QuotaExceeded { quota, .. }) => assert_eq!(quota, 32),
            other => panic!("expected quota error, got {:?}", other),
        }
    }

    #[test]
    fn test_quota_counts_replaced_entry_once() {
        let storage = Storage::new(Arc::new(MemoryStore::with_quota(20)));
        // "k" + "\"0123456789\"" = 13 bytes; rewriting the same key must not double count
        assert!(storage.set("k", "0123456789"));
        assert!(storage.set("k", "9876543210"));
    }

    #[test]
    fn test_disabled_storage_is_swallowed() {
        let backend = Arc::new(MemoryStore::new());
        let storage = Storage::new(backend.clone());
        assert!(storage.set("k", &1));

        backend.set_enabled(false);
        assert!(!storage.set("k", &2));
        assert_eq!(storage.get::<i32>("k"), None);
        assert!(!storage.remove("k"));
        assert!(!storage.clear());

        backend.set_enabled(true);
        assert_eq!(storage.get::<i32>("k"), Some(1));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage").join("local.json");

        {
            let storage = Storage::new(Arc::new(FileStore::open(&path).unwrap()));
            assert!(storage.set(LANGUAGE_KEY, "ar"));
            assert!(storage.set(SEARCH_DATA_KEY, &serde_json::json!({"adults": 3})));
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        let storage = Storage::new(Arc::new(reopened));
        assert_eq!(storage.get::<String>(LANGUAGE_KEY).as_deref(), Some("ar"));

        assert!(storage.clear());
        assert!(FileStore::open(&path).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, b"[1, 2").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StorageError::Serialization(_))
        ));
    }
}
