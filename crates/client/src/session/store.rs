//! Durable key/value storage shared by every session handle.
//!
//! This is where the bearer token and cached profile live. Any number of
//! [`Session`](super::Session)s may share one store, the way browser tabs
//! share `localStorage`; each write is announced to all of them as a
//! [`StorageChange`] tagged with the writing session.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use super::SessionId;

/// Capacity of the change channel before slow listeners start lagging.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Errors that can occur when persisting session data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("session storage I/O error at {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of strings.
    #[error("session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A durable key was written or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// The key that changed.
    pub key: String,
    /// Session that made the change.
    pub origin: SessionId,
}

/// Storage that outlives a single session handle.
///
/// Reads are served from memory and never block on I/O.
pub trait DurableStore: Send + Sync {
    /// Current value for `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key` and announce the change.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the value could not be persisted. The
    /// in-memory value is updated regardless.
    fn set(&self, key: &str, value: String, origin: SessionId) -> Result<(), StoreError>;

    /// Remove `key` and announce the change.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the removal could not be persisted.
    fn remove(&self, key: &str, origin: SessionId) -> Result<(), StoreError>;

    /// Listen for changes made through this store.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local durable store.
///
/// Wrap it in an `Arc` and hand it to several sessions to model several
/// tabs of one browser.
#[derive(Debug)]
pub struct MemoryDurableStore {
    values: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryDurableStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            values: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn announce(&self, key: &str, origin: SessionId) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            origin,
        });
    }
}

impl Default for MemoryDurableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableStore for MemoryDurableStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String, origin: SessionId) -> Result<(), StoreError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        self.announce(key, origin);
        Ok(())
    }

    fn remove(&self, key: &str, origin: SessionId) -> Result<(), StoreError> {
        let removed = self
            .values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        if removed.is_some() {
            self.announce(key, origin);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// Durable store persisted as a JSON object in a single file.
///
/// The file is loaded once at open; every write rewrites it atomically
/// (temp file + rename). Changes are announced within this process only.
#[derive(Debug)]
pub struct FileDurableStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<StorageChange>,
}

impl FileDurableStore {
    /// Open the store at `path`, creating it lazily on first write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file exists but cannot be read or parsed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = load_map(&path)?;
        debug!(keys = values.len(), "Loaded durable session store");

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            values: RwLock::new(values),
            changes,
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<(), StoreError> {
        write_map(&self.path, values)
    }
}

impl DurableStore for FileDurableStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String, origin: SessionId) -> Result<(), StoreError> {
        let result = {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            values.insert(key.to_string(), value);
            self.persist(&values)
        };
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            origin,
        });
        result
    }

    fn remove(&self, key: &str, origin: SessionId) -> Result<(), StoreError> {
        let result = {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            if values.remove(key).is_none() {
                return Ok(());
            }
            self.persist(&values)
        };
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            origin,
        });
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// Read a JSON string map, treating a missing file as empty.
pub(crate) fn load_map(path: &Path) -> Result<HashMap<String, String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Atomically replace `path` with the JSON form of `values`.
pub(crate) fn write_map(path: &Path, values: &HashMap<String, String>) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_vec_pretty(values)?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(&json).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
    }
    fs::rename(&tmp, path).map_err(io_err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryDurableStore::new();
        let origin = SessionId::new();
        store.set("k", "v".to_string(), origin).unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k", origin).unwrap();
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_memory_store_announces_changes() {
        let store = MemoryDurableStore::new();
        let mut rx = store.subscribe();
        let origin = SessionId::new();

        store.set("greenshoes_token", "t".to_string(), origin).unwrap();
        let change = rx.try_recv().unwrap();
        assert_eq!(change.key, "greenshoes_token");
        assert_eq!(change.origin, origin);
    }

    #[test]
    fn test_removing_missing_key_is_silent() {
        let store = MemoryDurableStore::new();
        let mut rx = store.subscribe();
        store.remove("absent", SessionId::new()).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let origin = SessionId::new();

        let store = FileDurableStore::open(&path).unwrap();
        store.set("greenshoes_token", "abc".to_string(), origin).unwrap();
        drop(store);

        let reopened = FileDurableStore::open(&path).unwrap();
        assert_eq!(reopened.get("greenshoes_token").as_deref(), Some("abc"));

        reopened.remove("greenshoes_token", origin).unwrap();
        let again = FileDurableStore::open(&path).unwrap();
        assert_eq!(again.get("greenshoes_token"), None);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            FileDurableStore::open(&path),
            Err(StoreError::Corrupt(_))
        ));
    }
}
