//! Session persistence.
//!
//! A [`SessionStore`] is a small string key/value store. The client keeps a
//! single entry under [`STORAGE_KEY`](crate::STORAGE_KEY) whose presence marks
//! a previously authenticated user.
//!
//! # Implementations
//!
//! - [`InMemorySessionStore`] - Process-local, lost on exit
//! - [`FileSessionStore`] - JSON file on disk (feature `file-store`)

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::STORAGE_KEY;
use crate::error::StorageError;
use crate::types::SessionRecord;

// ============================================================================
// SessionStore Trait
// ============================================================================

/// Trait for session storage backends.
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl SessionStore for Arc<dyn SessionStore> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

// ============================================================================
// Session helpers
// ============================================================================

/// Read the session marker as untyped JSON.
///
/// Returns `None` when the key is absent, holds a falsy JSON value (`null`,
/// `false`, `0` or `""`), isn't JSON, or the store fails. Store failures are
/// logged and otherwise ignored.
pub fn read_session_marker(store: &dyn SessionStore) -> Option<Value> {
    let raw = match store.get(STORAGE_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session from store");
            return None;
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(value) if is_falsy(&value) => None,
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "Stored session is not JSON");
            None
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Load the typed session record.
pub fn load_session(store: &dyn SessionStore) -> Result<Option<SessionRecord>, StorageError> {
    match store.get(STORAGE_KEY)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Persist a session record.
pub fn save_session(store: &dyn SessionStore, record: &SessionRecord) -> Result<(), StorageError> {
    let raw = serde_json::to_string(record)?;
    store.set(STORAGE_KEY, &raw)
}

/// Remove the stored session.
pub fn clear_session(store: &dyn SessionStore) -> Result<(), StorageError> {
    store.remove(STORAGE_KEY)
}

// ============================================================================
// InMemorySessionStore
// ============================================================================

/// A store that lives only as long as the process.
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl std::fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.entries.read().map(|e| e.len()).unwrap_or_default();
        f.debug_struct("InMemorySessionStore")
            .field("entries", &len)
            .finish()
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with a session record.
    pub fn with_session(record: &SessionRecord) -> Result<Self, StorageError> {
        let store = Self::new();
        save_session(&store, record)?;
        Ok(store)
    }
}

fn poisoned() -> StorageError {
    StorageError::PathError("session store lock poisoned".to_string())
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// FileSessionStore
// ============================================================================

#[cfg(feature = "file-store")]
pub use file::FileSessionStore;

#[cfg(feature = "file-store")]
mod file {
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use super::{SessionStore, poisoned};
    use crate::error::StorageError;

    /// A store backed by a single JSON object on disk.
    ///
    /// Defaults to `<data_dir>/lens-kit/session.json`. On Unix the file is
    /// written with permissions 600.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use lens_kit::{FileSessionStore, Lens};
    ///
    /// let store = FileSessionStore::default_location().unwrap();
    /// let lens = Lens::mainnet().session_store(store).build();
    /// ```
    #[derive(Debug)]
    pub struct FileSessionStore {
        path: PathBuf,
        lock: Mutex<()>,
    }

    impl FileSessionStore {
        /// Use the file at `path`. It is created on first write.
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                lock: Mutex::new(()),
            }
        }

        /// Use `<data_dir>/lens-kit/session.json`.
        pub fn default_location() -> Result<Self, StorageError> {
            let dir = dirs::data_dir().ok_or_else(|| {
                StorageError::PathError("Could not determine data directory".to_string())
            })?;
            Ok(Self::new(dir.join("lens-kit").join("session.json")))
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
            match std::fs::read_to_string(&self.path) {
                Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
                Ok(content) => Ok(serde_json::from_str(&content)?),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
                Err(e) => Err(e.into()),
            }
        }

        fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
            }
            Ok(())
        }
    }

    impl SessionStore for FileSessionStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            let _guard = self.lock.lock().map_err(|_| poisoned())?;
            Ok(self.read_all()?.remove(key))
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let _guard = self.lock.lock().map_err(|_| poisoned())?;
            let mut entries = self.read_all()?;
            entries.insert(key.to_string(), value.to_string());
            self.write_all(&entries)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            let _guard = self.lock.lock().map_err(|_| poisoned())?;
            let mut entries = self.read_all()?;
            if entries.remove(key).is_some() {
                self.write_all(&entries)?;
            }
            Ok(())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
