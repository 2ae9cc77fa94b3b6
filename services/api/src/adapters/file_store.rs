//! services/api/src/adapters/file_store.rs
//!
//! This module contains the file-backed store, the concrete implementation of
//! the `PersistentStore` port used by the service. Each key is one JSON file in
//! the data directory, replaced atomically through a temp file and a rename.

use course_manager_core::ports::{PersistentStore, StorageError, StoreResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A directory of `<key>.json` files implementing the `PersistentStore` port.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    // Serializes writers; the autosave task and request handlers share one store.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens the store, creating the data directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| unavailable(&dir, e))?;
        info!("File store opened at {}", dir.display());
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Unavailable(format!(
                "'{}' is not a valid store key",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

fn unavailable(path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Unavailable(format!("{}: {}", path.display(), e))
}

//=========================================================================================
// `PersistentStore` Trait Implementation
//=========================================================================================

impl PersistentStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(unavailable(&path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::fs::write(&tmp, value).map_err(|e| unavailable(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| unavailable(&path, e))
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable(&path, e)),
        }
    }
}
