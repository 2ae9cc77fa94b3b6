//! crates/course_manager_core/src/ports.rs
//!
//! Defines the storage contract the core depends on. The store is a plain
//! key/value port, injected into every component, so the core stays independent
//! of where documents actually live (browser storage, files, memory in tests).

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;
use uuid::Uuid;

//=========================================================================================
// Storage Error and Result Types
//=========================================================================================

/// Failure of the underlying durable store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage quota exceeded while writing '{key}' ({needed} bytes needed, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// A convenience type alias for `Result<T, StorageError>`.
pub type StoreResult<T> = Result<T, StorageError>;

//=========================================================================================
// Store Port
//=========================================================================================

/// A synchronous key/value store holding serialized values.
pub trait PersistentStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Logical key layout. Each concern lives under its own key.
pub mod keys {
    use super::Uuid;

    /// The current document, written by manual saves.
    pub const COURSE_EDITOR: &str = "courseEditor";
    /// The autosave draft slot.
    pub const COURSE_AUTOSAVE: &str = "courseAutoSave";
    /// Map from document id to its capped version list.
    pub const COURSE_VERSIONS: &str = "courseVersions";

    pub fn progress(document_id: Uuid) -> String {
        format!("progress_{}", document_id)
    }
}

/// Reads and decodes a value. Read failures and corrupt content are logged and
/// reported as absent.
pub fn read_json<T: DeserializeOwned>(store: &dyn PersistentStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!("Failed to read '{}' from store: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unparseable content under '{}': {}", key, e);
            None
        }
    }
}

/// Reads and decodes a value ahead of a read-modify-write. Absent keys are
/// `Ok(None)`; content that cannot be decoded is an error, so a caller never
/// overwrites data it failed to understand.
pub fn read_json_for_update<T: DeserializeOwned>(
    store: &dyn PersistentStore,
    key: &str,
) -> StoreResult<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw).map(Some).map_err(|e| {
        warn!("Refusing to overwrite unparseable content under '{}': {}", key, e);
        StorageError::Serialization(format!("'{}' holds unparseable content: {}", key, e))
    })
}

/// Encodes and writes a value, propagating any failure.
pub fn write_json<T: Serialize>(
    store: &dyn PersistentStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let raw =
        serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
    store.set(key, &raw)
}
