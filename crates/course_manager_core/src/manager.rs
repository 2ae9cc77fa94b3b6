//! crates/course_manager_core/src/manager.rs
//!
//! The facade the editor UI talks to. It wires the validator, the version
//! history, the autosave scheduler, the import/export codec and progress
//! tracking around a single injected store.

use crate::autosave::{self, AutoSaveHandle, AutoSaveScheduler};
use crate::codec::{self, ExportFile, ImportError};
use crate::domain::{AutoSaveDraft, Document, DocumentStatus, ProgressMap, Version};
use crate::ports::{keys, read_json, write_json, PersistentStore, StorageError, StoreResult};
use crate::progress;
use crate::validation::{describe_errors, validate_document, FieldError};
use crate::versions::{self, describe_changes};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Why a manual save did not happen.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Document failed validation: {}", describe_errors(.0))]
    Invalid(Vec<FieldError>),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone)]
pub struct CourseManager {
    store: Arc<dyn PersistentStore>,
}

impl CourseManager {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PersistentStore> {
        &self.store
    }

    //=====================================================================================
    // Current Document
    //=====================================================================================

    /// A fresh, empty draft at version 1.
    pub fn new_document(&self) -> Document {
        Document::new()
    }

    /// Validates, bumps the version, writes the current-document slot and
    /// appends one entry to the version history. Nothing is written when
    /// validation fails, and the current-document slot is rolled back when the
    /// history write fails.
    pub fn save(&self, document: &Document, status: DocumentStatus) -> Result<Document, SaveError> {
        let mut next = document.clone();
        next.status = status;

        let errors = validate_document(&next);
        if !errors.is_empty() {
            info!(
                "Save of document {} blocked by {} validation errors",
                next.id,
                errors.len()
            );
            return Err(SaveError::Invalid(errors));
        }

        let previous = versions::version_history(self.store.as_ref(), next.id)
            .pop()
            .map(|v| v.data);

        next.version += 1;
        next.updated_at = Utc::now();
        let prior = self.store.get(keys::COURSE_EDITOR)?;
        write_json(self.store.as_ref(), keys::COURSE_EDITOR, &next)?;

        let label = match status {
            DocumentStatus::Published => "Published",
            DocumentStatus::Draft => "Saved draft",
        };
        let description = format!("{}: {}", label, describe_changes(previous.as_ref(), &next));
        if let Err(e) = versions::save_version(self.store.as_ref(), &next, &description) {
            self.restore_editor_slot(prior.as_deref());
            return Err(e.into());
        }

        info!(
            "Saved document {} as {} (version {})",
            next.id,
            status.as_str(),
            next.version
        );
        Ok(next)
    }

    // A save commits both the current-document slot and its history entry, or neither.
    fn restore_editor_slot(&self, prior: Option<&str>) {
        let rollback = match prior {
            Some(raw) => self.store.set(keys::COURSE_EDITOR, raw),
            None => self.store.remove(keys::COURSE_EDITOR),
        };
        match rollback {
            Ok(()) => warn!("History write failed, restored the previous saved document"),
            Err(e) => error!("Failed to restore the previous saved document: {}", e),
        }
    }

    /// The saved document, or a new empty draft when nothing usable is stored.
    pub fn load(&self) -> Document {
        self.load_saved().unwrap_or_else(|| {
            info!("No saved course found, starting a new document");
            Document::new()
        })
    }

    pub fn load_saved(&self) -> Option<Document> {
        read_json(self.store.as_ref(), keys::COURSE_EDITOR)
    }

    /// Forgets the current document and its draft. Version history and progress
    /// are kept under the old id.
    pub fn reset(&self) -> StoreResult<()> {
        self.store.remove(keys::COURSE_EDITOR)?;
        autosave::discard_autosave(self.store.as_ref())?;
        info!("Course editor reset");
        Ok(())
    }

    //=====================================================================================
    // Autosave
    //=====================================================================================

    pub fn start_autosave<F>(&self, interval: Duration, source: F) -> AutoSaveHandle
    where
        F: Fn() -> Option<Document> + Send + 'static,
    {
        AutoSaveScheduler::start(self.store.clone(), interval, source)
    }

    pub fn load_autosave(&self) -> Option<AutoSaveDraft> {
        autosave::load_autosave(self.store.as_ref())
    }

    pub fn discard_autosave(&self) -> StoreResult<()> {
        autosave::discard_autosave(self.store.as_ref())
    }

    //=====================================================================================
    // Version History
    //=====================================================================================

    pub fn version_history(&self, document_id: Uuid) -> Vec<Version> {
        versions::version_history(self.store.as_ref(), document_id)
    }

    pub fn restore_version(&self, version_id: Uuid) -> Option<Document> {
        versions::restore_version(self.store.as_ref(), version_id)
    }

    pub fn clear_version_history(&self, document_id: Uuid) -> StoreResult<()> {
        versions::clear_version_history(self.store.as_ref(), document_id)
    }

    //=====================================================================================
    // Import / Export
    //=====================================================================================

    pub fn export_document(&self, document: &Document) -> Result<ExportFile, serde_json::Error> {
        codec::export_document(document)
    }

    /// The imported document is not persisted until it is saved.
    pub fn import_document(&self, contents: &str) -> Result<Document, ImportError> {
        codec::import_document(contents)
    }

    //=====================================================================================
    // Progress
    //=====================================================================================

    pub fn track_progress(
        &self,
        document_id: Uuid,
        module_id: Uuid,
        section_id: Uuid,
        completed: bool,
    ) -> StoreResult<()> {
        progress::track_progress(
            self.store.as_ref(),
            document_id,
            module_id,
            section_id,
            completed,
        )
    }

    pub fn get_progress(&self, document_id: Uuid) -> ProgressMap {
        progress::get_progress(self.store.as_ref(), document_id)
    }

    pub fn clear_progress(&self, document_id: Uuid) -> StoreResult<()> {
        progress::clear_progress(self.store.as_ref(), document_id)
    }

    pub fn calculate_progress(&self, document: &Document) -> u8 {
        progress::calculate_progress(self.store.as_ref(), document)
    }
}
