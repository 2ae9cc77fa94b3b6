//! services/api/src/web/state.rs
//!
//! Defines the application's shared state: the course manager, the editor's
//! working copy and the autosave scheduler that snapshots it.

use crate::config::Config;
use course_manager_core::{
    AutoSaveHandle, AutoSaveStatus, CourseManager, Document, DocumentEdit, EditError,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::info;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub manager: CourseManager,
    pub config: Arc<Config>,
    /// The unsaved document the editor is working on; autosave reads it.
    working: Arc<Mutex<Option<Document>>>,
    autosave: Mutex<Option<AutoSaveHandle>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn snapshot(working: &Mutex<Option<Document>>) -> Option<Document> {
    lock(working).clone()
}

impl AppState {
    /// Starts with the saved document, if any, as the working copy.
    pub fn new(manager: CourseManager, config: Arc<Config>) -> Self {
        let working = manager.load_saved();
        Self {
            manager,
            config,
            working: Arc::new(Mutex::new(working)),
            autosave: Mutex::new(None),
        }
    }

    //=====================================================================================
    // Working Copy
    //=====================================================================================

    pub fn working_copy(&self) -> Option<Document> {
        snapshot(&self.working)
    }

    /// The working copy, seeded from the saved course (or a new draft) when the
    /// editor has none yet, so repeated reads see the same document.
    pub fn working_copy_or_load(&self) -> Document {
        let mut working = lock(&self.working);
        working.get_or_insert_with(|| self.manager.load()).clone()
    }

    pub fn set_working_copy(&self, document: Option<Document>) {
        *lock(&self.working) = document;
    }

    /// Applies all edits or none. Returns `Ok(None)` when there is no working copy.
    pub fn edit_working_copy(&self, edits: Vec<DocumentEdit>) -> Result<Option<Document>, EditError> {
        let mut working = lock(&self.working);
        let Some(current) = working.as_ref() else {
            return Ok(None);
        };
        let mut next = current.clone();
        for edit in edits {
            next.apply(edit)?;
        }
        *working = Some(next.clone());
        Ok(Some(next))
    }

    //=====================================================================================
    // Autosave Lifecycle
    //=====================================================================================

    /// Arms autosave over the working copy, replacing any running scheduler.
    pub fn start_autosave(&self, interval: Duration) {
        let working = self.working.clone();
        let handle = self
            .manager
            .start_autosave(interval, move || snapshot(&working));
        if let Some(previous) = lock(&self.autosave).replace(handle) {
            previous.stop();
            info!("Replaced running autosave scheduler");
        }
    }

    pub fn stop_autosave(&self) {
        if let Some(handle) = lock(&self.autosave).take() {
            handle.stop();
        }
    }

    /// Whether autosave is armed, and the latest status it reported.
    pub fn autosave_status(&self) -> (bool, AutoSaveStatus) {
        match lock(&self.autosave).as_ref() {
            Some(handle) => (handle.is_armed(), handle.status().borrow().clone()),
            None => (false, AutoSaveStatus::Idle),
        }
    }
}
