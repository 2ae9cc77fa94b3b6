//! crates/course_manager_core/src/autosave.rs
//!
//! Periodic autosave into the draft slot. A running scheduler is owned through
//! the `AutoSaveHandle` returned by `start`; stopping or dropping the handle is
//! the only way to cancel it. Drafts never enter version history and never
//! change a document's version.

use crate::domain::{AutoSaveDraft, Document};
use crate::ports::{keys, read_json, write_json, PersistentStore, StoreResult};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delay between a draft write and reporting it as saved. Presentation only.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// What the UI shows about the latest autosave attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AutoSaveStatus {
    Idle,
    Saving,
    Saved { at: DateTime<Utc> },
    Failed { message: String },
}

pub struct AutoSaveScheduler;

impl AutoSaveScheduler {
    /// Arms a repeating autosave. The first tick fires one full `interval` after
    /// this call. `source` is asked for the current document on every tick.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(store: Arc<dyn PersistentStore>, interval: Duration, source: F) -> AutoSaveHandle
    where
        F: Fn() -> Option<Document> + Send + 'static,
    {
        // tokio rejects a zero period.
        let interval = interval.max(Duration::from_millis(1));
        let token = CancellationToken::new();
        let gate = Arc::new(Mutex::new(true));
        let (status_tx, status_rx) = watch::channel(AutoSaveStatus::Idle);

        tokio::spawn(run(
            store,
            interval,
            source,
            token.clone(),
            gate.clone(),
            status_tx,
        ));
        info!("Autosave armed every {:?}", interval);

        AutoSaveHandle {
            token,
            gate,
            status: status_rx,
        }
    }
}

/// Ownership of a running scheduler.
pub struct AutoSaveHandle {
    token: CancellationToken,
    gate: Arc<Mutex<bool>>,
    status: watch::Receiver<AutoSaveStatus>,
}

impl AutoSaveHandle {
    /// Cancels the scheduler. Idempotent. Once this returns no further draft
    /// write can happen, including a tick that was already due. If a draft write
    /// is in progress this blocks until that single store write finishes.
    pub fn stop(&self) {
        let mut armed = lock_gate(&self.gate);
        if *armed {
            *armed = false;
            self.token.cancel();
            info!("Autosave stopped");
        }
    }

    pub fn is_armed(&self) -> bool {
        *lock_gate(&self.gate)
    }

    pub fn status(&self) -> watch::Receiver<AutoSaveStatus> {
        self.status.clone()
    }
}

impl Drop for AutoSaveHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_gate(gate: &Mutex<bool>) -> MutexGuard<'_, bool> {
    gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run<F>(
    store: Arc<dyn PersistentStore>,
    interval: Duration,
    source: F,
    token: CancellationToken,
    gate: Arc<Mutex<bool>>,
    status: watch::Sender<AutoSaveStatus>,
) where
    F: Fn() -> Option<Document> + Send + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(document) = source() else {
            continue;
        };
        if !has_content(&document) {
            debug!("Autosave skipped: document {} has no content yet", document.id);
            continue;
        }

        // Only the write itself runs under the gate, so `stop` cannot return mid-write.
        let outcome = {
            let armed = lock_gate(&gate);
            if !*armed {
                break;
            }
            status.send_replace(AutoSaveStatus::Saving);
            write_draft(store.as_ref(), document)
        };

        match outcome {
            Ok(saved_at) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(SETTLE_DELAY) => {}
                }
                status.send_replace(AutoSaveStatus::Saved { at: saved_at });
            }
            Err(e) => {
                // A missed tick is not fatal; the next one tries again.
                warn!("Autosave failed: {}", e);
                status.send_replace(AutoSaveStatus::Failed {
                    message: e.to_string(),
                });
            }
        }
    }

    status.send_replace(AutoSaveStatus::Idle);
    debug!("Autosave task finished");
}

fn has_content(document: &Document) -> bool {
    !document.title.trim().is_empty() || !document.description.trim().is_empty()
}

fn write_draft(store: &dyn PersistentStore, document: Document) -> StoreResult<DateTime<Utc>> {
    let saved_at = Utc::now();
    let document_id = document.id;
    write_json(
        store,
        keys::COURSE_AUTOSAVE,
        &AutoSaveDraft { document, saved_at },
    )?;
    debug!("Autosaved draft of document {}", document_id);
    Ok(saved_at)
}

pub fn load_autosave(store: &dyn PersistentStore) -> Option<AutoSaveDraft> {
    read_json(store, keys::COURSE_AUTOSAVE)
}

pub fn discard_autosave(store: &dyn PersistentStore) -> StoreResult<()> {
    store.remove(keys::COURSE_AUTOSAVE)
}
