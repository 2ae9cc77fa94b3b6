//! crates/course_manager_core/src/versions.rs
//!
//! Capped, append-only version history. Every document id owns a list of at most
//! `MAX_VERSIONS` snapshots, oldest first; appending past the cap evicts the
//! oldest entries. All lists share a single store key.

use crate::domain::{Document, Version};
use crate::ports::{
    keys, read_json, read_json_for_update, write_json, PersistentStore, StoreResult,
};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Number of snapshots retained per document.
pub const MAX_VERSIONS: usize = 10;

type VersionIndex = BTreeMap<Uuid, Vec<Version>>;

fn load_index(store: &dyn PersistentStore) -> VersionIndex {
    read_json(store, keys::COURSE_VERSIONS).unwrap_or_default()
}

// Every document shares the index, so a write must start from content that decoded.
fn load_index_for_update(store: &dyn PersistentStore) -> StoreResult<VersionIndex> {
    Ok(read_json_for_update(store, keys::COURSE_VERSIONS)?.unwrap_or_default())
}

/// Appends a deep copy of `document` to its history and trims the list to the cap.
pub fn save_version(
    store: &dyn PersistentStore,
    document: &Document,
    description: &str,
) -> StoreResult<Version> {
    let mut index = load_index_for_update(store)?;
    let history = index.entry(document.id).or_default();

    let version = Version {
        id: Uuid::new_v4(),
        document_id: document.id,
        version: document.version,
        data: document.clone(),
        timestamp: Utc::now(),
        description: description.to_string(),
    };
    history.push(version.clone());
    if history.len() > MAX_VERSIONS {
        let excess = history.len() - MAX_VERSIONS;
        history.drain(..excess);
    }
    let retained = history.len();

    write_json(store, keys::COURSE_VERSIONS, &index)?;
    debug!(
        "Recorded version {} of document {} ({} retained)",
        version.version, document.id, retained
    );
    Ok(version)
}

/// The history of one document, oldest first. Empty when none exists.
pub fn version_history(store: &dyn PersistentStore, document_id: Uuid) -> Vec<Version> {
    load_index(store).remove(&document_id).unwrap_or_default()
}

/// Looks a version id up across every tracked document and returns a copy of its
/// snapshot. Nothing is written; persisting the result is the caller's choice.
pub fn restore_version(store: &dyn PersistentStore, version_id: Uuid) -> Option<Document> {
    load_index(store)
        .into_values()
        .flatten()
        .find(|v| v.id == version_id)
        .map(|v| v.data)
}

pub fn clear_version_history(store: &dyn PersistentStore, document_id: Uuid) -> StoreResult<()> {
    let mut index = load_index_for_update(store)?;
    if index.remove(&document_id).is_some() {
        write_json(store, keys::COURSE_VERSIONS, &index)?;
        info!("Cleared version history of document {}", document_id);
    }
    Ok(())
}

/// Builds a short human-readable summary from field and count comparisons.
pub fn describe_changes(previous: Option<&Document>, current: &Document) -> String {
    let Some(previous) = previous else {
        return "Initial version".to_string();
    };

    let mut changes = Vec::new();
    if previous.title != current.title {
        changes.push("title updated".to_string());
    }
    if previous.description != current.description {
        changes.push("description updated".to_string());
    }
    if previous.category != current.category {
        changes.push("category updated".to_string());
    }
    if previous.status != current.status {
        changes.push(format!("status changed to {}", current.status.as_str()));
    }
    if let Some(delta) = count_delta(previous.modules.len(), current.modules.len(), "module") {
        changes.push(delta);
    }
    if let Some(delta) = count_delta(previous.section_count(), current.section_count(), "section")
    {
        changes.push(delta);
    }

    if changes.is_empty() {
        "No structural changes".to_string()
    } else {
        changes.join(", ")
    }
}

fn count_delta(before: usize, after: usize, noun: &str) -> Option<String> {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    if after > before {
        let n = after - before;
        Some(format!("{} {}{} added", n, noun, plural(n)))
    } else if before > after {
        let n = before - after;
        Some(format!("{} {}{} removed", n, noun, plural(n)))
    } else {
        None
    }
}
