//! crates/course_manager_core/src/progress.rs
//!
//! Nested completion tracking per document -> module -> section.

use crate::domain::{Document, ProgressEntry, ProgressMap};
use crate::ports::{keys, read_json, read_json_for_update, write_json, PersistentStore, StoreResult};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

/// Upserts the completion flag of one section.
pub fn track_progress(
    store: &dyn PersistentStore,
    document_id: Uuid,
    module_id: Uuid,
    section_id: Uuid,
    completed: bool,
) -> StoreResult<()> {
    let key = keys::progress(document_id);
    let mut progress: ProgressMap = read_json_for_update(store, &key)?.unwrap_or_default();
    progress.entry(module_id).or_default().insert(
        section_id,
        ProgressEntry {
            completed,
            timestamp: Utc::now(),
        },
    );
    write_json(store, &key, &progress)?;
    debug!(
        "Section {} of document {} marked completed={}",
        section_id, document_id, completed
    );
    Ok(())
}

pub fn get_progress(store: &dyn PersistentStore, document_id: Uuid) -> ProgressMap {
    read_json(store, &keys::progress(document_id)).unwrap_or_default()
}

pub fn clear_progress(store: &dyn PersistentStore, document_id: Uuid) -> StoreResult<()> {
    store.remove(&keys::progress(document_id))
}

/// Percentage of the document's current sections that are completed.
pub fn calculate_progress(store: &dyn PersistentStore, document: &Document) -> u8 {
    completion_percentage(&get_progress(store, document.id), document)
}

/// Walks the document's current structure, so entries for sections that no
/// longer exist are never counted.
pub fn completion_percentage(progress: &ProgressMap, document: &Document) -> u8 {
    let total = document.section_count();
    if total == 0 {
        return 0;
    }
    let completed = document
        .sections()
        .filter(|(module, section)| {
            progress
                .get(&module.id)
                .and_then(|sections| sections.get(&section.id))
                .is_some_and(|entry| entry.completed)
        })
        .count();
    (100.0 * completed as f64 / total as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Module, Section, SectionType};
    use crate::memory::MemoryStore;

    fn course(modules: usize, sections: usize) -> Document {
        let mut doc = Document::new();
        for m in 0..modules {
            let mut module = Module::new(format!("Module {}", m + 1), "");
            for s in 0..sections {
                module
                    .sections
                    .push(Section::new(format!("Section {}", s + 1), SectionType::Video));
            }
            doc.modules.push(module);
        }
        doc
    }

    #[test]
    fn two_of_six_sections_is_thirty_three_percent() {
        let store = MemoryStore::new();
        let doc = course(2, 3);
        let first = &doc.modules[0];
        let second = &doc.modules[1];
        track_progress(&store, doc.id, first.id, first.sections[0].id, true).unwrap();
        track_progress(&store, doc.id, second.id, second.sections[2].id, true).unwrap();

        assert_eq!(calculate_progress(&store, &doc), 33);
    }

    #[test]
    fn unmarking_a_section_lowers_progress() {
        let store = MemoryStore::new();
        let doc = course(1, 2);
        let module = &doc.modules[0];
        track_progress(&store, doc.id, module.id, module.sections[0].id, true).unwrap();
        track_progress(&store, doc.id, module.id, module.sections[1].id, true).unwrap();
        assert_eq!(calculate_progress(&store, &doc), 100);

        track_progress(&store, doc.id, module.id, module.sections[1].id, false).unwrap();

        assert_eq!(calculate_progress(&store, &doc), 50);
        assert_eq!(get_progress(&store, doc.id)[&module.id].len(), 2);
    }

    #[test]
    fn removed_sections_are_ignored() {
        let store = MemoryStore::new();
        let mut doc = course(1, 2);
        let module_id = doc.modules[0].id;
        let removed = doc.modules[0].sections[1].id;
        track_progress(&store, doc.id, module_id, removed, true).unwrap();

        doc.modules[0].sections.remove(1);

        assert_eq!(calculate_progress(&store, &doc), 0);
    }

    #[test]
    fn corrupt_progress_is_not_overwritten() {
        let store = MemoryStore::new();
        let doc = course(1, 1);
        let module = &doc.modules[0];
        store.set(&keys::progress(doc.id), "{\"broken").unwrap();

        assert!(track_progress(&store, doc.id, module.id, module.sections[0].id, true).is_err());
        assert_eq!(
            store.get(&keys::progress(doc.id)).unwrap().as_deref(),
            Some("{\"broken")
        );
    }

    #[test]
    fn empty_document_is_zero_percent() {
        let store = MemoryStore::new();
        assert_eq!(calculate_progress(&store, &Document::new()), 0);
    }

    #[test]
    fn progress_is_kept_per_document() {
        let store = MemoryStore::new();
        let a = course(1, 1);
        let b = course(1, 1);
        track_progress(&store, a.id, a.modules[0].id, a.modules[0].sections[0].id, true).unwrap();

        assert_eq!(calculate_progress(&store, &a), 100);
        assert!(get_progress(&store, b.id).is_empty());

        clear_progress(&store, a.id).unwrap();
        assert!(get_progress(&store, a.id).is_empty());
    }
}
