//! crates/course_manager_core/src/domain.rs
//!
//! Defines the core data structures of a course document: the document itself,
//! its ordered modules and sections, saved versions, progress entries and the
//! typed edit operations the editor applies to a working copy.
//!
//! Field names serialize in camelCase so the persisted layout matches what the
//! editor UI reads back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

//=========================================================================================
// Enumerations
//=========================================================================================

/// Publication state of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Published,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Published => "published",
        }
    }
}

/// The kind of content a section holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Video,
    Problem,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Video => "video",
            SectionType::Problem => "problem",
        }
    }

    /// Exact, case-sensitive match on the stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(SectionType::Video),
            "problem" => Some(SectionType::Problem),
            _ => None,
        }
    }
}

//=========================================================================================
// Document Tree
//=========================================================================================

/// The top-level versioned entity: a course made of ordered modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub status: DocumentStatus,
    pub modules: Vec<Module>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
}

/// An ordered group of sections inside a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub sections: Vec<Section>,
    pub order: u32,
}

/// A single video or problem entry inside a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SectionType,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub order: u32,
    /// Weak reference to content stored outside this document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
}

impl Document {
    /// Creates an empty draft with a fresh identity at version 1.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            description: String::new(),
            category: String::new(),
            thumbnail: None,
            status: DocumentStatus::Draft,
            modules: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Iterates every section of every module, in document order.
    pub fn sections(&self) -> impl Iterator<Item = (&Module, &Section)> {
        self.modules
            .iter()
            .flat_map(|module| module.sections.iter().map(move |section| (module, section)))
    }

    pub fn section_count(&self) -> usize {
        self.modules.iter().map(|m| m.sections.len()).sum()
    }

    fn module_index(&self, module_id: Uuid) -> Result<usize, EditError> {
        self.modules
            .iter()
            .position(|m| m.id == module_id)
            .ok_or(EditError::ModuleNotFound(module_id))
    }

    fn module_mut(&mut self, module_id: Uuid) -> Result<&mut Module, EditError> {
        let index = self.module_index(module_id)?;
        Ok(&mut self.modules[index])
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Module {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            sections: Vec::new(),
            order: 1,
        }
    }

    fn section_index(&self, section_id: Uuid) -> Result<usize, EditError> {
        self.sections
            .iter()
            .position(|s| s.id == section_id)
            .ok_or(EditError::SectionNotFound {
                module_id: self.id,
                section_id,
            })
    }
}

impl Section {
    pub fn new(title: impl Into<String>, kind: SectionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            kind,
            description: String::new(),
            duration: None,
            order: 1,
            section_id: None,
        }
    }
}

//=========================================================================================
// Versions, Drafts and Progress
//=========================================================================================

/// A full snapshot of a document recorded by a manual save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: Uuid,
    pub document_id: Uuid,
    pub version: u32,
    pub data: Document,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// The value kept in the autosave slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveDraft {
    pub document: Document,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Completion flags for one document, keyed by module id then section id.
pub type ProgressMap = BTreeMap<Uuid, BTreeMap<Uuid, ProgressEntry>>;

//=========================================================================================
// Typed Edit Operations
//=========================================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditError {
    #[error("Module not found: {0}")]
    ModuleNotFound(Uuid),
    #[error("Section {section_id} not found in module {module_id}")]
    SectionNotFound { module_id: Uuid, section_id: Uuid },
}

/// An edit to a course working copy.
///
/// Structural edits (add, remove, move) renumber the affected sibling set so
/// `order` always runs 1..=n. Edits never touch identity, version or timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DocumentEdit {
    SetTitle { title: String },
    SetDescription { description: String },
    SetCategory { category: String },
    SetThumbnail { thumbnail: Option<String> },
    SetStatus { status: DocumentStatus },
    AddModule {
        title: String,
        #[serde(default)]
        description: String,
    },
    UpdateModule { module_id: Uuid, edit: ModuleEdit },
    RemoveModule { module_id: Uuid },
    MoveModule { module_id: Uuid, to_index: usize },
    AddSection {
        module_id: Uuid,
        title: String,
        #[serde(rename = "type")]
        kind: SectionType,
        #[serde(default)]
        description: String,
        #[serde(default)]
        duration: Option<String>,
    },
    UpdateSection {
        module_id: Uuid,
        section_id: Uuid,
        edit: SectionEdit,
    },
    RemoveSection { module_id: Uuid, section_id: Uuid },
    MoveSection {
        module_id: Uuid,
        section_id: Uuid,
        to_index: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ModuleEdit {
    SetTitle { title: String },
    SetDescription { description: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SectionEdit {
    SetTitle { title: String },
    SetDescription { description: String },
    SetType {
        #[serde(rename = "type")]
        kind: SectionType,
    },
    SetDuration { duration: Option<String> },
    SetSectionRef { section_id: Option<String> },
}

impl Document {
    /// Applies one edit. On error the document is left as it was.
    pub fn apply(&mut self, edit: DocumentEdit) -> Result<(), EditError> {
        match edit {
            DocumentEdit::SetTitle { title } => self.title = title,
            DocumentEdit::SetDescription { description } => self.description = description,
            DocumentEdit::SetCategory { category } => self.category = category,
            DocumentEdit::SetThumbnail { thumbnail } => self.thumbnail = thumbnail,
            DocumentEdit::SetStatus { status } => self.status = status,
            DocumentEdit::AddModule { title, description } => {
                self.modules.push(Module::new(title, description));
                renumber(&mut self.modules);
            }
            DocumentEdit::UpdateModule { module_id, edit } => {
                let module = self.module_mut(module_id)?;
                match edit {
                    ModuleEdit::SetTitle { title } => module.title = title,
                    ModuleEdit::SetDescription { description } => module.description = description,
                }
            }
            DocumentEdit::RemoveModule { module_id } => {
                let index = self.module_index(module_id)?;
                self.modules.remove(index);
                renumber(&mut self.modules);
            }
            DocumentEdit::MoveModule {
                module_id,
                to_index,
            } => {
                let index = self.module_index(module_id)?;
                move_item(&mut self.modules, index, to_index);
                renumber(&mut self.modules);
            }
            DocumentEdit::AddSection {
                module_id,
                title,
                kind,
                description,
                duration,
            } => {
                let module = self.module_mut(module_id)?;
                let mut section = Section::new(title, kind);
                section.description = description;
                section.duration = duration;
                module.sections.push(section);
                renumber(&mut module.sections);
            }
            DocumentEdit::UpdateSection {
                module_id,
                section_id,
                edit,
            } => {
                let module = self.module_mut(module_id)?;
                let index = module.section_index(section_id)?;
                let section = &mut module.sections[index];
                match edit {
                    SectionEdit::SetTitle { title } => section.title = title,
                    SectionEdit::SetDescription { description } => {
                        section.description = description
                    }
                    SectionEdit::SetType { kind } => section.kind = kind,
                    SectionEdit::SetDuration { duration } => section.duration = duration,
                    SectionEdit::SetSectionRef { section_id } => section.section_id = section_id,
                }
            }
            DocumentEdit::RemoveSection {
                module_id,
                section_id,
            } => {
                let module = self.module_mut(module_id)?;
                let index = module.section_index(section_id)?;
                module.sections.remove(index);
                renumber(&mut module.sections);
            }
            DocumentEdit::MoveSection {
                module_id,
                section_id,
                to_index,
            } => {
                let module = self.module_mut(module_id)?;
                let index = module.section_index(section_id)?;
                move_item(&mut module.sections, index, to_index);
                renumber(&mut module.sections);
            }
        }
        Ok(())
    }
}

//=========================================================================================
// Ordering Helpers
//=========================================================================================

/// Anything that carries a 1-based position among its siblings.
pub trait Ordered {
    fn set_order(&mut self, order: u32);
}

impl Ordered for Module {
    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

impl Ordered for Section {
    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

/// Rewrites `order` on the whole sibling set to 1..=n following slice position.
pub fn renumber<T: Ordered>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_order(index as u32 + 1);
    }
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_with_sections(count: usize) -> (Document, Uuid) {
        let mut doc = Document::new();
        doc.apply(DocumentEdit::AddModule {
            title: "Basics".to_string(),
            description: String::new(),
        })
        .unwrap();
        let module_id = doc.modules[0].id;
        for i in 0..count {
            doc.apply(DocumentEdit::AddSection {
                module_id,
                title: format!("Section {}", i + 1),
                kind: SectionType::Video,
                description: String::new(),
                duration: None,
            })
            .unwrap();
        }
        (doc, module_id)
    }

    fn orders(doc: &Document) -> Vec<u32> {
        doc.modules[0].sections.iter().map(|s| s.order).collect()
    }

    #[test]
    fn removing_a_section_renumbers_siblings_in_relative_order() {
        let (mut doc, module_id) = module_with_sections(4);
        let second = doc.modules[0].sections[1].id;

        doc.apply(DocumentEdit::RemoveSection {
            module_id,
            section_id: second,
        })
        .unwrap();

        let titles: Vec<&str> = doc.modules[0]
            .sections
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(orders(&doc), vec![1, 2, 3]);
        assert_eq!(titles, vec!["Section 1", "Section 3", "Section 4"]);
    }

    #[test]
    fn move_section_clamps_to_last_position() {
        let (mut doc, module_id) = module_with_sections(3);
        let first = doc.modules[0].sections[0].id;

        doc.apply(DocumentEdit::MoveSection {
            module_id,
            section_id: first,
            to_index: 99,
        })
        .unwrap();

        assert_eq!(doc.modules[0].sections[2].id, first);
        assert_eq!(orders(&doc), vec![1, 2, 3]);
    }

    #[test]
    fn move_module_renumbers_modules() {
        let mut doc = Document::new();
        for title in ["A", "B", "C"] {
            doc.apply(DocumentEdit::AddModule {
                title: title.to_string(),
                description: String::new(),
            })
            .unwrap();
        }
        let last = doc.modules[2].id;

        doc.apply(DocumentEdit::MoveModule {
            module_id: last,
            to_index: 0,
        })
        .unwrap();

        let titles: Vec<&str> = doc.modules.iter().map(|m| m.title.as_str()).collect();
        let orders: Vec<u32> = doc.modules.iter().map(|m| m.order).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn unknown_section_is_rejected_without_changes() {
        let (mut doc, module_id) = module_with_sections(2);
        let before = doc.clone();
        let missing = Uuid::new_v4();

        let err = doc
            .apply(DocumentEdit::RemoveSection {
                module_id,
                section_id: missing,
            })
            .unwrap_err();

        assert_eq!(
            err,
            EditError::SectionNotFound {
                module_id,
                section_id: missing
            }
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn edits_do_not_touch_identity_or_version() {
        let (mut doc, module_id) = module_with_sections(1);
        let section_id = doc.modules[0].sections[0].id;
        let (id, version, updated_at) = (doc.id, doc.version, doc.updated_at);

        doc.apply(DocumentEdit::SetTitle {
            title: "Rust 101".to_string(),
        })
        .unwrap();
        doc.apply(DocumentEdit::UpdateSection {
            module_id,
            section_id,
            edit: SectionEdit::SetType {
                kind: SectionType::Problem,
            },
        })
        .unwrap();

        assert_eq!(doc.title, "Rust 101");
        assert_eq!(doc.modules[0].sections[0].kind, SectionType::Problem);
        assert_eq!((doc.id, doc.version, doc.updated_at), (id, version, updated_at));
    }

    #[test]
    fn section_kind_serializes_under_type_key() {
        let section = Section::new("Intro", SectionType::Problem);
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["type"], "problem");
        assert!(json.get("sectionId").is_none());
    }

    #[test]
    fn edit_operations_deserialize_from_tagged_json() {
        let module_id = Uuid::new_v4();
        let json = serde_json::json!({
            "op": "add_section",
            "moduleId": module_id,
            "title": "Loops",
            "type": "video"
        });
        let edit: DocumentEdit = serde_json::from_value(json).unwrap();
        assert_eq!(
            edit,
            DocumentEdit::AddSection {
                module_id,
                title: "Loops".to_string(),
                kind: SectionType::Video,
                description: String::new(),
                duration: None,
            }
        );
    }
}
