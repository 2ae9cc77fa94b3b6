//! crates/course_manager_core/src/codec.rs
//!
//! Portable course files. Export writes the document plus envelope metadata;
//! import validates the file and rebuilds the document with fresh identities so
//! it can never collide with data already in the store.

use crate::domain::{Document, DocumentStatus, Module, Section, SectionType};
use crate::validation::{describe_errors, validate, FieldError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// Version of the export envelope layout.
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

pub const EXPORT_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Could not read course file: {0}")]
    Parse(String),
    #[error("Invalid course file: {}", describe_errors(.0))]
    Invalid(Vec<FieldError>),
}

/// A serialized course ready to be offered as a download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportEnvelope<'a> {
    #[serde(flatten)]
    document: &'a Document,
    exported_at: DateTime<Utc>,
    export_schema_version: u32,
}

/// Serializes a document for download. No validation is done here.
pub fn export_document(document: &Document) -> Result<ExportFile, serde_json::Error> {
    let exported_at = Utc::now();
    let envelope = ExportEnvelope {
        document,
        exported_at,
        export_schema_version: EXPORT_SCHEMA_VERSION,
    };
    let contents = serde_json::to_string_pretty(&envelope)?;
    let file_name = export_file_name(&document.title, exported_at.date_naive());
    info!("Exported document {} as {}", document.id, file_name);
    Ok(ExportFile {
        file_name,
        contents,
    })
}

/// `"Intro to Rust!"` exported on 2024-03-01 becomes `intro_to_rust_2024-03-01.json`.
pub fn export_file_name(title: &str, date: NaiveDate) -> String {
    let mut slug = String::new();
    let mut gap = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if gap && !slug.is_empty() {
                slug.push('_');
            }
            gap = false;
            slug.push(c);
        } else {
            gap = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("course");
    }
    format!("{}_{}.json", slug, date.format("%Y-%m-%d"))
}

//=========================================================================================
// Import
//=========================================================================================

// Identities, timestamps and version in the file are not read.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortableCourse {
    title: String,
    description: String,
    category: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    status: Option<DocumentStatus>,
    modules: Vec<PortableModule>,
}

#[derive(Deserialize)]
struct PortableModule {
    title: String,
    #[serde(default)]
    description: Option<String>,
    sections: Vec<PortableSection>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortableSection {
    title: String,
    #[serde(rename = "type")]
    kind: SectionType,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    section_id: Option<String>,
}

impl PortableCourse {
    fn into_document(self) -> Document {
        let now = Utc::now();
        let modules = self
            .modules
            .into_iter()
            .enumerate()
            .map(|(i, module)| Module {
                id: Uuid::new_v4(),
                title: module.title,
                description: module.description.unwrap_or_default(),
                sections: module
                    .sections
                    .into_iter()
                    .enumerate()
                    .map(|(j, section)| Section {
                        id: Uuid::new_v4(),
                        title: section.title,
                        kind: section.kind,
                        description: section.description.unwrap_or_default(),
                        duration: section.duration,
                        order: j as u32 + 1,
                        section_id: section.section_id,
                    })
                    .collect(),
                order: i as u32 + 1,
            })
            .collect();

        Document {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            category: self.category,
            thumbnail: self.thumbnail,
            status: self.status.unwrap_or_default(),
            modules,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }
}

/// Parses and validates a course file, returning a brand new document.
pub fn import_document(contents: &str) -> Result<Document, ImportError> {
    let candidate: Value =
        serde_json::from_str(contents).map_err(|e| ImportError::Parse(e.to_string()))?;

    let errors = validate(&candidate);
    if !errors.is_empty() {
        warn!("Rejected course file with {} validation errors", errors.len());
        return Err(ImportError::Invalid(errors));
    }

    let course: PortableCourse =
        serde_json::from_value(candidate).map_err(|e| ImportError::Parse(e.to_string()))?;
    let document = course.into_document();
    info!("Imported course as new document {}", document.id);
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.title = "Intro to Rust!".to_string();
        doc.description = "Ownership and borrowing".to_string();
        doc.category = "programming".to_string();
        doc.version = 7;
        let mut module = Module::new("Basics", "");
        let mut section = Section::new("Hello", SectionType::Video);
        section.section_id = Some("remote-42".to_string());
        module.sections.push(section);
        module.sections.push(Section::new("Practice", SectionType::Problem));
        doc.modules.push(module);
        doc
    }

    fn all_ids(doc: &Document) -> HashSet<Uuid> {
        let mut ids = HashSet::from([doc.id]);
        for module in &doc.modules {
            ids.insert(module.id);
            ids.extend(module.sections.iter().map(|s| s.id));
        }
        ids
    }

    #[test]
    fn file_name_is_sanitized_lowercase_title_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            export_file_name("Intro to Rust!", date),
            "intro_to_rust_2024-03-01.json"
        );
        assert_eq!(export_file_name("  ***  ", date), "course_2024-03-01.json");
    }

    #[test]
    fn export_carries_envelope_metadata() {
        let file = export_document(&sample()).unwrap();
        let json: Value = serde_json::from_str(&file.contents).unwrap();

        assert_eq!(json["exportSchemaVersion"], EXPORT_SCHEMA_VERSION);
        assert!(json["exportedAt"].is_string());
        assert_eq!(json["title"], "Intro to Rust!");
        assert_eq!(json["version"], 7);
        assert!(file.file_name.starts_with("intro_to_rust_"));
    }

    #[test]
    fn import_regenerates_every_identity() {
        let original = sample();
        let file = export_document(&original).unwrap();

        let imported = import_document(&file.contents).unwrap();

        assert!(all_ids(&imported).is_disjoint(&all_ids(&original)));
        assert_eq!(imported.version, 1);
        assert_eq!(imported.title, original.title);
        assert_eq!(imported.modules[0].sections[0].section_id.as_deref(), Some("remote-42"));
        assert!(imported.created_at >= original.created_at);
    }

    #[test]
    fn import_renumbers_orders_by_position() {
        let contents = r#"{
            "title": "T", "description": "D", "category": "C",
            "modules": [
                { "title": "B", "order": 9, "sections": [] },
                { "title": "A", "order": 3, "sections": [
                    { "title": "x", "type": "video", "order": 5 },
                    { "title": "y", "type": "problem", "order": 5 }
                ] }
            ]
        }"#;

        let doc = import_document(contents).unwrap();

        let module_orders: Vec<u32> = doc.modules.iter().map(|m| m.order).collect();
        let section_orders: Vec<u32> = doc.modules[1].sections.iter().map(|s| s.order).collect();
        assert_eq!(module_orders, vec![1, 2]);
        assert_eq!(section_orders, vec![1, 2]);
        assert_eq!(doc.status, DocumentStatus::Draft);
    }

    #[test]
    fn invalid_file_reports_all_field_errors() {
        let contents = r#"{
            "title": "", "description": "", "category": "C",
            "modules": [ { "title": "M", "sections": [ { "title": "s", "type": "essay" } ] } ]
        }"#;

        let err = import_document(contents).unwrap_err();

        match &err {
            ImportError::Invalid(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation failure, got {:?}", other),
        }
        let message = err.to_string();
        assert!(message.contains("title: Title is required"));
        assert!(message.contains("modules[0].sections[0].type"));
    }

    #[test]
    fn nulls_import_as_defaults_and_bad_optionals_are_field_errors() {
        let lenient = r#"{
            "title": "T", "description": "D", "category": "C", "status": null,
            "modules": [ { "title": "M", "description": null, "sections": [
                { "title": "s", "type": "video", "description": null }
            ] } ]
        }"#;
        let doc = import_document(lenient).unwrap();
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert_eq!(doc.modules[0].description, "");
        assert_eq!(doc.modules[0].sections[0].description, "");

        let strict = lenient.replace(r#""status": null"#, r#""status": "archived""#);
        match import_document(&strict) {
            Err(ImportError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "status");
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn unparseable_file_is_a_parse_error() {
        assert!(matches!(
            import_document("not json at all"),
            Err(ImportError::Parse(_))
        ));
    }
}
