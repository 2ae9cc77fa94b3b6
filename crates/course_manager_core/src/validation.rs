//! crates/course_manager_core/src/validation.rs
//!
//! Structural validation of course documents. Every rule is evaluated, so a
//! caller gets the complete list of violations in one pass. Validation only
//! reports; the caller decides whether to block persistence.

use crate::domain::{Document, SectionType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single violated rule, addressed by a field path such as `modules[0].sections[1].type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Joins a list of violations into one line, e.g. for an error message.
pub fn describe_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validates an untyped candidate, e.g. the parsed contents of an import file.
pub fn validate(candidate: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();

    require_text(&mut errors, "title", candidate.get("title"), "Title is required");
    require_text(
        &mut errors,
        "description",
        candidate.get("description"),
        "Description is required",
    );
    require_text(&mut errors, "category", candidate.get("category"), "Category is required");
    optional_text(&mut errors, "thumbnail", candidate.get("thumbnail"));
    if let Some(status) = present(candidate.get("status")) {
        let known = status
            .as_str()
            .is_some_and(|s| s == "draft" || s == "published");
        if !known {
            errors.push(FieldError::new(
                "status",
                "Status must be 'draft' or 'published'",
            ));
        }
    }

    let Some(modules) = candidate.get("modules").and_then(Value::as_array) else {
        errors.push(FieldError::new("modules", "Modules must be a list"));
        return errors;
    };

    for (i, module) in modules.iter().enumerate() {
        require_text(
            &mut errors,
            &format!("modules[{}].title", i),
            module.get("title"),
            "Module title is required",
        );
        optional_text(
            &mut errors,
            &format!("modules[{}].description", i),
            module.get("description"),
        );

        let Some(sections) = module.get("sections").and_then(Value::as_array) else {
            errors.push(FieldError::new(
                format!("modules[{}].sections", i),
                "Sections must be a list",
            ));
            continue;
        };

        for (j, section) in sections.iter().enumerate() {
            require_text(
                &mut errors,
                &format!("modules[{}].sections[{}].title", i, j),
                section.get("title"),
                "Section title is required",
            );
            let kind = section.get("type").and_then(Value::as_str);
            if kind.and_then(SectionType::parse).is_none() {
                errors.push(FieldError::new(
                    format!("modules[{}].sections[{}].type", i, j),
                    "Section type must be 'video' or 'problem'",
                ));
            }
            for field in ["description", "duration", "sectionId"] {
                optional_text(
                    &mut errors,
                    &format!("modules[{}].sections[{}].{}", i, j, field),
                    section.get(field),
                );
            }
        }
    }

    errors
}

/// Validates a typed document. Section types are guaranteed by the type system,
/// so only the text rules can fail here.
pub fn validate_document(document: &Document) -> Vec<FieldError> {
    let mut errors = Vec::new();

    check_text(&mut errors, "title", &document.title, "Title is required");
    check_text(&mut errors, "description", &document.description, "Description is required");
    check_text(&mut errors, "category", &document.category, "Category is required");

    for (i, module) in document.modules.iter().enumerate() {
        check_text(
            &mut errors,
            &format!("modules[{}].title", i),
            &module.title,
            "Module title is required",
        );
        for (j, section) in module.sections.iter().enumerate() {
            check_text(
                &mut errors,
                &format!("modules[{}].sections[{}].title", i, j),
                &section.title,
                "Section title is required",
            );
        }
    }

    errors
}

fn require_text(errors: &mut Vec<FieldError>, field: &str, value: Option<&Value>, message: &str) {
    let text = value.and_then(Value::as_str).unwrap_or_default();
    check_text(errors, field, text, message);
}

// Optional fields may be missing or null, but otherwise must be text.
fn optional_text(errors: &mut Vec<FieldError>, field: &str, value: Option<&Value>) {
    if present(value).is_some_and(|v| !v.is_string()) {
        errors.push(FieldError::new(field, "Must be text"));
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn check_text(errors: &mut Vec<FieldError>, field: &str, text: &str, message: &str) {
    if text.trim().is_empty() {
        errors.push(FieldError::new(field, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Module, Section};
    use serde_json::json;

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn reports_every_violation_not_just_the_first() {
        let candidate = json!({
            "title": "  ",
            "description": "",
            "category": null,
            "modules": [
                { "title": "Intro", "sections": [ { "title": "Essay", "type": "essay" } ] }
            ]
        });

        let errors = validate(&candidate);

        assert_eq!(
            fields(&errors),
            vec!["title", "description", "category", "modules[0].sections[0].type"]
        );
    }

    #[test]
    fn valid_candidate_has_no_errors() {
        let candidate = json!({
            "title": "Rust",
            "description": "Systems programming",
            "category": "programming",
            "modules": [
                { "title": "Ownership", "sections": [
                    { "title": "Borrowing", "type": "video" },
                    { "title": "Exercises", "type": "problem" }
                ] }
            ]
        });

        assert!(validate(&candidate).is_empty());
    }

    #[test]
    fn non_list_modules_skips_module_checks() {
        let candidate = json!({
            "title": "Rust",
            "description": "d",
            "category": "c",
            "modules": { "title": "" }
        });

        assert_eq!(fields(&validate(&candidate)), vec!["modules"]);
    }

    #[test]
    fn non_list_sections_is_reported_per_module() {
        let candidate = json!({
            "title": "Rust",
            "description": "d",
            "category": "c",
            "modules": [
                { "title": "", "sections": "none" },
                { "title": "Ok", "sections": [ { "title": "", "type": "Video" } ] }
            ]
        });

        assert_eq!(
            fields(&validate(&candidate)),
            vec![
                "modules[0].title",
                "modules[0].sections",
                "modules[1].sections[0].title",
                "modules[1].sections[0].type",
            ]
        );
    }

    #[test]
    fn optional_fields_must_be_text_and_status_known() {
        let candidate = json!({
            "title": "Rust",
            "description": "d",
            "category": "c",
            "thumbnail": null,
            "status": "archived",
            "modules": [
                { "title": "M", "description": null, "sections": [
                    { "title": "S", "type": "video", "duration": 300, "sectionId": null }
                ] },
                { "title": "N", "description": 7, "sections": [] }
            ]
        });

        assert_eq!(
            fields(&validate(&candidate)),
            vec![
                "status",
                "modules[0].sections[0].duration",
                "modules[1].description",
            ]
        );
    }

    #[test]
    fn typed_document_checks_nested_titles() {
        let mut doc = Document::new();
        doc.title = "Rust".to_string();
        doc.description = "d".to_string();
        doc.category = "c".to_string();
        let mut module = Module::new(" ", "");
        module.sections.push(Section::new("", crate::domain::SectionType::Video));
        doc.modules.push(module);

        let errors = validate_document(&doc);

        assert_eq!(
            fields(&errors),
            vec!["modules[0].title", "modules[0].sections[0].title"]
        );
        assert_eq!(errors[0].to_string(), "modules[0].title: Module title is required");
    }
}
