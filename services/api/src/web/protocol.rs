//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the editor UI and the API server.
//! Course documents themselves travel in the core's persisted layout.

use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use course_manager_core::{
    AutoSaveStatus, Document, DocumentStatus, FieldError, ProgressMap, Version,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Requests
//=========================================================================================

/// A manual save of the given document under the given status.
#[derive(Deserialize, Debug, ToSchema)]
pub struct SaveRequest {
    #[schema(value_type = Object)]
    pub document: Document,
    #[schema(value_type = String, example = "draft")]
    pub status: DocumentStatus,
}

/// Arms autosave. Without `intervalMs` the configured interval is used.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartAutoSaveRequest {
    pub interval_ms: Option<u64>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub module_id: Uuid,
    pub section_id: Uuid,
    pub completed: bool,
}

//=========================================================================================
// Responses
//=========================================================================================

/// Error body. `errors` lists field-level violations when there are any.
#[derive(Serialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[schema(value_type = Vec<Object>)]
    pub errors: Vec<FieldError>,
}

pub type ApiFailure = (StatusCode, Json<ErrorResponse>);

pub fn failure(status: StatusCode, message: impl Into<String>) -> ApiFailure {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
            errors: Vec::new(),
        }),
    )
}

pub fn field_failure(
    status: StatusCode,
    message: impl Into<String>,
    errors: Vec<FieldError>,
) -> ApiFailure {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
            errors,
        }),
    )
}

/// One entry of a version history listing, without the snapshot body.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: Uuid,
    pub document_id: Uuid,
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl From<Version> for VersionSummary {
    fn from(version: Version) -> Self {
        Self {
            id: version.id,
            document_id: version.document_id,
            version: version.version,
            timestamp: version.timestamp,
            description: version.description,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveResponse {
    pub armed: bool,
    /// One of `idle`, `saving`, `saved`, `failed`.
    pub status: String,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub draft: Option<Document>,
}

impl AutoSaveResponse {
    pub fn new(armed: bool, status: &AutoSaveStatus, draft: Option<Document>) -> Self {
        let (label, last_saved_at, message) = match status {
            AutoSaveStatus::Idle => ("idle", None, None),
            AutoSaveStatus::Saving => ("saving", None, None),
            AutoSaveStatus::Saved { at } => ("saved", Some(*at), None),
            AutoSaveStatus::Failed { message } => ("failed", None, Some(message.clone())),
        };
        Self {
            armed,
            status: label.to_string(),
            last_saved_at,
            message,
            draft,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub document_id: Uuid,
    /// Absent when no known document has this id.
    pub percentage: Option<u8>,
    #[schema(value_type = Object)]
    pub entries: ProgressMap,
}
