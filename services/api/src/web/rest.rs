//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the course endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    autosave,
    protocol::{
        failure, field_failure, ApiFailure, AutoSaveResponse, ErrorResponse, ProgressResponse,
        ProgressUpdate, SaveRequest, StartAutoSaveRequest, VersionSummary,
    },
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use course_manager_core::{
    codec::EXPORT_CONTENT_TYPE, Document, DocumentEdit, ImportError, SaveError,
};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        load_course_handler,
        save_course_handler,
        reset_course_handler,
        get_working_copy_handler,
        put_working_copy_handler,
        edit_working_copy_handler,
        list_versions_handler,
        restore_version_handler,
        clear_versions_handler,
        export_course_handler,
        import_course_handler,
        put_progress_handler,
        get_progress_handler,
        autosave::start_autosave_handler,
        autosave::stop_autosave_handler,
        autosave::autosave_status_handler,
    ),
    components(
        schemas(
            SaveRequest,
            StartAutoSaveRequest,
            ProgressUpdate,
            ErrorResponse,
            VersionSummary,
            AutoSaveResponse,
            ProgressResponse
        )
    ),
    tags(
        (name = "Course Editor API", description = "Persistence, versioning and progress for the course editor.")
    )
)]
pub struct ApiDoc;

fn storage_failure(action: &str, e: impl std::fmt::Display) -> ApiFailure {
    error!("Failed to {}: {}", action, e);
    failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to {}; please retry", action),
    )
}

//=========================================================================================
// Current Document
//=========================================================================================

/// Load the saved course, or a new empty draft when none exists.
#[utoipa::path(
    get,
    path = "/course",
    responses((status = 200, description = "The current course document"))
)]
pub async fn load_course_handler(State(state): State<Arc<AppState>>) -> Json<Document> {
    Json(state.manager.load())
}

/// Validate and save a course, appending one entry to its version history.
#[utoipa::path(
    post,
    path = "/course/save",
    request_body = SaveRequest,
    responses(
        (status = 200, description = "Saved course with its new version number"),
        (status = 422, description = "Validation failed", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn save_course_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<Document>, ApiFailure> {
    match state.manager.save(&req.document, req.status) {
        Ok(saved) => {
            state.set_working_copy(Some(saved.clone()));
            Ok(Json(saved))
        }
        Err(SaveError::Invalid(errors)) => Err(field_failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Course failed validation",
            errors,
        )),
        Err(SaveError::Storage(e)) => Err(storage_failure("save course", e)),
    }
}

/// Forget the current course and its autosave draft. History is kept.
#[utoipa::path(
    delete,
    path = "/course",
    responses(
        (status = 204, description = "Editor reset"),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn reset_course_handler(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiFailure> {
    state
        .manager
        .reset()
        .map_err(|e| storage_failure("reset course", e))?;
    state.set_working_copy(None);
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Working Copy
//=========================================================================================

/// The document currently being edited, falling back to the saved course.
#[utoipa::path(
    get,
    path = "/course/working",
    responses((status = 200, description = "The working copy"))
)]
pub async fn get_working_copy_handler(State(state): State<Arc<AppState>>) -> Json<Document> {
    Json(state.working_copy_or_load())
}

/// Replace the working copy that autosave snapshots.
#[utoipa::path(
    put,
    path = "/course/working",
    request_body(content_type = "application/json", description = "The full course document."),
    responses((status = 204, description = "Working copy replaced"))
)]
pub async fn put_working_copy_handler(
    State(state): State<Arc<AppState>>,
    Json(document): Json<Document>,
) -> StatusCode {
    state.set_working_copy(Some(document));
    StatusCode::NO_CONTENT
}

/// Apply a list of edit operations to the working copy, all or nothing.
#[utoipa::path(
    post,
    path = "/course/working/edits",
    request_body(content_type = "application/json", description = "A list of tagged edit operations."),
    responses(
        (status = 200, description = "The edited working copy"),
        (status = 404, description = "No working copy, or an unknown module/section id", body = ErrorResponse)
    )
)]
pub async fn edit_working_copy_handler(
    State(state): State<Arc<AppState>>,
    Json(edits): Json<Vec<DocumentEdit>>,
) -> Result<Json<Document>, ApiFailure> {
    match state.edit_working_copy(edits) {
        Ok(Some(document)) => Ok(Json(document)),
        Ok(None) => Err(failure(StatusCode::NOT_FOUND, "No course is being edited")),
        Err(e) => Err(failure(StatusCode::NOT_FOUND, e.to_string())),
    }
}

//=========================================================================================
// Version History
//=========================================================================================

/// List the saved versions of a course, newest first.
#[utoipa::path(
    get,
    path = "/courses/{id}/versions",
    params(("id" = Uuid, Path, description = "The course id.")),
    responses((status = 200, description = "Version summaries", body = Vec<VersionSummary>))
)]
pub async fn list_versions_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<VersionSummary>> {
    let summaries = state
        .manager
        .version_history(id)
        .into_iter()
        .rev()
        .map(VersionSummary::from)
        .collect();
    Json(summaries)
}

/// Load a saved version as the working copy. Nothing is persisted until saved.
#[utoipa::path(
    post,
    path = "/versions/{version_id}/restore",
    params(("version_id" = Uuid, Path, description = "The version id.")),
    responses(
        (status = 200, description = "The restored snapshot"),
        (status = 404, description = "Unknown version", body = ErrorResponse)
    )
)]
pub async fn restore_version_handler(
    State(state): State<Arc<AppState>>,
    Path(version_id): Path<Uuid>,
) -> Result<Json<Document>, ApiFailure> {
    let document = state.manager.restore_version(version_id).ok_or_else(|| {
        failure(
            StatusCode::NOT_FOUND,
            format!("Version {} not found", version_id),
        )
    })?;
    info!("Restored version {} of document {}", version_id, document.id);
    state.set_working_copy(Some(document.clone()));
    Ok(Json(document))
}

/// Drop the version history of a course.
#[utoipa::path(
    delete,
    path = "/courses/{id}/versions",
    params(("id" = Uuid, Path, description = "The course id.")),
    responses(
        (status = 204, description = "History cleared"),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn clear_versions_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiFailure> {
    state
        .manager
        .clear_version_history(id)
        .map_err(|e| storage_failure("clear version history", e))?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Import / Export
//=========================================================================================

/// Download the working copy (or the saved course) as a portable file.
#[utoipa::path(
    get,
    path = "/course/export",
    responses(
        (status = 200, description = "The course file as an attachment"),
        (status = 404, description = "No course to export", body = ErrorResponse)
    )
)]
pub async fn export_course_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiFailure> {
    let document = state
        .working_copy()
        .or_else(|| state.manager.load_saved())
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "No course to export"))?;
    let file = state
        .manager
        .export_document(&document)
        .map_err(|e| storage_failure("export course", e))?;

    let headers = [
        (header::CONTENT_TYPE, EXPORT_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        ),
    ];
    Ok((headers, file.contents))
}

/// Import a course file as a brand new working copy with fresh ids.
#[utoipa::path(
    post,
    path = "/course/import",
    request_body(content_type = "application/json", description = "The contents of an exported course file."),
    responses(
        (status = 200, description = "The imported course, not yet saved"),
        (status = 400, description = "Unreadable or invalid file", body = ErrorResponse)
    )
)]
pub async fn import_course_handler(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<Document>, ApiFailure> {
    match state.manager.import_document(&body) {
        Ok(document) => {
            state.set_working_copy(Some(document.clone()));
            Ok(Json(document))
        }
        Err(ImportError::Invalid(errors)) => Err(field_failure(
            StatusCode::BAD_REQUEST,
            "Course file failed validation",
            errors,
        )),
        Err(e @ ImportError::Parse(_)) => Err(failure(StatusCode::BAD_REQUEST, e.to_string())),
    }
}

//=========================================================================================
// Progress
//=========================================================================================

/// Mark one section of a course as completed or not.
#[utoipa::path(
    put,
    path = "/courses/{id}/progress",
    params(("id" = Uuid, Path, description = "The course id.")),
    request_body = ProgressUpdate,
    responses(
        (status = 204, description = "Progress recorded"),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn put_progress_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(update): Json<ProgressUpdate>,
) -> Result<StatusCode, ApiFailure> {
    state
        .manager
        .track_progress(id, update.module_id, update.section_id, update.completed)
        .map_err(|e| storage_failure("record progress", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Progress entries of a course and its completion percentage.
#[utoipa::path(
    get,
    path = "/courses/{id}/progress",
    params(("id" = Uuid, Path, description = "The course id.")),
    responses((status = 200, description = "Progress of the course", body = ProgressResponse))
)]
pub async fn get_progress_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<ProgressResponse> {
    let document = state
        .working_copy()
        .filter(|d| d.id == id)
        .or_else(|| state.manager.load_saved().filter(|d| d.id == id));
    let percentage = document.map(|d| state.manager.calculate_progress(&d));

    Json(ProgressResponse {
        document_id: id,
        percentage,
        entries: state.manager.get_progress(id),
    })
}
