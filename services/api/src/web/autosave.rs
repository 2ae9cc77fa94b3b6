//! services/api/src/web/autosave.rs
//!
//! Handlers controlling the autosave scheduler of the editing session. The
//! scheduler snapshots the working copy into the draft slot; it never touches
//! version history.

use crate::web::{
    protocol::{failure, ApiFailure, AutoSaveResponse, ErrorResponse, StartAutoSaveRequest},
    state::AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use std::time::Duration;

/// Arm autosave for the current editing session.
#[utoipa::path(
    post,
    path = "/autosave/start",
    request_body = StartAutoSaveRequest,
    responses(
        (status = 200, description = "Autosave armed", body = AutoSaveResponse),
        (status = 400, description = "Invalid interval", body = ErrorResponse)
    )
)]
pub async fn start_autosave_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartAutoSaveRequest>,
) -> Result<Json<AutoSaveResponse>, ApiFailure> {
    let interval = match req.interval_ms {
        Some(0) => {
            return Err(failure(
                StatusCode::BAD_REQUEST,
                "intervalMs must be greater than zero",
            ))
        }
        Some(ms) => Duration::from_millis(ms),
        None => state.config.autosave_interval,
    };
    state.start_autosave(interval);

    let (armed, status) = state.autosave_status();
    Ok(Json(AutoSaveResponse::new(armed, &status, None)))
}

/// Stop autosave. Must be called when the editor closes; repeated calls are fine.
#[utoipa::path(
    post,
    path = "/autosave/stop",
    responses((status = 204, description = "Autosave stopped"))
)]
pub async fn stop_autosave_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.stop_autosave();
    StatusCode::NO_CONTENT
}

/// Autosave state and the latest draft, if one exists.
#[utoipa::path(
    get,
    path = "/autosave",
    responses((status = 200, description = "Autosave state", body = AutoSaveResponse))
)]
pub async fn autosave_status_handler(State(state): State<Arc<AppState>>) -> Json<AutoSaveResponse> {
    let (armed, status) = state.autosave_status();
    let draft = state.manager.load_autosave().map(|d| d.document);
    Json(AutoSaveResponse::new(armed, &status, draft))
}
