//! services/api/src/bin/api.rs

use api_lib::{
    adapters::FileStore,
    config::Config,
    error::ApiError,
    web::{
        autosave_status_handler, clear_versions_handler, edit_working_copy_handler,
        export_course_handler, get_progress_handler, get_working_copy_handler,
        import_course_handler, list_versions_handler, load_course_handler, put_progress_handler,
        put_working_copy_handler, reset_course_handler, restore_version_handler,
        rest::ApiDoc, save_course_handler, start_autosave_handler, state::AppState,
        stop_autosave_handler,
    },
};
use axum::http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method};
use axum::{
    routing::{get, post, put},
    Router,
};
use course_manager_core::CourseManager;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Course Store ---
    let store = Arc::new(FileStore::open(&config.data_dir)?);
    let manager = CourseManager::new(store);

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(manager, config.clone()));

    let origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    let api_router = Router::new()
        .route(
            "/course",
            get(load_course_handler).delete(reset_course_handler),
        )
        .route("/course/save", post(save_course_handler))
        .route(
            "/course/working",
            get(get_working_copy_handler).put(put_working_copy_handler),
        )
        .route("/course/working/edits", post(edit_working_copy_handler))
        .route("/course/export", get(export_course_handler))
        .route("/course/import", post(import_course_handler))
        .route(
            "/courses/{id}/versions",
            get(list_versions_handler).delete(clear_versions_handler),
        )
        .route("/versions/{version_id}/restore", post(restore_version_handler))
        .route(
            "/courses/{id}/progress",
            put(put_progress_handler).get(get_progress_handler),
        )
        .route("/autosave", get(autosave_status_handler))
        .route("/autosave/start", post(start_autosave_handler))
        .route("/autosave/stop", post(stop_autosave_handler))
        .layer(cors)
        .with_state(app_state.clone());

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // No draft write may outlive the server.
    app_state.stop_autosave();
    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
