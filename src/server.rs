//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::{DefaultBodyLimit, FromRef, Path},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::api;
use crate::assets::AssetLoader;
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::services::{GeminiClient, PatternDigitizer, SessionManager, TemplateService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionManager>,
    pub templates: Arc<TemplateService>,
    pub digitizer: Arc<dyn PatternDigitizer>,
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<SessionManager> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<TemplateService> {
    fn from_ref(state: &AppState) -> Self {
        state.templates.clone()
    }
}

impl FromRef<AppState> for Arc<dyn PatternDigitizer> {
    fn from_ref(state: &AppState) -> Self {
        state.digitizer.clone()
    }
}

/// Create application state backed by the Gemini client.
pub fn create_app_state(config: AppConfig, loader: AssetLoader) -> anyhow::Result<AppState> {
    let digitizer = GeminiClient::new(&config.gemini)
        .map_err(|e| anyhow::anyhow!("Failed to create model client: {e}"))?;
    create_app_state_with_digitizer(config, loader, Arc::new(digitizer))
}

/// Create application state with any digitizer (tests use stubs).
pub fn create_app_state_with_digitizer(
    config: AppConfig,
    loader: AssetLoader,
    digitizer: Arc<dyn PatternDigitizer>,
) -> anyhow::Result<AppState> {
    let templates = Arc::new(TemplateService::new(loader)?);
    let sessions = Arc::new(SessionManager::new(digitizer.clone()));

    Ok(AppState {
        config: Arc::new(config),
        sessions,
        templates,
        digitizer,
    })
}

/// Build the router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_bytes;

    Router::new()
        // Pages
        .route("/", get(api::handle_index))
        .route("/s/:id", get(api::handle_page))
        .route("/s/:id/image", post(api::handle_select_image))
        .route("/s/:id/digitize", post(api::handle_start_digitize))
        .route("/s/:id/preview", get(api::handle_preview))
        .route("/s/:id/files/:index", get(api::handle_download))
        // JSON API
        .route("/api/sessions", post(api::handle_create_session))
        .route(
            "/api/sessions/:id",
            get(api::handle_get_session).delete(api::handle_delete_session),
        )
        .route("/api/sessions/:id/image", post(api::handle_session_image))
        .route(
            "/api/sessions/:id/digitize",
            post(api::handle_session_digitize),
        )
        .route("/api/digitize", post(api::handle_digitize))
        // Static assets
        .route("/static/:name", get(handle_static))
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Add state and tracing
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
}

async fn handle_static(Path(name): Path<String>) -> Response {
    let Some(data) = AssetLoader::read_static(&name) else {
        return ApiError::NotFound.into_response();
    };
    let content_type = match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        _ => "application/octet-stream",
    };
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        data.into_owned(),
    )
        .into_response()
}
