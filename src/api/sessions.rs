use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::upload::read_image_field;
use crate::error::ApiError;
use crate::services::session::{SessionId, SessionSnapshot};
use crate::services::SessionManager;

async fn snapshot(sessions: &SessionManager, id: &SessionId) -> Result<SessionSnapshot, ApiError> {
    let session = sessions.get(id).await?;
    let snapshot = session.lock().await.snapshot();
    Ok(snapshot)
}

/// Create a session
#[utoipa::path(
    post,
    path = "/api/sessions",
    responses(
        (status = 201, description = "Session created", body = SessionSnapshot),
    ),
    tag = "Sessions"
)]
pub async fn handle_create_session(
    State(sessions): State<Arc<SessionManager>>,
) -> Result<impl IntoResponse, ApiError> {
    let id = sessions.create().await;
    Ok((StatusCode::CREATED, Json(snapshot(&sessions, &id).await?)))
}

/// Current state of a session
///
/// Poll this after starting a digitize request; `state` moves from
/// `processing` to `result` or `errored`.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session state", body = SessionSnapshot),
        (status = 404, description = "Unknown session"),
    ),
    tag = "Sessions"
)]
pub async fn handle_get_session(
    State(sessions): State<Arc<SessionManager>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(snapshot(&sessions, &SessionId::new(id)).await?))
}

/// Select an image
///
/// Replaces any previous selection, discarding its result and cancelling a
/// request still in flight.
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/image",
    params(("id" = String, Path, description = "Session id")),
    request_body(content = super::upload::ImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image selected", body = SessionSnapshot),
        (status = 400, description = "Missing or unsupported image"),
        (status = 404, description = "Unknown session"),
    ),
    tag = "Sessions"
)]
pub async fn handle_session_image(
    State(sessions): State<Arc<SessionManager>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let id = SessionId::new(id);
    sessions.get(&id).await?;

    let image = read_image_field(multipart).await?;
    sessions.select_image(&id, image).await?;
    Ok(Json(snapshot(&sessions, &id).await?))
}

/// Start digitizing the selected image
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/digitize",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 202, description = "Request started", body = SessionSnapshot),
        (status = 400, description = "No image selected"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "A request is already in flight"),
    ),
    tag = "Sessions"
)]
pub async fn handle_session_digitize(
    State(sessions): State<Arc<SessionManager>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = SessionId::new(id);
    sessions.start_digitize(&id).await?;
    Ok((StatusCode::ACCEPTED, Json(snapshot(&sessions, &id).await?)))
}

/// Close a session, cancelling its request and releasing its preview
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown session"),
    ),
    tag = "Sessions"
)]
pub async fn handle_delete_session(
    State(sessions): State<Arc<SessionManager>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    sessions.close(&SessionId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
