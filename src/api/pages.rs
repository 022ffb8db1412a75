//! Server-rendered pages.
//!
//! Every form posts back and is answered with `303 See Other`, so reloading
//! the page never repeats an upload or a digitize request.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use super::headers::{attachment_disposition, quoted_etag, HeaderMapExt};
use super::upload::{input_error_message, is_input_error, read_image_field};
use crate::error::ApiError;
use crate::services::session::{SessionId, ViewMode};
use crate::services::template_service::PageContext;
use crate::services::{SessionManager, TemplateService};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub view: Option<ViewMode>,
}

fn page_url(id: &SessionId) -> String {
    format!("/s/{id}")
}

/// Start a new session and send the visitor to it
pub async fn handle_index(State(sessions): State<Arc<SessionManager>>) -> Redirect {
    let id = sessions.create().await;
    Redirect::to(&page_url(&id))
}

/// Render the page for the session's current state
pub async fn handle_page(
    State(sessions): State<Arc<SessionManager>>,
    State(templates): State<Arc<TemplateService>>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let id = SessionId::new(id);
    let session = match sessions.get(&id).await {
        Ok(session) => session,
        // Expired or unknown: start over
        Err(ApiError::SessionNotFound) => return Ok(Redirect::to("/").into_response()),
        Err(e) => return Err(e),
    };

    let mut session = session.lock().await;
    match query.view {
        Some(view) => session.set_view(view),
        None => session.touch(),
    }
    let page = PageContext::from_session(&session, Utc::now());
    drop(session);

    let html = templates.render_page(&page)?;
    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Html(html),
    )
        .into_response())
}

/// Select a new image from the upload form
pub async fn handle_select_image(
    State(sessions): State<Arc<SessionManager>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let id = SessionId::new(id);
    // Unknown sessions fail before the body is read
    sessions.get(&id).await?;

    match read_image_field(multipart).await {
        Ok(image) => sessions.select_image(&id, image).await?,
        Err(e) if is_input_error(&e) => {
            tracing::debug!(session = %id, error = %e, "Upload rejected");
            sessions.reject_input(&id, input_error_message(&e)).await?;
        }
        Err(e) => return Err(e),
    }
    Ok(Redirect::to(&page_url(&id)))
}

/// Start digitizing the selected image
pub async fn handle_start_digitize(
    State(sessions): State<Arc<SessionManager>>,
    Path(id): Path<String>,
) -> Result<Redirect, ApiError> {
    let id = SessionId::new(id);
    match sessions.start_digitize(&id).await {
        // The page polls for the outcome
        Ok(_task) => {}
        // The session already carries the inline message
        Err(ApiError::NoImageSelected) => {}
        // A double submit lands on the processing page
        Err(ApiError::Busy) => {}
        Err(e) => return Err(e),
    }
    Ok(Redirect::to(&page_url(&id)))
}

/// Serve the bytes of the current selection
pub async fn handle_preview(
    State(sessions): State<Arc<SessionManager>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let entry = sessions.preview(&SessionId::new(id)).await?;
    let etag = quoted_etag(&entry.etag);

    if headers.etag_matches(&entry.etag) {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    Ok((
        [
            (header::CONTENT_TYPE, entry.image.mime.as_str().to_string()),
            (header::CACHE_CONTROL, "private, no-cache".to_string()),
            (header::ETAG, etag),
        ],
        Body::from(entry.image.bytes.clone()),
    )
        .into_response())
}

/// Download one output file of the current result
pub async fn handle_download(
    State(sessions): State<Arc<SessionManager>>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Response, ApiError> {
    let session = sessions.get(&SessionId::new(id)).await?;
    let file = {
        let session = session.lock().await;
        session
            .result()
            .and_then(|data| data.files.get(index))
            .cloned()
            .ok_or(ApiError::NotFound)?
    };

    let bytes = file
        .decode()
        .map_err(|e| ApiError::Internal(format!("stored file is not valid base64: {e}")))?;

    tracing::debug!(filename = %file.filename, size = bytes.len(), "Serving download");
    Ok((
        [
            (header::CONTENT_TYPE, file.mime_type.as_str().to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&file.filename, file.mime_type),
            ),
        ],
        bytes,
    )
        .into_response())
}
