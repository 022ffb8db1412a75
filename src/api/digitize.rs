use axum::{
    extract::{Multipart, State},
    response::Json,
};
use std::sync::Arc;

use super::upload::read_image_field;
use crate::error::ApiError;
use crate::models::PatternData;
use crate::services::digitizer::PatternDigitizer;
use crate::services::encoder;

/// Digitize a photo in a single call
///
/// Sends the photo to the model and returns the validated pattern. No
/// session is created; the request blocks until the model answers.
#[utoipa::path(
    post,
    path = "/api/digitize",
    request_body(content = super::upload::ImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Digitized pattern", body = PatternData),
        (status = 400, description = "Missing or unsupported image"),
        (status = 422, description = "Model response was unusable"),
        (status = 502, description = "Model call failed"),
    ),
    tag = "Digitize"
)]
pub async fn handle_digitize(
    State(digitizer): State<Arc<dyn PatternDigitizer>>,
    multipart: Multipart,
) -> Result<Json<PatternData>, ApiError> {
    let image = read_image_field(multipart).await?;
    let encoded = encoder::encode(&image);

    tracing::info!(
        mime = %image.mime,
        size = image.bytes.len(),
        "Stateless digitize request"
    );

    let pattern = digitizer.digitize(&encoded).await?;
    Ok(Json(pattern))
}
