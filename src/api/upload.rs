//! Multipart image extraction shared by the page and JSON endpoints.

use axum::extract::Multipart;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ApiError, EncodeError};
use crate::services::encoder::SourceImage;
use crate::ui_text;

/// Form field carrying the photo
pub const IMAGE_FIELD: &str = "image";

/// Multipart form with a single photo
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageUpload {
    /// PNG, JPEG or WEBP photo of the fabric
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// Read the `image` field of a multipart form.
///
/// Browsers send an empty, unnamed part when no file was chosen; that is
/// reported as [`ApiError::NoImageSelected`].
pub async fn read_image_field(mut multipart: Multipart) -> Result<SourceImage, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidUpload(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty());
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidUpload(e.body_text()))?;

        if bytes.is_empty() && filename.is_none() {
            return Err(ApiError::NoImageSelected);
        }

        tracing::debug!(
            filename = filename.as_deref().unwrap_or("-"),
            content_type = content_type.as_deref().unwrap_or("-"),
            size = bytes.len(),
            "Received image upload"
        );

        return Ok(SourceImage::new(
            filename,
            content_type.as_deref(),
            bytes.to_vec(),
        )?);
    }

    Err(ApiError::NoImageSelected)
}

/// Inline Vietnamese message for a rejected upload
pub fn input_error_message(error: &ApiError) -> &'static str {
    match error {
        ApiError::NoImageSelected => ui_text::NO_IMAGE_SELECTED,
        ApiError::Encode(EncodeError::UnsupportedType(_)) => ui_text::UNSUPPORTED_IMAGE,
        ApiError::Encode(_) | ApiError::InvalidUpload(_) => ui_text::INVALID_UPLOAD,
        _ => ui_text::UNKNOWN_ERROR,
    }
}

/// Whether an upload failure is the visitor's input rather than ours
pub fn is_input_error(error: &ApiError) -> bool {
    matches!(
        error,
        ApiError::NoImageSelected | ApiError::InvalidUpload(_) | ApiError::Encode(_)
    )
}
