use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::ValidationError;
use crate::services::TemplateError;

/// Startup configuration failures. All of them abort the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("Temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f32),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Failures turning an uploaded file into a request payload
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image file is empty")]
    Empty,

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Failures of a single digitize call.
///
/// Every kind is shown to the user through [`DigitizeError::describe`], so
/// they all read the same way regardless of where the call broke.
#[derive(Debug, Error)]
pub enum DigitizeError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned no content ({0})")]
    Blocked(String),

    #[error("response is not valid JSON: {0}")]
    MalformedResponse(String),

    #[error("response does not match the schema: {0}")]
    Validation(ValidationError),

    #[error("AI response did not include any downloadable files.")]
    EmptyResult,

    #[error("request was cancelled")]
    Cancelled,
}

impl DigitizeError {
    /// User-facing description with the shared prefix
    pub fn describe(&self) -> String {
        format!("Failed to digitize pattern: {self}")
    }

    /// Whether the remote call went through but its content was unusable
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            DigitizeError::MalformedResponse(_)
                | DigitizeError::Validation(_)
                | DigitizeError::EmptyResult
        )
    }
}

/// Failures writing a result to disk
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File {filename} has an invalid payload: {source}")]
    Decode {
        filename: String,
        #[source]
        source: EncodeError,
    },

    #[error("Failed to serialize metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Rejected state transitions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No image selected")]
    NoImageSelected,

    #[error("A digitize request is already in flight")]
    Busy,
}

/// Failures composing the tiled preview
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG decode error: {0}")]
    PngDecode(String),

    #[error("Unsupported tile count: {0}")]
    UnsupportedTileCount(u32),

    #[error("Failed to allocate pixmap")]
    PixmapAllocation,

    #[error("PNG encode error: {0}")]
    PngEncode(String),
}

/// HTTP-facing error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image selected")]
    NoImageSelected,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Not found")]
    NotFound,

    #[error("A digitize request is already in flight")]
    Busy,

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("{}", .0.describe())]
    Digitize(#[from] DigitizeError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NoImageSelected => ApiError::NoImageSelected,
            SessionError::Busy => ApiError::Busy,
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoImageSelected => StatusCode::BAD_REQUEST,
            ApiError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound => StatusCode::NOT_FOUND,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Busy => StatusCode::CONFLICT,
            ApiError::Encode(_) => StatusCode::BAD_REQUEST,
            ApiError::Digitize(e) if e.is_content_error() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Digitize(_) => StatusCode::BAD_GATEWAY,
            ApiError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
