//! Upload intake and base64 encoding for the model request.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use std::fmt;
use std::path::Path;

use crate::error::EncodeError;

/// Image types the uploader accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Jpeg,
    Webp,
}

impl ImageMime {
    /// Value for the file input's `accept` attribute
    pub const ACCEPT: &'static str = "image/png, image/jpeg, image/webp";

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Webp => "image/webp",
        }
    }

    /// Parse a declared content type, ignoring parameters and case
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => Some(ImageMime::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageMime::Jpeg),
            "image/webp" => Some(ImageMime::Webp),
            _ => None,
        }
    }

    pub fn from_extension(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageMime::Png),
            "jpg" | "jpeg" => Some(ImageMime::Jpeg),
            "webp" => Some(ImageMime::Webp),
            _ => None,
        }
    }

    /// Detect the type from magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageMime::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageMime::Jpeg)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageMime::Webp)
        } else {
            None
        }
    }

    /// Resolve the type of an upload: declared type, then extension, then content.
    ///
    /// A generic declared type (`application/octet-stream`) falls through to
    /// the other checks; any other non-image declaration is rejected.
    pub fn resolve(
        declared: Option<&str>,
        filename: Option<&str>,
        bytes: &[u8],
    ) -> Result<Self, EncodeError> {
        if let Some(mime) = declared.filter(|m| !is_generic(m)) {
            return Self::from_mime(mime).ok_or_else(|| EncodeError::UnsupportedType(mime.to_string()));
        }

        filename
            .and_then(Self::from_extension)
            .or_else(|| Self::sniff(bytes))
            .ok_or_else(|| {
                EncodeError::UnsupportedType(
                    filename.unwrap_or("unknown").to_string(),
                )
            })
    }
}

fn is_generic(mime: &str) -> bool {
    let mime = mime.trim();
    mime.is_empty() || mime.eq_ignore_ascii_case("application/octet-stream")
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selected photo, as uploaded
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub filename: Option<String>,
    pub mime: ImageMime,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(
        filename: Option<String>,
        declared_mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self, EncodeError> {
        if bytes.is_empty() {
            return Err(EncodeError::Empty);
        }
        let mime = ImageMime::resolve(declared_mime, filename.as_deref(), &bytes)?;
        Ok(Self {
            filename,
            mime,
            bytes,
        })
    }
}

/// Payload ready for the model request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Standard base64, no data-URL prefix
    pub data: String,
    pub mime_type: String,
}

/// Encode an image for inline transmission
pub fn encode(image: &SourceImage) -> EncodedImage {
    EncodedImage {
        data: STANDARD.encode(&image.bytes),
        mime_type: image.mime.as_str().to_string(),
    }
}

/// Standard alphabet, padding optional on decode
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64 payload the way browsers read `data:` URLs: embedded
/// whitespace is ignored and trailing padding is optional.
pub fn decode(data: &str) -> Result<Vec<u8>, EncodeError> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(LENIENT.decode(compact)?)
}

/// Re-encode a leniently decodable payload as padded standard base64
pub fn canonicalize(data: &str) -> Result<String, EncodeError> {
    Ok(STANDARD.encode(decode(data)?))
}

/// Read an image file from disk
pub async fn read_image(path: &Path) -> Result<SourceImage, EncodeError> {
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string);

    tracing::debug!(path = %path.display(), size = bytes.len(), "Read source image");
    SourceImage::new(filename, None, bytes)
}
