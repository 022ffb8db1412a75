//! Header helpers for preview and download responses.

use axum::http::{header, HeaderMap};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::models::FileMime;
use crate::services::export::safe_filename;

/// RFC 5987 `attr-char` set, minus the characters that need no escaping
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// Extension trait for convenient header parsing.
pub trait HeaderMapExt {
    /// Get a header value as a string, returning None if missing.
    fn get_str(&self, name: &str) -> Option<&str>;

    /// Whether `If-None-Match` lists the given (unquoted) entity tag.
    fn etag_matches(&self, etag: &str) -> bool;
}

impl HeaderMapExt for HeaderMap {
    fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    fn etag_matches(&self, etag: &str) -> bool {
        let Some(value) = self.get_str(header::IF_NONE_MATCH.as_str()) else {
            return false;
        };
        value.split(',').map(str::trim).any(|candidate| {
            candidate == "*"
                || candidate.trim_start_matches("W/").trim_matches('"') == etag
        })
    }
}

/// Quoted strong entity tag
pub fn quoted_etag(etag: &str) -> String {
    format!("\"{etag}\"")
}

/// `Content-Disposition` for a download.
///
/// Carries a sanitized ASCII `filename` and the original name as UTF-8
/// `filename*`.
pub fn attachment_disposition(filename: &str, mime: FileMime) -> String {
    let ascii = safe_filename(filename, "download", mime);
    let original = filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(&ascii);
    format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
        utf8_percent_encode(original, FILENAME_ENCODE_SET)
    )
}
