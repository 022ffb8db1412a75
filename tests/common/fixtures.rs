//! Test fixtures and constants.

use base64::Engine;
use serde_json::{json, Value};

use hoavan::models::PatternData;

/// Smallest JPEG-looking payload the type sniffer accepts
pub const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00fabric";

/// PNG signature only; enough for previews and downloads
pub const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Pattern JSON as the model returns it: one Navy swatch and a PNG tile
pub fn navy_pattern_json() -> Value {
    json!({
        "analysis_summary": {
            "pattern_name": "Navy Stripe",
            "description": "Even navy stripes on a cream ground",
            "repeat_type": "straight",
            "fidelity_notes": "Wrinkles and perspective removed"
        },
        "tile_properties": {
            "dpi": 300,
            "width_px": 1200,
            "height_px": 1200,
            "width_cm": 10.16,
            "height_cm": 10.16
        },
        "color_palette": [
            { "name": "Navy", "hex": "#1B2A4A", "cmyk_approx": "C91 M79 Y0 K0" }
        ],
        "files": [
            {
                "filename": "tile.png",
                "mime_type": "image/png",
                "data": base64::engine::general_purpose::STANDARD.encode(PNG_SIGNATURE)
            }
        ]
    })
}

pub fn navy_pattern() -> PatternData {
    serde_json::from_value(navy_pattern_json()).expect("fixture matches PatternData")
}

/// `generateContent` response carrying `text` as the only part
pub fn gemini_envelope(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

/// Multipart body with a single `image` part; returns (boundary, body)
pub fn multipart_image(filename: &str, content_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "hoavan-test-boundary".to_string();
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    if !content_type.is_empty() {
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (boundary, body)
}
