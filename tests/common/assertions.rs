//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status,
        expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert a `303 See Other` to the given location
pub fn assert_redirect(response: &TestResponse, location: &str) {
    assert_status(response, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), location);
}

/// Assert a JSON error body with the given status
pub fn assert_json_error(response: &TestResponse, expected: StatusCode) -> String {
    assert_status(response, expected);
    let json: serde_json::Value = response.json();
    assert_eq!(
        json["status"].as_u64(),
        Some(expected.as_u16() as u64),
        "Full response: {}",
        serde_json::to_string_pretty(&json).unwrap()
    );
    json["error"]
        .as_str()
        .expect("error message")
        .to_string()
}

/// Assert the response is an HTML page containing every snippet
pub fn assert_page_contains(response: &TestResponse, snippets: &[&str]) {
    assert_ok(response);
    let html = response.text();
    for snippet in snippets {
        assert!(
            html.contains(snippet),
            "Expected page to contain {snippet:?}. Page:\n{html}"
        );
    }
}

/// The opening tag of the first element whose markup contains `marker`
pub fn element_tag<'a>(html: &'a str, marker: &str) -> &'a str {
    let at = html
        .find(marker)
        .unwrap_or_else(|| panic!("no element matching {marker:?} in page:\n{html}"));
    let start = html[..at].rfind('<').expect("tag start");
    let end = at + html[at..].find('>').expect("tag end");
    &html[start..=end]
}

/// Assert the file input and the digitize button accept interaction
pub fn assert_uploader_interactive(response: &TestResponse) {
    assert_ok(response);
    let html = response.text();
    for marker in [r#"id="image-input""#, r#"class="primary""#] {
        let tag = element_tag(&html, marker);
        assert!(!tag.contains("disabled"), "Expected {tag} to be enabled");
    }
    assert!(!html.contains(r#"class="dropzone disabled""#));
}
