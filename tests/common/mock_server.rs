//! Mock Gemini endpoint.

use serde_json::Value;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

use hoavan::models::GeminiConfig;

use super::fixtures;

pub const TEST_MODEL: &str = "gemini-2.5-flash";
pub const TEST_API_KEY: &str = "test-key";

/// Wrapper around wiremock MockServer with convenience methods
pub struct MockGemini {
    pub server: MockServer,
}

impl MockGemini {
    /// Start a new mock server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Client config pointing at this server
    pub fn config(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: TEST_API_KEY.to_string(),
            model: TEST_MODEL.to_string(),
            base_url: format!("{}/v1beta", self.server.uri()),
            timeout_secs: 5,
            ..GeminiConfig::default()
        }
    }

    fn endpoint() -> String {
        format!("/v1beta/models/{TEST_MODEL}:generateContent")
    }

    /// Respond with an envelope around `text`
    pub async fn respond_text(&self, text: &str) {
        self.respond_json(200, fixtures::gemini_envelope(text)).await;
    }

    /// Respond with the Navy Stripe pattern
    pub async fn respond_navy(&self) {
        self.respond_text(&fixtures::navy_pattern_json().to_string())
            .await;
    }

    /// Respond with an arbitrary JSON body
    pub async fn respond_json(&self, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(Self::endpoint()))
            .and(header("x-goog-api-key", TEST_API_KEY))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Respond with a plain-text error body
    pub async fn respond_error(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(Self::endpoint()))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Requests received so far
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// JSON body of the only request received
    pub async fn single_request_body(&self) -> Value {
        let requests = self.requests().await;
        assert_eq!(requests.len(), 1, "expected exactly one model request");
        serde_json::from_slice(&requests[0].body).expect("request body is JSON")
    }
}
