//! Test application factory for integration tests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower::ServiceExt;

use hoavan::assets::AssetLoader;
use hoavan::error::DigitizeError;
use hoavan::models::{AppConfig, GeminiConfig, PatternData};
use hoavan::server::{build_router, create_app_state, create_app_state_with_digitizer, AppState};
use hoavan::services::{EncodedImage, PatternDigitizer, SessionId, SessionManager, SessionState};

use super::fixtures;

/// Canned digitizer outcome
#[derive(Clone)]
pub enum StubOutcome {
    Pattern(PatternData),
    Status(u16, &'static str),
    Empty,
}

/// Digitizer returning a fixed outcome, optionally held until released
pub struct StubDigitizer {
    outcome: StubOutcome,
    gate: Option<Notify>,
    pub calls: AtomicUsize,
}

impl StubDigitizer {
    pub fn returning(outcome: StubOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            gate: None,
            calls: AtomicUsize::new(0),
        })
    }

    /// Waits for [`StubDigitizer::release`] before answering
    pub fn gated(outcome: StubOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            gate: Some(Notify::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PatternDigitizer for StubDigitizer {
    async fn digitize(&self, _image: &EncodedImage) -> Result<PatternData, DigitizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.outcome {
            StubOutcome::Pattern(p) => Ok(p.clone()),
            StubOutcome::Status(status, body) => Err(DigitizeError::Status {
                status: *status,
                body: body.to_string(),
            }),
            StubOutcome::Empty => Err(DigitizeError::EmptyResult),
        }
    }
}

/// Test application with router and direct access to services
pub struct TestApp {
    router: axum::Router,
    pub sessions: Arc<SessionManager>,
}

impl TestApp {
    /// Test app whose digitizer returns the Navy Stripe fixture
    pub fn new() -> Self {
        Self::with_digitizer(StubDigitizer::returning(StubOutcome::Pattern(
            fixtures::navy_pattern(),
        )))
    }

    pub fn with_digitizer(digitizer: Arc<dyn PatternDigitizer>) -> Self {
        let state = create_app_state_with_digitizer(
            test_config(),
            AssetLoader::embedded(),
            digitizer,
        )
        .expect("Failed to create app state");
        Self::from_state(state)
    }

    /// Test app talking to a mock model endpoint
    pub fn with_gemini(gemini: GeminiConfig) -> Self {
        let config = AppConfig {
            gemini,
            ..test_config()
        };
        let state =
            create_app_state(config, AssetLoader::embedded()).expect("Failed to create app state");
        Self::from_state(state)
    }

    /// Build with a custom upload limit
    pub fn with_upload_limit(max_bytes: usize) -> Self {
        let mut config = test_config();
        config.upload.max_bytes = max_bytes;
        let state = create_app_state_with_digitizer(
            config,
            AssetLoader::embedded(),
            StubDigitizer::returning(StubOutcome::Empty),
        )
        .expect("Failed to create app state");
        Self::from_state(state)
    }

    fn from_state(state: AppState) -> Self {
        let sessions = state.sessions.clone();
        Self {
            router: build_router(state),
            sessions,
        }
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a GET request with custom headers
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::get(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// Make a POST request with an empty body
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request(Request::post(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(Request::delete(path).body(Body::empty()).unwrap())
            .await
    }

    /// POST a multipart form with one file part named `image`
    pub async fn post_image(
        &self,
        path: &str,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> TestResponse {
        let (boundary, body) = fixtures::multipart_image(filename, content_type, bytes);
        let request = Request::post(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.request(request).await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Open a session through the landing page and return its id
    pub async fn open_session(&self) -> String {
        let response = self.get("/").await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        response
            .location()
            .strip_prefix("/s/")
            .expect("redirect to a session page")
            .to_string()
    }

    /// Wait until the session leaves `processing`
    pub async fn wait_settled(&self, id: &str) -> SessionState {
        let id = SessionId::new(id);
        for _ in 0..200 {
            let session = self.sessions.get(&id).await.expect("session exists");
            let state = session.lock().await.state();
            if state != SessionState::Processing {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session {id} still processing");
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Config with a dummy key; nothing reaches a real endpoint
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.gemini.api_key = "test-key".to_string();
    config
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get a header as string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Redirect target
    pub fn location(&self) -> &str {
        self.header("location").expect("Location header")
    }
}
