//! Per-visitor UI state.
//!
//! ```text
//! idle -> previewing -> processing -> result | errored
//! ```
//!
//! Selecting a new image from any state returns to `previewing`, clears the
//! previous outcome and cancels the request in flight. Completions carry the
//! generation they were started under; stale ones are dropped.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::error::SessionError;
use crate::models::PatternData;
use crate::services::encoder::SourceImage;
use crate::services::preview_store::PreviewHandle;
use crate::ui_text;

/// Opaque session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(hex::encode(rand::thread_rng().gen::<[u8; 16]>()))
    }

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Previewing,
    Processing,
    Result,
    Errored,
}

/// How the result tile is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Single,
    Tiled,
}

/// Currently selected photo and its preview
#[derive(Debug)]
pub struct Selection {
    pub image: Arc<SourceImage>,
    pub preview: PreviewHandle,
}

/// Everything a digitize task needs, handed out by [`Session::begin_digitize`]
#[derive(Debug, Clone)]
pub struct DigitizeTicket {
    pub generation: u64,
    pub token: CancellationToken,
    pub image: Arc<SourceImage>,
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    state: SessionState,
    selection: Option<Selection>,
    result: Option<Arc<PatternData>>,
    error: Option<String>,
    view: ViewMode,
    generation: u64,
    in_flight: Option<CancellationToken>,
    processing_since: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: SessionState::Idle,
            selection: None,
            result: None,
            error: None,
            view: ViewMode::default(),
            generation: 0,
            in_flight: None,
            processing_since: None,
            updated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn result(&self) -> Option<&Arc<PatternData>> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn is_processing(&self) -> bool {
        self.state == SessionState::Processing
    }

    pub fn processing_since(&self) -> Option<DateTime<Utc>> {
        self.processing_since
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the selected image. Valid from every state.
    pub fn select_image(&mut self, image: Arc<SourceImage>, preview: PreviewHandle) {
        self.cancel_in_flight();
        self.generation += 1;
        // The old selection's handle drops here, revoking its preview.
        self.selection = Some(Selection { image, preview });
        self.result = None;
        self.error = None;
        self.view = ViewMode::Single;
        self.transition(SessionState::Previewing);
    }

    /// Start a digitize attempt.
    ///
    /// Without a selection the inline input error is set and no ticket is
    /// issued.
    pub fn begin_digitize(&mut self) -> Result<DigitizeTicket, SessionError> {
        if self.is_processing() {
            return Err(SessionError::Busy);
        }
        let Some(selection) = &self.selection else {
            self.error = Some(ui_text::NO_IMAGE_SELECTED.to_string());
            self.updated_at = Utc::now();
            return Err(SessionError::NoImageSelected);
        };

        let image = selection.image.clone();
        let token = CancellationToken::new();

        self.generation += 1;
        self.in_flight = Some(token.clone());
        self.result = None;
        self.error = None;
        self.processing_since = Some(Utc::now());
        self.transition(SessionState::Processing);

        Ok(DigitizeTicket {
            generation: self.generation,
            token,
            image,
        })
    }

    /// Record the outcome of the attempt started under `generation`.
    ///
    /// Returns `false` when the outcome is stale and was discarded.
    pub fn complete(&mut self, generation: u64, outcome: Result<PatternData, String>) -> bool {
        if generation != self.generation || !self.is_processing() {
            tracing::debug!(
                session = %self.id,
                generation,
                current = self.generation,
                "Discarding stale digitize outcome"
            );
            return false;
        }

        self.in_flight = None;
        self.processing_since = None;
        match outcome {
            Ok(pattern) => {
                self.result = Some(Arc::new(pattern));
                self.error = None;
                self.transition(SessionState::Result);
            }
            Err(detail) => {
                self.result = None;
                self.error = Some(ui_text::error_message(&detail));
                self.transition(SessionState::Errored);
            }
        }
        true
    }

    /// Show an inline input error without leaving the current state
    pub fn reject_input(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.updated_at = Utc::now();
    }

    /// Switch presentation. Never touches the result data.
    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
        self.touch();
    }

    /// Record activity so the session is not swept as idle
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Tear down: cancel the request and release preview and result
    pub fn close(&mut self) {
        self.cancel_in_flight();
        self.generation += 1;
        self.selection = None;
        self.result = None;
        self.error = None;
        self.transition(SessionState::Idle);
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            tracing::info!(session = %self.id, "Cancelling in-flight digitize request");
            token.cancel();
        }
        self.processing_since = None;
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(session = %self.id, from = ?self.state, to = ?next, "Session transition");
        }
        self.state = next;
        self.updated_at = Utc::now();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.to_string(),
            state: self.state,
            view: self.view,
            has_image: self.selection.is_some(),
            preview_id: self.selection.as_ref().map(|s| s.preview.id().to_string()),
            error: self.error.clone(),
            result: self.result.as_deref().cloned(),
        }
    }
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub id: String,
    pub state: SessionState,
    pub view: ViewMode,
    pub has_image: bool,
    pub preview_id: Option<String>,
    pub error: Option<String>,
    pub result: Option<PatternData>,
}
