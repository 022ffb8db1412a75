use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::error::{ApiError, DigitizeError};
use crate::models::PatternData;
use crate::services::digitizer::PatternDigitizer;
use crate::services::encoder::{self, SourceImage};
use crate::services::preview_store::{PreviewEntry, PreviewStore};
use crate::services::session::{DigitizeTicket, Session, SessionId};

pub type SharedSession = Arc<Mutex<Session>>;

/// Owns all live sessions and runs their digitize requests
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
    previews: Arc<PreviewStore>,
    digitizer: Arc<dyn PatternDigitizer>,
}

impl SessionManager {
    pub fn new(digitizer: Arc<dyn PatternDigitizer>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            previews: PreviewStore::new(),
            digitizer,
        }
    }

    pub fn previews(&self) -> &Arc<PreviewStore> {
        &self.previews
    }

    pub async fn create(&self) -> SessionId {
        let id = SessionId::generate();
        let mut sessions = self.sessions.write().await;
        sessions.insert(id.clone(), Arc::new(Mutex::new(Session::new(id.clone()))));
        tracing::info!(session = %id, live = sessions.len(), "Session created");
        id
    }

    pub async fn get(&self, id: &SessionId) -> Result<SharedSession, ApiError> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned().ok_or(ApiError::SessionNotFound)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Replace the session's selected image
    pub async fn select_image(&self, id: &SessionId, image: SourceImage) -> Result<(), ApiError> {
        let session = self.get(id).await?;
        let image = Arc::new(image);
        let preview = self.previews.create(image.clone());

        tracing::info!(
            session = %id,
            filename = image.filename.as_deref().unwrap_or("-"),
            mime = %image.mime,
            size = image.bytes.len(),
            "Image selected"
        );

        session.lock().await.select_image(image, preview);
        Ok(())
    }

    /// Record an inline input error on the session
    pub async fn reject_input(&self, id: &SessionId, message: &str) -> Result<(), ApiError> {
        let session = self.get(id).await?;
        session.lock().await.reject_input(message);
        tracing::info!(session = %id, message, "Input rejected");
        Ok(())
    }

    /// Preview bytes for the session's current selection
    pub async fn preview(&self, id: &SessionId) -> Result<PreviewEntry, ApiError> {
        let session = self.get(id).await?;
        let session = session.lock().await;
        let selection = session.selection().ok_or(ApiError::NotFound)?;
        self.previews
            .get(selection.preview.id())
            .ok_or(ApiError::NotFound)
    }

    /// Start a digitize attempt in the background.
    ///
    /// Input and busy errors are returned immediately; everything after
    /// that lands in the session state. The returned handle resolves once
    /// the outcome has been recorded (or discarded as stale).
    pub async fn start_digitize(&self, id: &SessionId) -> Result<JoinHandle<()>, ApiError> {
        let session = self.get(id).await?;
        let ticket = session.lock().await.begin_digitize()?;

        tracing::info!(session = %id, generation = ticket.generation, "Digitize started");

        let digitizer = self.digitizer.clone();
        let id = id.clone();
        Ok(tokio::spawn(async move {
            let generation = ticket.generation;
            let outcome = run_ticket(digitizer.as_ref(), ticket).await;

            match &outcome {
                Ok(_) => tracing::info!(session = %id, generation, "Digitize finished"),
                Err(e) => tracing::warn!(session = %id, generation, error = %e, "Digitize failed"),
            }

            let recorded = session
                .lock()
                .await
                .complete(generation, outcome.map_err(|e| e.describe()));
            if !recorded {
                tracing::debug!(session = %id, generation, "Outcome superseded");
            }
        }))
    }

    /// Close and forget a session
    pub async fn close(&self, id: &SessionId) -> Result<(), ApiError> {
        let session = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(id).ok_or(ApiError::SessionNotFound)?
        };
        session.lock().await.close();
        tracing::info!(session = %id, "Session closed");
        Ok(())
    }

    /// Close sessions idle for longer than `ttl`. Processing sessions are kept.
    pub async fn sweep_expired(&self, ttl: Duration) -> usize {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        let cutoff = Utc::now() - ttl;

        let mut expired = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, session) in sessions.iter() {
                let session = session.lock().await;
                if !session.is_processing() && session.updated_at() < cutoff {
                    expired.push(id.clone());
                }
            }
        }

        for id in &expired {
            // Already gone if closed concurrently
            let _ = self.close(id).await;
        }

        if !expired.is_empty() {
            tracing::info!(closed = expired.len(), "Swept expired sessions");
        }
        expired.len()
    }

    /// Periodically sweep expired sessions until the manager is dropped
    pub fn spawn_sweeper(self: &Arc<Self>, ttl: Duration, interval: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(manager) = weak.upgrade() else {
                    break;
                };
                manager.sweep_expired(ttl).await;
            }
        })
    }
}

/// Encode, then request. The request races the ticket's cancellation token.
async fn run_ticket(
    digitizer: &dyn PatternDigitizer,
    ticket: DigitizeTicket,
) -> Result<PatternData, DigitizeError> {
    let encoded = encoder::encode(&ticket.image);

    tokio::select! {
        _ = ticket.token.cancelled() => Err(DigitizeError::Cancelled),
        result = digitizer.digitize(&encoded) => result,
    }
}
