//! Revocable preview references for uploaded images.
//!
//! A [`PreviewHandle`] owns its entry: dropping the handle revokes it, so a
//! superseded selection or a closed session never leaves bytes behind.

use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use crate::services::encoder::SourceImage;

/// Bytes served for a preview
#[derive(Clone, Debug)]
pub struct PreviewEntry {
    pub image: Arc<SourceImage>,
    /// Hex SHA-256 of the bytes, used as the ETag
    pub etag: String,
}

/// Registry of live previews
pub struct PreviewStore {
    entries: RwLock<HashMap<String, PreviewEntry>>,
}

impl PreviewStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: RwLock::new(HashMap::new()),
        })
    }

    /// Register an image and return the handle that keeps it alive
    pub fn create(self: &Arc<Self>, image: Arc<SourceImage>) -> PreviewHandle {
        let id = hex::encode(rand::thread_rng().gen::<[u8; 16]>());
        let etag = hex::encode(Sha256::digest(&image.bytes));

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(id.clone(), PreviewEntry { image, etag });
        tracing::debug!(preview_id = %id, live = entries.len(), "Preview created");

        PreviewHandle {
            id,
            store: Arc::downgrade(self),
        }
    }

    pub fn get(&self, id: &str) -> Option<PreviewEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(id).cloned()
    }

    fn revoke(&self, id: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.remove(id).is_some() {
            tracing::debug!(preview_id = %id, live = entries.len(), "Preview revoked");
        }
    }

    /// Number of live previews
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owning reference to a preview entry
pub struct PreviewHandle {
    id: String,
    store: Weak<PreviewStore>,
}

impl PreviewHandle {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle").field("id", &self.id).finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.revoke(&self.id);
        }
    }
}
