//! In-memory session store for tests and credential-less local runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::session::model::OnboardingSession;
use crate::store::SessionStore;

/// Stores serialized snapshots keyed by user id, so the serde path is
/// exercised the same way the durable backend exercises it.
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, user_id: &str) -> Result<Option<OnboardingSession>, StoreError> {
        let sessions = self.sessions.lock().expect("store lock poisoned");
        match sessions.get(user_id) {
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn save(&self, user_id: &str, session: &OnboardingSession) -> Result<(), StoreError> {
        let raw = serde_json::to_string(session)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.sessions
            .lock()
            .expect("store lock poisoned")
            .insert(user_id.to_string(), raw);
        Ok(())
    }
}
