//! In-memory session repository.
//!
//! The map lock is held only long enough to find or create an entry. Each
//! session sits behind its own lock, so a slow backend call made on behalf of
//! one chat never blocks another.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use pilelog_shared::SessionId;

use crate::dialogue::DialogueState;

/// One operator conversation.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub state: DialogueState,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: DialogueState::Idle,
        }
    }
}

/// Process-lifetime store of sessions keyed by [`SessionId`]. No eviction.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `id`, creating an idle one on first contact.
    pub async fn get(&self, id: SessionId) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(id)
            .or_insert_with(|| {
                debug!(session = %id, "new session");
                Arc::new(Mutex::new(Session::new(id)))
            })
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
