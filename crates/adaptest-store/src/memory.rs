//! In-memory session store with optimistic concurrency.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use adaptest_core::error::StoreError;
use adaptest_core::model::Session;
use adaptest_core::traits::SessionStore;

/// A `SessionStore` holding sessions in process memory.
///
/// `save` compares the caller's version token under the map lock, so two
/// racing turns on one session cannot both commit.
pub struct MemoryStore {
    sessions: Mutex<HashMap<Uuid, (Session, u64)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, session: &Session) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session.id) {
            return Err(StoreError::AlreadyExists(session.id));
        }
        sessions.insert(session.id, (session.clone(), 1));
        Ok(1)
    }

    async fn load(&self, session_id: Uuid) -> Result<(Session, u64), StoreError> {
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(&session_id)
            .map(|(session, version)| (session.clone(), *version))
            .ok_or(StoreError::NotFound(session_id))
    }

    async fn save(&self, session: &Session, expected_version: u64) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let entry = sessions
            .get_mut(&session.id)
            .ok_or(StoreError::NotFound(session.id))?;
        if entry.1 != expected_version {
            return Err(StoreError::VersionConflict {
                session: session.id,
                expected: expected_version,
                found: entry.1,
            });
        }
        let new_version = expected_version + 1;
        *entry = (session.clone(), new_version);
        Ok(new_version)
    }
}
