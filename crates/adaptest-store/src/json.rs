//! JSON file-per-session store.
//!
//! Each session lives at `<dir>/<session-id>.json` inside a versioned
//! envelope. Version checks happen under a per-process lock; cross-process
//! writers need a shared database instead of this store.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adaptest_core::error::StoreError;
use adaptest_core::model::Session;
use adaptest_core::traits::SessionStore;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u64,
    session: Session,
}

/// A `SessionStore` persisting sessions as JSON files.
pub struct JsonStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Store rooted at `dir`; the directory is created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn path_for(&self, session_id: Uuid) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    fn read_envelope(&self, path: &Path, session_id: Uuid) -> Result<Envelope, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(session_id));
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| StoreError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| StoreError::Io(e.to_string()))
    }

    fn write_envelope(&self, path: &Path, envelope: &Envelope) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io(e.to_string()))?;
        let json =
            serde_json::to_string_pretty(envelope).map_err(|e| StoreError::Io(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for JsonStore {
    async fn create(&self, session: &Session) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().unwrap();
        let path = self.path_for(session.id);
        if path.exists() {
            return Err(StoreError::AlreadyExists(session.id));
        }
        let envelope = Envelope {
            version: 1,
            session: session.clone(),
        };
        self.write_envelope(&path, &envelope)?;
        tracing::debug!(session = %session.id, path = %path.display(), "session created");
        Ok(1)
    }

    async fn load(&self, session_id: Uuid) -> Result<(Session, u64), StoreError> {
        let path = self.path_for(session_id);
        let envelope = self.read_envelope(&path, session_id)?;
        Ok((envelope.session, envelope.version))
    }

    async fn save(&self, session: &Session, expected_version: u64) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().unwrap();
        let path = self.path_for(session.id);
        let current = self.read_envelope(&path, session.id)?;
        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                session: session.id,
                expected: expected_version,
                found: current.version,
            });
        }
        let envelope = Envelope {
            version: expected_version + 1,
            session: session.clone(),
        };
        self.write_envelope(&path, &envelope)?;
        Ok(envelope.version)
    }
}
