//! Engine and collaborator error types.
//!
//! `BankError` and `StoreError` belong to the collaborator traits defined in
//! this crate so the engine can classify failures for retry decisions without
//! string matching; `EngineError` is the taxonomy surfaced to callers.

use thiserror::Error;
use uuid::Uuid;

use crate::model::SessionState;

/// Errors raised by an item bank.
#[derive(Debug, Error)]
pub enum BankError {
    /// The bank could not be reached or answered abnormally.
    #[error("item bank unavailable: {0}")]
    Unavailable(String),

    /// The bank has no item with the requested id.
    #[error("unknown item: {0}")]
    UnknownItem(String),
}

impl BankError {
    /// Returns `true` if the failed call may be retried as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BankError::Unavailable(_))
    }
}

/// Errors raised by a session store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No session with the given id.
    #[error("session {0} not found")]
    NotFound(Uuid),

    /// A session with the given id already exists.
    #[error("session {0} already exists")]
    AlreadyExists(Uuid),

    /// The caller's version token was stale; another writer got there first.
    #[error("version conflict on session {session}: expected {expected}, found {found}")]
    VersionConflict {
        session: Uuid,
        expected: u64,
        found: u64,
    },

    /// Underlying storage failure.
    #[error("session store failure: {0}")]
    Io(String),
}

/// Errors surfaced by the exam engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No session with the given id.
    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    /// The operation requires an in-progress session.
    #[error("session {session} is {state}; operation requires an in-progress session")]
    InvalidSessionState {
        session: Uuid,
        state: SessionState,
    },

    /// The submitted item does not match the item currently served.
    #[error("submitted item {submitted} does not match pending item {pending}")]
    UnexpectedItem { submitted: String, pending: String },

    /// The candidate pool is empty after balancing and exclusions.
    #[error("no eligible items remain for session {0}")]
    NoEligibleItems(Uuid),

    /// The test plan constraints cannot be satisfied from the current state.
    #[error("test plan constraints are infeasible; no eligible category")]
    NoEligibleCategory,

    /// Another request committed the session first; retry the whole turn.
    #[error("concurrent modification of session {0}; retry the turn")]
    ConcurrentModification(Uuid),

    /// The item bank failed; session state is unaffected.
    #[error("item bank unavailable: {0}")]
    ItemBankUnavailable(String),

    /// Session persistence failed outside the version-conflict path.
    #[error("session store failure: {0}")]
    StoreFailure(String),

    /// The exam configuration failed validation.
    #[error("invalid exam configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Returns `true` if the caller may retry the whole turn.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::ConcurrentModification(_) | EngineError::ItemBankUnavailable(_)
        )
    }
}

impl From<BankError> for EngineError {
    fn from(err: BankError) -> Self {
        EngineError::ItemBankUnavailable(err.to_string())
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::SessionNotFound(id),
            StoreError::VersionConflict { session, .. } => {
                EngineError::ConcurrentModification(session)
            }
            other => EngineError::StoreFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(BankError::Unavailable("down".into()).is_retryable());
        assert!(!BankError::UnknownItem("x".into()).is_retryable());

        assert!(EngineError::ConcurrentModification(Uuid::nil()).is_retryable());
        assert!(EngineError::ItemBankUnavailable("down".into()).is_retryable());
        assert!(!EngineError::NoEligibleCategory.is_retryable());
    }

    #[test]
    fn store_errors_map_to_engine_taxonomy() {
        let id = Uuid::nil();
        assert!(matches!(
            EngineError::from(StoreError::NotFound(id)),
            EngineError::SessionNotFound(_)
        ));
        assert!(matches!(
            EngineError::from(StoreError::VersionConflict {
                session: id,
                expected: 1,
                found: 2
            }),
            EngineError::ConcurrentModification(_)
        ));
        assert!(matches!(
            EngineError::from(StoreError::Io("disk".into())),
            EngineError::StoreFailure(_)
        ));
    }
}
