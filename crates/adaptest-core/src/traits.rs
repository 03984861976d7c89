//! Core trait definitions for the item bank and session store collaborators.
//!
//! These async traits are implemented by the `adaptest-bank` and
//! `adaptest-store` crates respectively. The engine holds them as trait
//! objects and stays agnostic of the backing storage.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{BankError, StoreError};
use crate::model::{Category, Item, Session};

// ---------------------------------------------------------------------------
// Item bank trait
// ---------------------------------------------------------------------------

/// Read-mostly access to the calibrated item pool.
///
/// Exposure counters are the one piece of shared mutable state across
/// concurrent sessions; implementations must make `record_administration` an
/// atomic increment so concurrent exams cannot lose updates.
#[async_trait]
pub trait ItemBank: Send + Sync {
    /// Human-readable bank name (e.g. "memory").
    fn name(&self) -> &str;

    /// Active items not in `exclude`, optionally restricted to the given
    /// categories. Returned items carry their current exposure counts.
    async fn eligible_items(
        &self,
        exclude: &[String],
        categories: Option<&[Category]>,
    ) -> Result<Vec<Item>, BankError>;

    /// Fetch a single item by id, administered or not.
    async fn item(&self, item_id: &str) -> Result<Item, BankError>;

    /// Atomically bump the exposure counter for an administered item.
    /// Returns the new count.
    async fn record_administration(&self, item_id: &str) -> Result<u32, BankError>;
}

// ---------------------------------------------------------------------------
// Session store trait
// ---------------------------------------------------------------------------

/// Durable session persistence with optimistic concurrency.
///
/// Every session carries a version token starting at 1. `save` must compare
/// the caller's token against the stored one and reject stale writes, so two
/// racing turns on the same session cannot both commit.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a brand-new session. Fails if the id already exists.
    async fn create(&self, session: &Session) -> Result<u64, StoreError>;

    /// Load a session together with its current version token.
    async fn load(&self, session_id: Uuid) -> Result<(Session, u64), StoreError>;

    /// Persist an updated session if `expected_version` still matches.
    /// Returns the new version token.
    async fn save(&self, session: &Session, expected_version: u64) -> Result<u64, StoreError>;
}
