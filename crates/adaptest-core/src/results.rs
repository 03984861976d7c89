//! Presentation-facing views of an in-flight session.
//!
//! `ServedItem` deliberately strips the calibration parameters and the
//! grading key: the presentation layer sees only what the candidate may see.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Category, ExamOutcome, Item, Session, SessionState};
use crate::report::ExamReport;

/// The item currently in front of the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServedItem {
    /// Item identifier, echoed back on submission.
    pub id: String,
    /// Category, for progress display.
    pub category: Category,
    /// Opaque display payload.
    pub stem: Option<String>,
    /// 1-based position in the exam.
    pub position: u32,
}

impl ServedItem {
    /// Build the candidate-visible view of an item.
    pub fn from_item(item: &Item, position: u32) -> Self {
        Self {
            id: item.id.clone(),
            category: item.category,
            stem: item.stem.clone(),
            position,
        }
    }
}

/// Snapshot of a session returned after every engine operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub candidate_id: String,
    pub state: SessionState,
    /// Current ability estimate.
    pub theta: f64,
    /// Current standard error.
    pub se: f64,
    /// Responses recorded so far.
    pub items_answered: u32,
    /// Per-category administration counts.
    pub category_counts: BTreeMap<Category, u32>,
    /// The pending item, when the exam is still running.
    pub current_item: Option<ServedItem>,
    /// Final classification, once terminal.
    pub result: Option<ExamOutcome>,
}

impl SessionSnapshot {
    /// Derive a snapshot from a session, attaching the served view of the
    /// pending item when one exists.
    pub fn of(session: &Session, current_item: Option<ServedItem>) -> Self {
        Self {
            session_id: session.id,
            candidate_id: session.candidate_id.clone(),
            state: session.state,
            theta: session.theta,
            se: session.se,
            items_answered: session.responses.len() as u32,
            category_counts: session.category_counts.clone(),
            current_item,
            result: session.result,
        }
    }
}

/// What the presentation layer gets when it asks for the next item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextItem {
    /// The exam continues with this item.
    Item(ServedItem),
    /// The exam is over; here is the full result.
    Finished(Box<ExamReport>),
}
