//! The exam session controller.
//!
//! Orchestrates one turn of the adaptive loop: balance categories, select
//! and serve an item, grade the submitted response, re-estimate ability,
//! evaluate the stopping rules, and persist the session under an optimistic
//! version token. All statistical work is delegated to the pure modules;
//! this file owns only the state machine and the collaborator seams.

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::balancer;
use crate::error::EngineError;
use crate::estimator::{self, ItemResponse};
use crate::model::{ExamConfig, ExamOutcome, Item, ResponseRecord, Session, SessionState};
use crate::report::ExamReport;
use crate::results::{NextItem, ServedItem, SessionSnapshot};
use crate::selector;
use crate::stopping::{self, Decision, StopRule};
use crate::traits::{ItemBank, SessionStore};

/// Slack before a rising standard error is reported as estimator misuse.
const SE_REGRESSION_TOLERANCE: f64 = 1e-9;

/// The adaptive exam engine.
///
/// Stateless apart from the injected random source; all session state lives
/// behind the [`SessionStore`] seam, so any number of engine instances can
/// serve the same store.
pub struct ExamEngine {
    bank: Arc<dyn ItemBank>,
    store: Arc<dyn SessionStore>,
    rng: Mutex<StdRng>,
}

impl ExamEngine {
    /// Engine with an entropy-seeded random source.
    pub fn new(bank: Arc<dyn ItemBank>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            bank,
            store,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Engine with a fixed seed; identical scripted runs produce identical
    /// item sequences and ability trajectories.
    pub fn with_seed(bank: Arc<dyn ItemBank>, store: Arc<dyn SessionStore>, seed: u64) -> Self {
        Self {
            bank,
            store,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Start a new exam session and serve the first item.
    pub async fn start_session(
        &self,
        candidate_id: &str,
        config: ExamConfig,
    ) -> Result<SessionSnapshot, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;

        let mut session = Session::new(candidate_id, config);
        session.state = SessionState::InProgress;

        // Nothing has been persisted yet, so a selection failure here is
        // surfaced to the caller instead of terminating a session.
        let item = self.select_next(&mut session).await?;
        let served = ServedItem::from_item(&item, 1);

        self.store.create(&session).await?;
        tracing::info!(session = %session.id, candidate = candidate_id, "exam session started");
        Ok(SessionSnapshot::of(&session, Some(served)))
    }

    /// Return the pending item, selecting one if none is pending.
    ///
    /// Idempotent between responses: asking again without an intervening
    /// submission serves the same item.
    pub async fn next_item(&self, session_id: Uuid) -> Result<NextItem, EngineError> {
        let (mut session, version) = self.store.load(session_id).await?;

        if session.state.is_terminal() {
            return Ok(NextItem::Finished(Box::new(ExamReport::from_session(&session))));
        }
        if session.state != SessionState::InProgress {
            return Err(EngineError::InvalidSessionState {
                session: session_id,
                state: session.state,
            });
        }

        if let Some(current) = &session.current_item_id {
            let item = self.bank.item(current).await?;
            let position = session.responses.len() as u32 + 1;
            return Ok(NextItem::Item(ServedItem::from_item(&item, position)));
        }

        match self.select_next(&mut session).await {
            Ok(item) => {
                let position = session.responses.len() as u32 + 1;
                let served = ServedItem::from_item(&item, position);
                self.store.save(&session, version).await?;
                Ok(NextItem::Item(served))
            }
            Err(EngineError::NoEligibleItems(_) | EngineError::NoEligibleCategory) => {
                tracing::warn!(
                    session = %session_id,
                    "item pool exhausted before a stopping rule fired; ending inconclusive"
                );
                self.finalize(&mut session, ExamOutcome::Inconclusive, None);
                self.store.save(&session, version).await?;
                Ok(NextItem::Finished(Box::new(ExamReport::from_session(&session))))
            }
            Err(other) => Err(other),
        }
    }

    /// Grade a response, advance the state machine one turn, and persist.
    pub async fn submit_response(
        &self,
        session_id: Uuid,
        item_id: &str,
        selected_answer: &str,
        time_spent_seconds: u32,
    ) -> Result<SessionSnapshot, EngineError> {
        let (mut session, version) = self.store.load(session_id).await?;

        if session.state != SessionState::InProgress {
            return Err(EngineError::InvalidSessionState {
                session: session_id,
                state: session.state,
            });
        }
        let Some(pending) = session.current_item_id.clone() else {
            return Err(EngineError::UnexpectedItem {
                submitted: item_id.to_string(),
                pending: "(none)".to_string(),
            });
        };
        if pending != item_id {
            return Err(EngineError::UnexpectedItem {
                submitted: item_id.to_string(),
                pending,
            });
        }

        let item = self.bank.item(&pending).await?;
        let correct = grade(selected_answer, &item.key);

        let theta_before = session.theta;
        let mut history: Vec<ItemResponse> =
            session.responses.iter().map(to_item_response).collect();
        history.push(ItemResponse {
            discrimination: item.discrimination,
            difficulty: item.difficulty,
            guessing: item.guessing,
            correct,
        });
        let estimate = estimator::estimate(&history);
        tracing::debug!(
            session = %session_id,
            item = %item.id,
            correct,
            theta = estimate.theta,
            se = estimate.se,
            method = ?estimate.method,
            "response scored"
        );

        // A method switch (EAP to MLE or back) legitimately changes the SE
        // scale; within one method a rise above the running minimum points
        // at estimator misuse.
        let same_method = session
            .responses
            .last()
            .map(|r| r.estimation_method == estimate.method)
            .unwrap_or(false);
        if same_method && estimate.se > session.min_se + SE_REGRESSION_TOLERANCE {
            tracing::warn!(
                session = %session_id,
                se = estimate.se,
                min_se = session.min_se,
                method = ?estimate.method,
                "standard error rose above its running minimum; check estimator inputs"
            );
        }
        session.min_se = session.min_se.min(estimate.se);

        session.responses.push(ResponseRecord {
            item_id: pending.clone(),
            correct,
            theta_before,
            theta_after: estimate.theta,
            se_after: estimate.se,
            category: item.category,
            discrimination: item.discrimination,
            difficulty: item.difficulty,
            guessing: item.guessing,
            estimation_method: estimate.method,
            timestamp: Utc::now(),
            time_spent_seconds,
        });
        session.administered_item_ids.push(pending);
        session.current_item_id = None;
        *session.category_counts.entry(item.category).or_insert(0) += 1;
        session.theta = estimate.theta;
        session.se = estimate.se;

        let minimums_met = balancer::minimums_met(
            &session.category_counts,
            &session.config.test_plan,
            session.config.min_items,
        );
        let decision = stopping::evaluate(
            session.responses.len() as u32,
            session.theta,
            session.se,
            minimums_met,
            &session.config,
        );

        let mut served = None;
        match decision {
            Decision::Stop { outcome, rule } => {
                self.finalize(&mut session, outcome, Some(rule));
            }
            Decision::Continue => match self.select_next(&mut session).await {
                Ok(next) => {
                    let position = session.responses.len() as u32 + 1;
                    served = Some(ServedItem::from_item(&next, position));
                }
                Err(EngineError::NoEligibleItems(_) | EngineError::NoEligibleCategory) => {
                    tracing::warn!(
                        session = %session_id,
                        "item pool exhausted before a stopping rule fired; ending inconclusive"
                    );
                    self.finalize(&mut session, ExamOutcome::Inconclusive, None);
                }
                Err(other) => return Err(other),
            },
        }

        self.store.save(&session, version).await?;
        Ok(SessionSnapshot::of(&session, served))
    }

    /// Abandon an in-progress session. Terminal; driven by an external
    /// signal such as an exam time limit.
    pub async fn abandon(&self, session_id: Uuid) -> Result<SessionSnapshot, EngineError> {
        let (mut session, version) = self.store.load(session_id).await?;
        if session.state != SessionState::InProgress {
            return Err(EngineError::InvalidSessionState {
                session: session_id,
                state: session.state,
            });
        }
        self.finalize(&mut session, ExamOutcome::Abandoned, None);
        self.store.save(&session, version).await?;
        Ok(SessionSnapshot::of(&session, None))
    }

    /// Build the final report for a terminated session.
    pub async fn result(&self, session_id: Uuid) -> Result<ExamReport, EngineError> {
        let (session, _) = self.store.load(session_id).await?;
        if !session.state.is_terminal() {
            return Err(EngineError::InvalidSessionState {
                session: session_id,
                state: session.state,
            });
        }
        Ok(ExamReport::from_session(&session))
    }

    /// Balance, select, and commit the administration of the next item.
    ///
    /// On success the chosen item is pending on the session and its exposure
    /// counter has been incremented at the bank.
    async fn select_next(&self, session: &mut Session) -> Result<Item, EngineError> {
        let administered = session.responses.len() as u32;
        let eligibility = balancer::eligibility(
            &session.category_counts,
            &session.config.test_plan,
            administered,
            session.config.min_items,
            session.config.max_items,
        )?;

        let exclude = session.excluded_item_ids();
        let mut candidates = self
            .bank
            .eligible_items(&exclude, Some(eligibility.pool()))
            .await?;
        if candidates.is_empty() && !eligibility.mandatory.is_empty() {
            // Last resort before giving up on the turn: widen back to every
            // under-quota category.
            tracing::warn!(
                session = %session.id,
                "mandatory categories have no available items; relaxing to all eligible categories"
            );
            candidates = self
                .bank
                .eligible_items(&exclude, Some(&eligibility.eligible))
                .await?;
        }

        let chosen = {
            let mut rng = self.rng.lock().await;
            selector::select_item(
                &candidates,
                session.theta,
                session.config.exposure_top_k,
                session.id,
                &mut *rng,
            )?
            .clone()
        };

        let exposure = self.bank.record_administration(&chosen.id).await?;
        tracing::debug!(session = %session.id, item = %chosen.id, exposure, "item selected");
        session.current_item_id = Some(chosen.id.clone());
        Ok(chosen)
    }

    fn finalize(&self, session: &mut Session, outcome: ExamOutcome, rule: Option<StopRule>) {
        session.state = if outcome == ExamOutcome::Abandoned {
            SessionState::Abandoned
        } else {
            SessionState::Completed
        };
        session.result = Some(outcome);
        session.stop_rule = rule;
        session.completed_at = Some(Utc::now());
        session.current_item_id = None;
        tracing::info!(
            session = %session.id,
            outcome = %outcome,
            items = session.responses.len(),
            "exam session terminated"
        );
    }
}

/// Grade a submitted answer against the item key.
fn grade(selected: &str, key: &str) -> bool {
    selected.trim().eq_ignore_ascii_case(key.trim())
}

fn to_item_response(record: &ResponseRecord) -> ItemResponse {
    ItemResponse {
        discrimination: record.discrimination,
        difficulty: record.difficulty,
        guessing: record.guessing,
        correct: record.correct,
    }
}
