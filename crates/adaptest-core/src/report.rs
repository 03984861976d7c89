//! Final exam report with JSON persistence.
//!
//! This is the exact shape consumed by downstream result rendering: the
//! response rows reconstruct the ability trajectory and the category and
//! difficulty breakdowns.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Category, ExamOutcome, Session};
use crate::scoring::{self, ReadinessTier};
use crate::stopping::StopRule;

/// A complete report for a terminated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamReport {
    /// The session this report describes.
    pub session_id: Uuid,
    /// The candidate who took the exam.
    pub candidate_id: String,
    /// Final classification.
    pub outcome: ExamOutcome,
    /// `Some(true/false)` for passed/failed; `None` when the engine could
    /// not classify (inconclusive or abandoned).
    pub passed: Option<bool>,
    /// Terminal ability estimate.
    pub final_ability: f64,
    /// Terminal standard error.
    pub standard_error: f64,
    /// Confidence relative to the starting standard error, 0-100.
    pub confidence_percent: u8,
    /// Logistic readiness indicator.
    pub passing_probability: f64,
    /// Display tier derived from the passing probability.
    pub readiness: ReadinessTier,
    /// The rule that ended the exam, when one fired.
    pub stop_rule: Option<StopRule>,
    /// Items answered.
    pub total_questions: u32,
    /// Per-response detail in administration order.
    pub responses: Vec<ResponseDetail>,
    /// Per-category administration summary.
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One row of the response trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseDetail {
    pub question_id: String,
    pub is_correct: bool,
    /// Ability estimate after this response was scored.
    pub ability_after: f64,
    /// Difficulty of the administered item.
    pub difficulty: f64,
    pub category: Category,
    pub time_spent_seconds: u32,
}

/// Administration summary for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    /// Items administered in this category.
    pub administered: u32,
    /// Of those, answered correctly.
    pub correct: u32,
    /// Minimum quota under the session's test plan.
    pub min_count: u32,
    /// Maximum quota under the session's test plan.
    pub max_count: u32,
}

impl ExamReport {
    /// Build the report from a terminated session. Pure derivation; the
    /// session is not mutated.
    pub fn from_session(session: &Session) -> Self {
        let outcome = session.result.unwrap_or(ExamOutcome::Inconclusive);
        let passed = match outcome {
            ExamOutcome::Passed => Some(true),
            ExamOutcome::Failed => Some(false),
            ExamOutcome::Inconclusive | ExamOutcome::Abandoned => None,
        };

        let avg_discrimination = if session.responses.is_empty() {
            0.0
        } else {
            session.responses.iter().map(|r| r.discrimination).sum::<f64>()
                / session.responses.len() as f64
        };
        let score = scoring::score(
            session.theta,
            session.se,
            session.config.cut_score,
            avg_discrimination,
        );

        let responses: Vec<ResponseDetail> = session
            .responses
            .iter()
            .map(|r| ResponseDetail {
                question_id: r.item_id.clone(),
                is_correct: r.correct,
                ability_after: r.theta_after,
                difficulty: r.difficulty,
                category: r.category,
                time_spent_seconds: r.time_spent_seconds,
            })
            .collect();

        let mut correct_by_category: BTreeMap<Category, u32> = BTreeMap::new();
        for r in &session.responses {
            if r.correct {
                *correct_by_category.entry(r.category).or_insert(0) += 1;
            }
        }
        let category_breakdown = Category::ALL
            .into_iter()
            .map(|category| CategoryBreakdown {
                category,
                administered: session.category_count(category),
                correct: correct_by_category.get(&category).copied().unwrap_or(0),
                min_count: session
                    .config
                    .test_plan
                    .min_count(category, session.config.min_items),
                max_count: session
                    .config
                    .test_plan
                    .max_count(category, session.config.max_items),
            })
            .collect();

        Self {
            session_id: session.id,
            candidate_id: session.candidate_id.clone(),
            outcome,
            passed,
            final_ability: session.theta,
            standard_error: session.se,
            confidence_percent: score.confidence_percent,
            passing_probability: score.passing_probability,
            readiness: score.readiness,
            stop_rule: session.stop_rule,
            total_questions: session.responses.len() as u32,
            responses,
            category_breakdown,
            started_at: session.started_at,
            completed_at: session.completed_at,
        }
    }

    /// Save the report as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ExamReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExamConfig, ResponseRecord, SessionState};

    fn terminated_session() -> Session {
        let mut session = Session::new("cand-1", ExamConfig::default());
        session.state = SessionState::Completed;
        session.result = Some(ExamOutcome::Passed);
        session.stop_rule = Some(StopRule::ConfidenceInterval);
        session.theta = 1.2;
        session.se = 0.28;
        session.completed_at = Some(Utc::now());
        for i in 0..3 {
            let category = Category::ALL[i % Category::ALL.len()];
            session.responses.push(ResponseRecord {
                item_id: format!("item-{i}"),
                correct: i != 1,
                theta_before: 0.2 * i as f64,
                theta_after: 0.2 * (i + 1) as f64,
                se_after: 1.0 / (i + 1) as f64,
                category,
                discrimination: 1.0,
                difficulty: 0.1 * i as f64,
                guessing: 0.2,
                estimation_method: crate::estimator::Method::MaximumLikelihood,
                timestamp: Utc::now(),
                time_spent_seconds: 45,
            });
            session.administered_item_ids.push(format!("item-{i}"));
            *session.category_counts.entry(category).or_insert(0) += 1;
        }
        session
    }

    #[test]
    fn report_reflects_terminal_state() {
        let session = terminated_session();
        let report = ExamReport::from_session(&session);
        assert_eq!(report.outcome, ExamOutcome::Passed);
        assert_eq!(report.passed, Some(true));
        assert_eq!(report.total_questions, 3);
        assert_eq!(report.responses.len(), 3);
        assert_eq!(report.responses[0].question_id, "item-0");
        assert!(report.passing_probability > 0.5);
        assert_eq!(report.stop_rule, Some(StopRule::ConfidenceInterval));
    }

    #[test]
    fn inconclusive_reports_no_pass_flag() {
        let mut session = terminated_session();
        session.result = Some(ExamOutcome::Inconclusive);
        let report = ExamReport::from_session(&session);
        assert_eq!(report.passed, None);
    }

    #[test]
    fn breakdown_counts_correct_answers_per_category() {
        let session = terminated_session();
        let report = ExamReport::from_session(&session);
        let moc = report
            .category_breakdown
            .iter()
            .find(|b| b.category == Category::ManagementOfCare)
            .unwrap();
        assert_eq!(moc.administered, 1);
        assert_eq!(moc.correct, 1);
        assert!(moc.max_count >= moc.min_count);
    }

    #[test]
    fn json_roundtrip() {
        let report = ExamReport::from_session(&terminated_session());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        report.save_json(&path).unwrap();
        let loaded = ExamReport::load_json(&path).unwrap();

        assert_eq!(loaded.session_id, report.session_id);
        assert_eq!(loaded.total_questions, 3);
        assert_eq!(loaded.outcome, ExamOutcome::Passed);
    }
}
