//! Core data model types for adaptest.
//!
//! These are the fundamental types the entire adaptest system uses to
//! represent calibrated items, candidate responses, exam sessions, and the
//! exam configuration with its content test plan.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard error assigned to a session before any response has been scored.
///
/// Large relative to the N(0,1) ability prior so early estimates read as
/// "essentially unknown"; finite so confidence can be expressed as a ratio
/// against it.
pub const STARTING_SE: f64 = 2.0;

/// The eight NCLEX Client Needs categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ManagementOfCare,
    SafetyAndInfectionControl,
    HealthPromotionAndMaintenance,
    PsychosocialIntegrity,
    BasicCareAndComfort,
    PharmacologicalTherapies,
    ReductionOfRiskPotential,
    PhysiologicalAdaptation,
}

impl Category {
    /// All categories, in test-plan order.
    pub const ALL: [Category; 8] = [
        Category::ManagementOfCare,
        Category::SafetyAndInfectionControl,
        Category::HealthPromotionAndMaintenance,
        Category::PsychosocialIntegrity,
        Category::BasicCareAndComfort,
        Category::PharmacologicalTherapies,
        Category::ReductionOfRiskPotential,
        Category::PhysiologicalAdaptation,
    ];

    /// Stable snake_case key, matching the serde representation.
    pub fn key(&self) -> &'static str {
        match self {
            Category::ManagementOfCare => "management_of_care",
            Category::SafetyAndInfectionControl => "safety_and_infection_control",
            Category::HealthPromotionAndMaintenance => "health_promotion_and_maintenance",
            Category::PsychosocialIntegrity => "psychosocial_integrity",
            Category::BasicCareAndComfort => "basic_care_and_comfort",
            Category::PharmacologicalTherapies => "pharmacological_therapies",
            Category::ReductionOfRiskPotential => "reduction_of_risk_potential",
            Category::PhysiologicalAdaptation => "physiological_adaptation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::ManagementOfCare => "Management of Care",
            Category::SafetyAndInfectionControl => "Safety and Infection Control",
            Category::HealthPromotionAndMaintenance => "Health Promotion and Maintenance",
            Category::PsychosocialIntegrity => "Psychosocial Integrity",
            Category::BasicCareAndComfort => "Basic Care and Comfort",
            Category::PharmacologicalTherapies => "Pharmacological Therapies",
            Category::ReductionOfRiskPotential => "Reduction of Risk Potential",
            Category::PhysiologicalAdaptation => "Physiological Adaptation",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.key() == normalized)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// A calibrated exam item under the three-parameter logistic model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier for this item.
    pub id: String,
    /// NCLEX Client Needs category.
    pub category: Category,
    /// Discrimination parameter `a` (> 0).
    pub discrimination: f64,
    /// Difficulty parameter `b`, on the same logit scale as ability.
    pub difficulty: f64,
    /// Pseudo-guessing parameter `c` (0 <= c < 1).
    pub guessing: f64,
    /// How many times this item has been administered, across all sessions.
    #[serde(default)]
    pub times_administered: u32,
    /// Inactive items are never selected.
    #[serde(default = "default_true")]
    pub active: bool,
    /// The correct answer token; responses are graded against it.
    pub key: String,
    /// Opaque display payload for the presentation layer; never interpreted.
    #[serde(default)]
    pub stem: Option<String>,
}

impl Item {
    /// Check calibration parameters and grading key for validity.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("item id must not be empty".into());
        }
        if !self.discrimination.is_finite() || self.discrimination <= 0.0 {
            return Err(format!(
                "item {}: discrimination must be > 0, got {}",
                self.id, self.discrimination
            ));
        }
        if !self.difficulty.is_finite() {
            return Err(format!("item {}: difficulty must be finite", self.id));
        }
        if !self.guessing.is_finite() || !(0.0..1.0).contains(&self.guessing) {
            return Err(format!(
                "item {}: guessing must be in [0, 1), got {}",
                self.id, self.guessing
            ));
        }
        if self.key.trim().is_empty() {
            return Err(format!("item {}: answer key must not be empty", self.id));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

/// One graded response, in administration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// The administered item.
    pub item_id: String,
    /// Whether the candidate answered correctly.
    pub correct: bool,
    /// Ability estimate before this response was scored.
    pub theta_before: f64,
    /// Ability estimate after this response was scored.
    pub theta_after: f64,
    /// Standard error after this response was scored.
    pub se_after: f64,
    /// Category of the administered item.
    pub category: Category,
    /// Calibration snapshot at administration time, so the estimator stays a
    /// pure function of the session history even if the bank is recalibrated.
    pub discrimination: f64,
    pub difficulty: f64,
    pub guessing: f64,
    /// Which estimator produced `theta_after`.
    pub estimation_method: crate::estimator::Method,
    /// When the response was recorded.
    pub timestamp: DateTime<Utc>,
    /// Seconds the candidate spent on the item.
    pub time_spent_seconds: u32,
}

/// Lifecycle state of an exam session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
    Abandoned,
}

impl SessionState {
    /// Terminal states accept no further items or responses.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Abandoned)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NotStarted => write!(f, "not_started"),
            SessionState::InProgress => write!(f, "in_progress"),
            SessionState::Completed => write!(f, "completed"),
            SessionState::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Final classification of a terminated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamOutcome {
    Passed,
    Failed,
    Inconclusive,
    Abandoned,
}

impl fmt::Display for ExamOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamOutcome::Passed => write!(f, "passed"),
            ExamOutcome::Failed => write!(f, "failed"),
            ExamOutcome::Inconclusive => write!(f, "inconclusive"),
            ExamOutcome::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// One candidate's exam session. Mutated only by the session controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The candidate taking the exam.
    pub candidate_id: String,
    /// Lifecycle state.
    pub state: SessionState,
    /// Exam configuration fixed at session start.
    pub config: ExamConfig,
    /// Items with a recorded response, in administration order. Always the
    /// same length as `responses`; the pending item is tracked separately.
    pub administered_item_ids: Vec<String>,
    /// The served-but-unanswered item, if any. Excluded from selection but
    /// not yet part of `administered_item_ids`.
    #[serde(default)]
    pub current_item_id: Option<String>,
    /// Graded responses, in administration order.
    pub responses: Vec<ResponseRecord>,
    /// Current ability estimate.
    pub theta: f64,
    /// Current standard error of the ability estimate.
    pub se: f64,
    /// Running minimum of `se`; an estimate above this signals estimator
    /// misuse and is logged.
    pub min_se: f64,
    /// Items administered per category.
    pub category_counts: BTreeMap<Category, u32>,
    /// When the session was started.
    pub started_at: DateTime<Utc>,
    /// Set exactly once, on termination.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Final classification; `None` while in progress.
    #[serde(default)]
    pub result: Option<ExamOutcome>,
    /// The stopping rule that terminated the exam, when one fired.
    #[serde(default)]
    pub stop_rule: Option<crate::stopping::StopRule>,
}

impl Session {
    /// Create a new, not-yet-started session for a candidate.
    pub fn new(candidate_id: impl Into<String>, config: ExamConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate_id: candidate_id.into(),
            state: SessionState::NotStarted,
            config,
            administered_item_ids: Vec::new(),
            current_item_id: None,
            responses: Vec::new(),
            theta: 0.0,
            se: STARTING_SE,
            min_se: STARTING_SE,
            category_counts: BTreeMap::new(),
            started_at: Utc::now(),
            completed_at: None,
            result: None,
            stop_rule: None,
        }
    }

    /// Item ids that must not be served again: everything answered plus the
    /// pending item.
    pub fn excluded_item_ids(&self) -> Vec<String> {
        let mut ids = self.administered_item_ids.clone();
        if let Some(current) = &self.current_item_id {
            ids.push(current.clone());
        }
        ids
    }

    /// Items administered in the given category so far.
    pub fn category_count(&self, category: Category) -> u32 {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }
}

/// Per-category share of the exam, as fractions of total items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryRange {
    /// Minimum fraction of the exam drawn from this category.
    pub min: f64,
    /// Maximum fraction of the exam drawn from this category.
    pub max: f64,
}

/// The content test plan: a `(min, max)` window per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestPlan {
    ranges: BTreeMap<Category, CategoryRange>,
}

impl TestPlan {
    /// Build a plan from explicit per-category ranges.
    pub fn new(ranges: BTreeMap<Category, CategoryRange>) -> Self {
        Self { ranges }
    }

    /// The published NCLEX-RN Client Needs distribution.
    pub fn nclex() -> Self {
        let ranges = [
            (Category::ManagementOfCare, 0.17, 0.23),
            (Category::SafetyAndInfectionControl, 0.09, 0.15),
            (Category::HealthPromotionAndMaintenance, 0.06, 0.12),
            (Category::PsychosocialIntegrity, 0.06, 0.12),
            (Category::BasicCareAndComfort, 0.06, 0.12),
            (Category::PharmacologicalTherapies, 0.12, 0.18),
            (Category::ReductionOfRiskPotential, 0.09, 0.15),
            (Category::PhysiologicalAdaptation, 0.11, 0.17),
        ]
        .into_iter()
        .map(|(category, min, max)| (category, CategoryRange { min, max }))
        .collect();
        Self { ranges }
    }

    /// A plan with the same `(min, max)` window for every category. Mostly
    /// useful in tests and small demo banks.
    pub fn uniform(min: f64, max: f64) -> Self {
        let ranges = Category::ALL
            .into_iter()
            .map(|category| (category, CategoryRange { min, max }))
            .collect();
        Self { ranges }
    }

    /// The window for one category.
    pub fn range(&self, category: Category) -> CategoryRange {
        self.ranges
            .get(&category)
            .copied()
            .unwrap_or(CategoryRange { min: 0.0, max: 1.0 })
    }

    /// Minimum item count for a category, anchored to the shortest legal
    /// exam: the minima must be satisfiable by `min_items`.
    pub fn min_count(&self, category: Category, min_items: u32) -> u32 {
        (self.range(category).min * min_items as f64).round() as u32
    }

    /// Maximum item count for a category, anchored to the longest exam.
    pub fn max_count(&self, category: Category, max_items: u32) -> u32 {
        (self.range(category).max * max_items as f64).ceil() as u32
    }

    /// Check the plan covers all categories with coherent windows.
    pub fn validate(&self) -> Result<(), String> {
        for category in Category::ALL {
            let Some(range) = self.ranges.get(&category) else {
                return Err(format!("test plan is missing category {}", category.key()));
            };
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(format!("test plan range for {} must be finite", category.key()));
            }
            if !(0.0..=1.0).contains(&range.min) || !(0.0..=1.0).contains(&range.max) {
                return Err(format!(
                    "test plan range for {} must lie in [0, 1]",
                    category.key()
                ));
            }
            if range.min > range.max {
                return Err(format!(
                    "test plan range for {} has min {} > max {}",
                    category.key(),
                    range.min,
                    range.max
                ));
            }
        }
        let min_sum: f64 = self.ranges.values().map(|r| r.min).sum();
        if min_sum > 1.0 + 1e-9 {
            return Err(format!(
                "test plan minimums sum to {min_sum:.2}; they cannot exceed 1.0"
            ));
        }
        let max_sum: f64 = self.ranges.values().map(|r| r.max).sum();
        if max_sum < 1.0 - 1e-9 {
            return Err(format!(
                "test plan maximums sum to {max_sum:.2}; they must cover the whole exam"
            ));
        }
        Ok(())
    }
}

impl Default for TestPlan {
    fn default() -> Self {
        Self::nclex()
    }
}

/// Configuration for one exam administration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamConfig {
    /// Fewest items before any stopping rule may fire.
    pub min_items: u32,
    /// Hard ceiling on exam length.
    pub max_items: u32,
    /// Precision-rule threshold on the standard error.
    #[serde(default = "default_se_threshold")]
    pub se_threshold: f64,
    /// Passing ability threshold on the logit scale.
    #[serde(default)]
    pub cut_score: f64,
    /// Size of the randomesque pool for exposure control.
    #[serde(default = "default_exposure_top_k")]
    pub exposure_top_k: usize,
    /// Content test plan.
    #[serde(default)]
    pub test_plan: TestPlan,
}

fn default_se_threshold() -> f64 {
    0.3
}

fn default_exposure_top_k() -> usize {
    5
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            min_items: 75,
            max_items: 145,
            se_threshold: default_se_threshold(),
            cut_score: 0.0,
            exposure_top_k: default_exposure_top_k(),
            test_plan: TestPlan::default(),
        }
    }
}

impl ExamConfig {
    /// Check bounds and the embedded test plan.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_items == 0 {
            return Err("min_items must be at least 1".into());
        }
        if self.max_items < self.min_items {
            return Err(format!(
                "max_items ({}) must be >= min_items ({})",
                self.max_items, self.min_items
            ));
        }
        if !self.se_threshold.is_finite() || self.se_threshold <= 0.0 {
            return Err(format!(
                "se_threshold must be > 0, got {}",
                self.se_threshold
            ));
        }
        if !self.cut_score.is_finite() {
            return Err("cut_score must be finite".into());
        }
        if self.exposure_top_k == 0 {
            return Err("exposure_top_k must be at least 1".into());
        }
        self.test_plan.validate()
    }
}
