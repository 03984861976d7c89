//! Terminal scoring and readiness classification.
//!
//! Pure derivations from the terminal session state: a logistic passing
//! probability scaled by the average discrimination of the administered
//! items, a confidence percentage relative to the starting standard error,
//! and a coarse readiness tier for display.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::STARTING_SE;

/// Display scaling constant relating the logit and normal-ogive metrics.
const D_SCALE: f64 = 1.7;

/// Readiness tier bucketed from the passing probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessTier {
    ExamReady,
    NearlyReady,
    Developing,
    NeedsPreparation,
}

impl fmt::Display for ReadinessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessTier::ExamReady => write!(f, "exam_ready"),
            ReadinessTier::NearlyReady => write!(f, "nearly_ready"),
            ReadinessTier::Developing => write!(f, "developing"),
            ReadinessTier::NeedsPreparation => write!(f, "needs_preparation"),
        }
    }
}

impl ReadinessTier {
    /// Bucket a passing probability into a tier.
    pub fn from_probability(passing_probability: f64) -> Self {
        if passing_probability >= 0.85 {
            ReadinessTier::ExamReady
        } else if passing_probability >= 0.70 {
            ReadinessTier::NearlyReady
        } else if passing_probability >= 0.55 {
            ReadinessTier::Developing
        } else {
            ReadinessTier::NeedsPreparation
        }
    }
}

/// The derived score block of a terminated exam.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExamScore {
    /// Logistic readiness indicator in (0, 1).
    pub passing_probability: f64,
    /// How far the standard error fell relative to the starting sentinel.
    pub confidence_percent: u8,
    /// Display tier derived from the passing probability.
    pub readiness: ReadinessTier,
}

/// Score a terminated exam from its final ability estimate.
///
/// `avg_discrimination` is the mean `a` of the administered items; it scales
/// the display logistic only and plays no part in estimation.
pub fn score(theta: f64, se: f64, cut_score: f64, avg_discrimination: f64) -> ExamScore {
    let exponent = -D_SCALE * avg_discrimination * (theta - cut_score);
    let passing_probability = 1.0 / (1.0 + exponent.exp());

    let confidence = (100.0 * (1.0 - se / STARTING_SE)).round().clamp(0.0, 100.0);

    ExamScore {
        passing_probability,
        confidence_percent: confidence as u8,
        readiness: ReadinessTier::from_probability(passing_probability),
    }
}
