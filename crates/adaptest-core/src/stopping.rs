//! Stopping rules for the adaptive exam.
//!
//! Evaluated after every response, in strict priority order: the 95%
//! confidence interval against the cut score, then the standard-error
//! precision rule, then exhaustion at the item ceiling. Nothing may fire
//! before the minimum exam length is reached and the test plan minimums are
//! satisfied.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{ExamConfig, ExamOutcome};

/// Two-sided 95% confidence half-width multiplier.
const Z_95: f64 = 1.96;

/// Which stopping rule terminated the exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopRule {
    ConfidenceInterval,
    Precision,
    Exhaustion,
}

impl fmt::Display for StopRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopRule::ConfidenceInterval => write!(f, "confidence_interval"),
            StopRule::Precision => write!(f, "precision"),
            StopRule::Exhaustion => write!(f, "exhaustion"),
        }
    }
}

/// The evaluator's verdict for this turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Continue,
    Stop { outcome: ExamOutcome, rule: StopRule },
}

/// Evaluate the stopping rules after a scored response.
///
/// `minimums_met` is the balancer's verdict on the test-plan minimum quotas.
pub fn evaluate(
    responses: u32,
    theta: f64,
    se: f64,
    minimums_met: bool,
    config: &ExamConfig,
) -> Decision {
    if responses < config.min_items || !minimums_met {
        // The ceiling still binds even when quotas were never met; that case
        // indicates an over-constrained plan and is surfaced as inconclusive.
        if responses >= config.max_items {
            return Decision::Stop {
                outcome: ExamOutcome::Inconclusive,
                rule: StopRule::Exhaustion,
            };
        }
        return Decision::Continue;
    }

    let lower = theta - Z_95 * se;
    let upper = theta + Z_95 * se;
    if lower > config.cut_score {
        return Decision::Stop {
            outcome: ExamOutcome::Passed,
            rule: StopRule::ConfidenceInterval,
        };
    }
    if upper < config.cut_score {
        return Decision::Stop {
            outcome: ExamOutcome::Failed,
            rule: StopRule::ConfidenceInterval,
        };
    }

    if se <= config.se_threshold {
        let outcome = if theta >= config.cut_score {
            ExamOutcome::Passed
        } else {
            ExamOutcome::Failed
        };
        return Decision::Stop {
            outcome,
            rule: StopRule::Precision,
        };
    }

    if responses >= config.max_items {
        return Decision::Stop {
            outcome: ExamOutcome::Inconclusive,
            rule: StopRule::Exhaustion,
        };
    }

    Decision::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min_items: u32, max_items: u32) -> ExamConfig {
        ExamConfig {
            min_items,
            max_items,
            ..ExamConfig::default()
        }
    }

    #[test]
    fn never_stops_below_min_items() {
        let cfg = config(10, 50);
        // A wildly confident estimate still cannot end the exam early.
        let decision = evaluate(9, 3.0, 0.1, true, &cfg);
        assert_eq!(decision, Decision::Continue);
    }

    #[test]
    fn never_stops_with_unmet_quotas() {
        let cfg = config(10, 50);
        let decision = evaluate(20, 3.0, 0.1, false, &cfg);
        assert_eq!(decision, Decision::Continue);
    }

    #[test]
    fn confidence_interval_passes() {
        let cfg = config(10, 50);
        // lower bound 1.0 - 1.96 * 0.4 = 0.216 > 0.
        let decision = evaluate(12, 1.0, 0.4, true, &cfg);
        assert_eq!(
            decision,
            Decision::Stop {
                outcome: ExamOutcome::Passed,
                rule: StopRule::ConfidenceInterval
            }
        );
    }

    #[test]
    fn confidence_interval_fails() {
        let cfg = config(10, 50);
        let decision = evaluate(12, -1.0, 0.4, true, &cfg);
        assert_eq!(
            decision,
            Decision::Stop {
                outcome: ExamOutcome::Failed,
                rule: StopRule::ConfidenceInterval
            }
        );
    }

    #[test]
    fn precision_rule_classifies_by_theta() {
        let cfg = config(10, 50);
        // CI straddles the cut but the estimate is precise enough.
        let above = evaluate(20, 0.2, 0.25, true, &cfg);
        assert_eq!(
            above,
            Decision::Stop {
                outcome: ExamOutcome::Passed,
                rule: StopRule::Precision
            }
        );

        let below = evaluate(20, -0.2, 0.25, true, &cfg);
        assert_eq!(
            below,
            Decision::Stop {
                outcome: ExamOutcome::Failed,
                rule: StopRule::Precision
            }
        );
    }

    #[test]
    fn confidence_interval_takes_priority_over_precision() {
        let cfg = config(10, 50);
        // Both rules would fire; the CI rule is reported.
        let decision = evaluate(20, 1.0, 0.25, true, &cfg);
        assert_eq!(
            decision,
            Decision::Stop {
                outcome: ExamOutcome::Passed,
                rule: StopRule::ConfidenceInterval
            }
        );
    }

    #[test]
    fn exhaustion_yields_inconclusive() {
        let cfg = config(10, 50);
        let decision = evaluate(50, 0.1, 0.5, true, &cfg);
        assert_eq!(
            decision,
            Decision::Stop {
                outcome: ExamOutcome::Inconclusive,
                rule: StopRule::Exhaustion
            }
        );
    }

    #[test]
    fn exhaustion_applies_even_with_unmet_quotas() {
        let cfg = config(10, 50);
        let decision = evaluate(50, 0.1, 0.5, false, &cfg);
        assert_eq!(
            decision,
            Decision::Stop {
                outcome: ExamOutcome::Inconclusive,
                rule: StopRule::Exhaustion
            }
        );
    }

    #[test]
    fn borderline_continues() {
        let cfg = config(10, 50);
        let decision = evaluate(20, 0.1, 0.5, true, &cfg);
        assert_eq!(decision, Decision::Continue);
    }
}
