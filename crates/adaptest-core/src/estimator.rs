//! Ability estimation under the three-parameter logistic (3PL) IRT model.
//!
//! The primary estimator is a Newton-Raphson maximum-likelihood search using
//! the Fisher information as the curvature. Histories for which the MLE is
//! undefined (all correct, all incorrect) or fails to converge fall back to a
//! Bayesian EAP estimate under a standard normal prior, integrated over a
//! bounded ability grid. Both paths are pure functions of the response
//! history.

use serde::{Deserialize, Serialize};

/// Lower bound of the ability scale.
pub const THETA_MIN: f64 = -4.0;
/// Upper bound of the ability scale.
pub const THETA_MAX: f64 = 4.0;

const CONVERGENCE_TOL: f64 = 1e-4;
const MAX_ITERATIONS: usize = 25;
/// Quadrature points for the EAP grid over [THETA_MIN, THETA_MAX].
const GRID_POINTS: usize = 81;
/// Keeps probabilities away from 0 and 1 in log-likelihood terms.
const PROB_FLOOR: f64 = 1e-9;

/// One scored response with the calibration needed to evaluate it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemResponse {
    pub discrimination: f64,
    pub difficulty: f64,
    pub guessing: f64,
    pub correct: bool,
}

/// Which estimator produced the point estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    MaximumLikelihood,
    ExpectedAPosteriori,
}

/// A point estimate of latent ability with its standard error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub theta: f64,
    pub se: f64,
    pub method: Method,
}

/// 3PL probability of a correct response at ability `theta`.
///
/// `P(theta) = c + (1 - c) / (1 + exp(-a (theta - b)))`
pub fn probability(theta: f64, discrimination: f64, difficulty: f64, guessing: f64) -> f64 {
    let logistic = 1.0 / (1.0 + (-discrimination * (theta - difficulty)).exp());
    guessing + (1.0 - guessing) * logistic
}

/// Fisher information contributed by one item at ability `theta`.
///
/// `I(theta) = a^2 (P - c)^2 (1 - P) / (P (1 - c)^2)`
pub fn item_information(theta: f64, discrimination: f64, difficulty: f64, guessing: f64) -> f64 {
    let p = probability(theta, discrimination, difficulty, guessing).clamp(PROB_FLOOR, 1.0 - PROB_FLOOR);
    let q = 1.0 - p;
    let numerator = discrimination.powi(2) * (p - guessing).powi(2) * q;
    let denominator = p * (1.0 - guessing).powi(2);
    numerator / denominator
}

/// Total Fisher information of a response set at ability `theta`.
pub fn test_information(theta: f64, responses: &[ItemResponse]) -> f64 {
    responses
        .iter()
        .map(|r| item_information(theta, r.discrimination, r.difficulty, r.guessing))
        .sum()
}

/// Estimate ability from an ordered response history.
///
/// Uses MLE when the history contains both correct and incorrect responses
/// and the Newton-Raphson search converges; otherwise EAP.
pub fn estimate(responses: &[ItemResponse]) -> Estimate {
    let any_correct = responses.iter().any(|r| r.correct);
    let any_incorrect = responses.iter().any(|r| !r.correct);

    if any_correct && any_incorrect {
        if let Some(estimate) = maximum_likelihood(responses) {
            return estimate;
        }
    }
    expected_a_posteriori(responses)
}

/// First derivative of the 3PL log-likelihood at `theta`.
fn score_function(theta: f64, responses: &[ItemResponse]) -> f64 {
    responses
        .iter()
        .map(|r| {
            let p = probability(theta, r.discrimination, r.difficulty, r.guessing)
                .clamp(PROB_FLOOR, 1.0 - PROB_FLOOR);
            let x = if r.correct { 1.0 } else { 0.0 };
            r.discrimination * (x - p) * (p - r.guessing) / (p * (1.0 - r.guessing))
        })
        .sum()
}

fn maximum_likelihood(responses: &[ItemResponse]) -> Option<Estimate> {
    let mut theta = 0.0f64;

    for _ in 0..MAX_ITERATIONS {
        let information = test_information(theta, responses);
        if information <= f64::EPSILON {
            return None;
        }
        let delta = score_function(theta, responses) / information;
        theta = (theta + delta).clamp(THETA_MIN, THETA_MAX);

        if delta.abs() < CONVERGENCE_TOL {
            let information = test_information(theta, responses);
            if information <= f64::EPSILON {
                return None;
            }
            return Some(Estimate {
                theta,
                se: information.sqrt().recip(),
                method: Method::MaximumLikelihood,
            });
        }
    }

    None
}

/// Log-likelihood of the history at `theta`.
fn log_likelihood(theta: f64, responses: &[ItemResponse]) -> f64 {
    responses
        .iter()
        .map(|r| {
            let p = probability(theta, r.discrimination, r.difficulty, r.guessing)
                .clamp(PROB_FLOOR, 1.0 - PROB_FLOOR);
            if r.correct {
                p.ln()
            } else {
                (1.0 - p).ln()
            }
        })
        .sum()
}

/// EAP estimate under an N(0,1) prior, integrated over a fixed ability grid.
fn expected_a_posteriori(responses: &[ItemResponse]) -> Estimate {
    let step = (THETA_MAX - THETA_MIN) / (GRID_POINTS - 1) as f64;

    // Work in log space, shifted by the maximum, so long histories cannot
    // underflow the weights.
    let mut log_weights = [0.0f64; GRID_POINTS];
    let mut max_log = f64::NEG_INFINITY;
    for (k, log_weight) in log_weights.iter_mut().enumerate() {
        let theta = THETA_MIN + step * k as f64;
        let lw = -0.5 * theta * theta + log_likelihood(theta, responses);
        *log_weight = lw;
        if lw > max_log {
            max_log = lw;
        }
    }

    let mut total = 0.0f64;
    let mut mean = 0.0f64;
    for (k, log_weight) in log_weights.iter().enumerate() {
        let theta = THETA_MIN + step * k as f64;
        let w = (log_weight - max_log).exp();
        total += w;
        mean += w * theta;
    }
    mean /= total;

    let mut variance = 0.0f64;
    for (k, log_weight) in log_weights.iter().enumerate() {
        let theta = THETA_MIN + step * k as f64;
        let w = (log_weight - max_log).exp();
        variance += w * (theta - mean).powi(2);
    }
    variance /= total;

    Estimate {
        theta: mean.clamp(THETA_MIN, THETA_MAX),
        se: variance.sqrt(),
        method: Method::ExpectedAPosteriori,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(difficulty: f64, correct: bool) -> ItemResponse {
        ItemResponse {
            discrimination: 1.0,
            difficulty,
            guessing: 0.0,
            correct,
        }
    }

    #[test]
    fn probability_at_difficulty_is_midpoint() {
        // At theta == b the logistic term is 1/2, so P = c + (1 - c)/2.
        let p = probability(0.0, 1.0, 0.0, 0.2);
        assert!((p - 0.6).abs() < 1e-12);

        let p = probability(1.5, 2.0, 1.5, 0.0);
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn probability_is_increasing_in_theta() {
        let low = probability(-2.0, 1.2, 0.0, 0.25);
        let mid = probability(0.0, 1.2, 0.0, 0.25);
        let high = probability(2.0, 1.2, 0.0, 0.25);
        assert!(low < mid && mid < high);
        assert!(low > 0.25, "3PL floor is the guessing parameter");
        assert!(high < 1.0);
    }

    #[test]
    fn information_peaks_near_difficulty_without_guessing() {
        // For c = 0 at theta == b, I = a^2 * P(1-P) = a^2 / 4.
        let info = item_information(0.0, 2.0, 0.0, 0.0);
        assert!((info - 1.0).abs() < 1e-12);

        let off_target = item_information(3.0, 2.0, 0.0, 0.0);
        assert!(off_target < info);
    }

    #[test]
    fn mixed_history_uses_mle() {
        let history = vec![response(0.0, true), response(0.0, false)];
        let est = estimate(&history);
        assert_eq!(est.method, Method::MaximumLikelihood);
        // Symmetric history on symmetric items: the score is zero at theta 0.
        assert!(est.theta.abs() < 1e-6);
        // I(0) = 2 * 0.25, so SE = 1/sqrt(0.5).
        assert!((est.se - 2.0f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn all_correct_falls_back_to_eap() {
        let history = vec![response(0.0, true), response(0.5, true), response(1.0, true)];
        let est = estimate(&history);
        assert_eq!(est.method, Method::ExpectedAPosteriori);
        assert!(est.theta > 0.0);
        assert!(est.se > 0.0);
    }

    #[test]
    fn all_incorrect_falls_back_to_eap() {
        let history = vec![response(0.0, false), response(-0.5, false)];
        let est = estimate(&history);
        assert_eq!(est.method, Method::ExpectedAPosteriori);
        assert!(est.theta < 0.0);
    }

    #[test]
    fn empty_history_returns_prior() {
        let est = estimate(&[]);
        assert_eq!(est.method, Method::ExpectedAPosteriori);
        assert!(est.theta.abs() < 1e-9);
        // Posterior over a truncated N(0,1) prior: sd close to 1.
        assert!(est.se > 0.9 && est.se < 1.05);
    }

    #[test]
    fn estimates_stay_within_bounds() {
        let history: Vec<ItemResponse> = (0..30).map(|_| response(-3.0, true)).collect();
        let est = estimate(&history);
        assert!(est.theta <= THETA_MAX);

        let history: Vec<ItemResponse> = (0..30).map(|_| response(3.0, false)).collect();
        let est = estimate(&history);
        assert!(est.theta >= THETA_MIN);
    }

    #[test]
    fn flipping_a_response_to_correct_never_lowers_theta() {
        // Both histories mixed, so both take the MLE path.
        let base = vec![
            response(-0.5, true),
            response(0.0, false),
            response(0.5, false),
            response(0.2, true),
        ];
        let mut flipped = base.clone();
        flipped[2].correct = true;

        let est_base = estimate(&base);
        let est_flipped = estimate(&flipped);
        assert!(est_flipped.theta >= est_base.theta);
    }

    #[test]
    fn flipping_across_the_eap_boundary_never_lowers_theta() {
        // Flipping the single incorrect response moves the history from MLE
        // territory (theta 0 by symmetry) to the all-correct EAP fallback.
        let base = vec![response(0.0, true), response(0.0, false)];
        let mut flipped = base.clone();
        flipped[1].correct = true;

        let est_base = estimate(&base);
        let est_flipped = estimate(&flipped);
        assert_eq!(est_base.method, Method::MaximumLikelihood);
        assert_eq!(est_flipped.method, Method::ExpectedAPosteriori);
        assert!(est_flipped.theta >= est_base.theta);
    }

    #[test]
    fn more_responses_shrink_the_standard_error() {
        let short: Vec<ItemResponse> = (0..4)
            .map(|i| response(0.1 * i as f64, i % 2 == 0))
            .collect();
        let long: Vec<ItemResponse> = (0..20)
            .map(|i| response(0.1 * (i % 5) as f64, i % 2 == 0))
            .collect();
        assert!(estimate(&long).se < estimate(&short).se);
    }

    #[test]
    fn estimation_is_deterministic() {
        let history: Vec<ItemResponse> = (0..12)
            .map(|i| ItemResponse {
                discrimination: 0.8 + 0.05 * i as f64,
                difficulty: -1.0 + 0.2 * i as f64,
                guessing: 0.2,
                correct: i % 3 != 0,
            })
            .collect();
        let a = estimate(&history);
        let b = estimate(&history);
        assert_eq!(a.theta, b.theta);
        assert_eq!(a.se, b.se);
        assert_eq!(a.method, b.method);
    }
}
