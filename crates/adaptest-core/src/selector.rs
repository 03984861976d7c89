//! Maximum-information item selection with randomesque exposure control.
//!
//! Candidates are ranked by Fisher information at the current ability
//! estimate; the next item is drawn uniformly from the top K rather than
//! always the single best, so high-information items are not burned across
//! the whole candidate population. The random source is injected, which keeps
//! full exam trajectories reproducible under a fixed seed.

use std::cmp::Ordering;

use rand::Rng;
use uuid::Uuid;

use crate::error::EngineError;
use crate::estimator;
use crate::model::Item;

/// Pick the next item from the candidate pool at ability `theta`.
///
/// Ranking is by information descending, then by exposure ascending so that
/// equally informative items rotate, then by id for a stable total order.
/// `top_k` is clamped to the pool size; the caller passes the session id only
/// for error context.
pub fn select_item<'a, R: Rng>(
    candidates: &'a [Item],
    theta: f64,
    top_k: usize,
    session_id: Uuid,
    rng: &mut R,
) -> Result<&'a Item, EngineError> {
    if candidates.is_empty() {
        return Err(EngineError::NoEligibleItems(session_id));
    }

    let mut ranked: Vec<(f64, &Item)> = candidates
        .iter()
        .map(|item| {
            let info =
                estimator::item_information(theta, item.discrimination, item.difficulty, item.guessing);
            (info, item)
        })
        .collect();

    ranked.sort_by(|(info_a, item_a), (info_b, item_b)| {
        info_b
            .partial_cmp(info_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| item_a.times_administered.cmp(&item_b.times_administered))
            .then_with(|| item_a.id.cmp(&item_b.id))
    });

    let pool = top_k.max(1).min(ranked.len());
    let choice = rng.gen_range(0..pool);
    Ok(ranked[choice].1)
}
