//! Content balancing against the test plan.
//!
//! Decides which categories may supply the next item. A category is
//! *eligible* while it is under its maximum quota, and becomes *mandatory*
//! when the remaining slots before the minimum exam length can no longer
//! absorb the outstanding minimum-quota deficits (deadline scheduling over
//! the category quotas). Kept separate from the item selector so the quota
//! arithmetic is independently testable.

use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::model::{Category, TestPlan};

/// Categories the next item may be drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEligibility {
    /// Categories under their maximum quota.
    pub eligible: Vec<Category>,
    /// Deficit categories the next item must be drawn from; empty when
    /// selection is unconstrained.
    pub mandatory: Vec<Category>,
}

impl CategoryEligibility {
    /// The pool to select from: mandatory categories when deadline pressure
    /// applies, otherwise everything eligible.
    pub fn pool(&self) -> &[Category] {
        if self.mandatory.is_empty() {
            &self.eligible
        } else {
            &self.mandatory
        }
    }
}

/// Compute category eligibility for the next selection.
///
/// `administered` is the number of items already answered. Fails with
/// [`EngineError::NoEligibleCategory`] when the plan is infeasible: the
/// outstanding minimum deficits no longer fit in the slots left before
/// `max_items`, or no category is under its maximum.
pub fn eligibility(
    counts: &BTreeMap<Category, u32>,
    plan: &TestPlan,
    administered: u32,
    min_items: u32,
    max_items: u32,
) -> Result<CategoryEligibility, EngineError> {
    let remaining_to_max = max_items.saturating_sub(administered);
    if remaining_to_max == 0 {
        return Err(EngineError::NoEligibleCategory);
    }
    let slots_to_min = min_items.saturating_sub(administered);

    let mut eligible = Vec::new();
    let mut deficit_categories = Vec::new();
    let mut total_deficit = 0u32;

    for category in Category::ALL {
        let count = counts.get(&category).copied().unwrap_or(0);
        if count < plan.max_count(category, max_items) {
            eligible.push(category);
        }
        let deficit = plan.min_count(category, min_items).saturating_sub(count);
        if deficit > 0 {
            deficit_categories.push(category);
            total_deficit += deficit;
        }
    }

    if total_deficit > remaining_to_max {
        return Err(EngineError::NoEligibleCategory);
    }
    if eligible.is_empty() {
        return Err(EngineError::NoEligibleCategory);
    }

    let mandatory = if total_deficit > 0 && total_deficit >= slots_to_min {
        deficit_categories
    } else {
        Vec::new()
    };

    Ok(CategoryEligibility { eligible, mandatory })
}

/// Whether every category has met its minimum quota. Terminal states other
/// than abandonment are unreachable until this holds.
pub fn minimums_met(counts: &BTreeMap<Category, u32>, plan: &TestPlan, min_items: u32) -> bool {
    Category::ALL.into_iter().all(|category| {
        counts.get(&category).copied().unwrap_or(0) >= plan.min_count(category, min_items)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(Category, u32)]) -> BTreeMap<Category, u32> {
        entries.iter().copied().collect()
    }

    #[test]
    fn fresh_exam_is_unconstrained_under_nclex_plan() {
        let plan = TestPlan::nclex();
        let result = eligibility(&BTreeMap::new(), &plan, 0, 75, 145).unwrap();
        assert_eq!(result.eligible.len(), 8);
        // Sum of minimum quotas at 75 items is well below 75, so nothing is
        // mandatory on the first turn.
        assert!(result.mandatory.is_empty());
        assert_eq!(result.pool().len(), 8);
    }

    #[test]
    fn deadline_pressure_makes_deficit_categories_mandatory() {
        let plan = TestPlan::uniform(0.1, 1.0);
        // min_count per category at min_items 10 is 1. After three picks from
        // one category, 7 deficits remain against 7 slots to min_items: every
        // remaining pick is spoken for.
        let c = counts(&[(Category::ManagementOfCare, 3)]);
        let result = eligibility(&c, &plan, 3, 10, 50).unwrap();
        assert_eq!(result.mandatory.len(), 7);
        assert!(!result.mandatory.contains(&Category::ManagementOfCare));
        assert_eq!(result.pool().len(), 7);
    }

    #[test]
    fn deficits_stay_mandatory_past_min_items() {
        let plan = TestPlan::uniform(0.1, 1.0);
        let mut c = BTreeMap::new();
        for category in Category::ALL {
            c.insert(category, 2);
        }
        c.insert(Category::PsychosocialIntegrity, 0);
        // Past min_items with one category still under quota: it is the only
        // legal pool until the deficit closes.
        let result = eligibility(&c, &plan, 14, 10, 50).unwrap();
        assert_eq!(result.mandatory, vec![Category::PsychosocialIntegrity]);
    }

    #[test]
    fn category_at_maximum_is_not_eligible() {
        let plan = TestPlan::uniform(0.0, 0.2);
        let c = counts(&[(Category::BasicCareAndComfort, 10)]);
        // max_count = ceil(0.2 * 50) = 10.
        let result = eligibility(&c, &plan, 10, 10, 50).unwrap();
        assert!(!result.eligible.contains(&Category::BasicCareAndComfort));
        assert_eq!(result.eligible.len(), 7);
    }

    #[test]
    fn infeasible_deficit_is_an_error() {
        let plan = TestPlan::uniform(0.1, 1.0);
        // 8 outstanding single-item deficits but only 3 slots to max_items.
        let result = eligibility(&BTreeMap::new(), &plan, 7, 10, 10);
        assert!(matches!(result, Err(EngineError::NoEligibleCategory)));
    }

    #[test]
    fn exhausted_exam_is_an_error() {
        let plan = TestPlan::nclex();
        let result = eligibility(&BTreeMap::new(), &plan, 145, 75, 145);
        assert!(matches!(result, Err(EngineError::NoEligibleCategory)));
    }

    #[test]
    fn minimums_met_tracks_quotas() {
        let plan = TestPlan::uniform(0.1, 1.0);
        let mut c = BTreeMap::new();
        assert!(!minimums_met(&c, &plan, 10));
        for category in Category::ALL {
            c.insert(category, 1);
        }
        assert!(minimums_met(&c, &plan, 10));
    }
}
