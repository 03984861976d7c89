//! The `adaptest validate` command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Result};
use comfy_table::Table;

use adaptest_core::model::Category;

pub fn execute(bank: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let items = super::load_items(&bank)?;
    let exam_config = super::load_exam_config(config.as_deref())?;

    let mut active_by_category: BTreeMap<Category, usize> = BTreeMap::new();
    let mut active = 0usize;
    for item in &items {
        if item.active {
            active += 1;
            *active_by_category.entry(item.category).or_insert(0) += 1;
        }
    }

    println!("Bank OK: {} items ({} active)", items.len(), active);

    let mut table = Table::new();
    table.set_header(vec!["Category", "Active items", "Quota (min-max)"]);
    for category in Category::ALL {
        let count = active_by_category.get(&category).copied().unwrap_or(0);
        let min = exam_config
            .test_plan
            .min_count(category, exam_config.min_items);
        let max = exam_config
            .test_plan
            .max_count(category, exam_config.max_items);
        table.add_row(vec![
            category.to_string(),
            count.to_string(),
            format!("{min}-{max}"),
        ]);
    }
    println!("{table}");

    // A category with a minimum quota but no items can never satisfy the
    // plan; fail fast instead of terminating exams inconclusive.
    for category in Category::ALL {
        let min = exam_config
            .test_plan
            .min_count(category, exam_config.min_items);
        let count = active_by_category.get(&category).copied().unwrap_or(0);
        if min > 0 && count == 0 {
            bail!(
                "category {} requires at least {min} items but the bank has none",
                category.key()
            );
        }
    }

    println!(
        "Config OK: {} to {} items, se threshold {}, cut score {}",
        exam_config.min_items,
        exam_config.max_items,
        exam_config.se_threshold,
        exam_config.cut_score
    );
    println!("All checks passed");
    Ok(())
}
