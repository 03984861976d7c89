//! TOML exam configuration parser.
//!
//! Loads an `ExamConfig` (exam bounds plus the content test plan) from a
//! TOML file and validates it. A missing `[test_plan]` table falls back to
//! the published NCLEX distribution.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::model::{Category, CategoryRange, ExamConfig, TestPlan};

/// Intermediate TOML structure for a config file.
#[derive(Debug, Deserialize)]
struct TomlConfigFile {
    exam: TomlExamSection,
    #[serde(default)]
    test_plan: Option<BTreeMap<String, TomlCategoryRange>>,
}

#[derive(Debug, Deserialize)]
struct TomlExamSection {
    min_items: u32,
    max_items: u32,
    #[serde(default = "default_se_threshold")]
    se_threshold: f64,
    #[serde(default)]
    cut_score: f64,
    #[serde(default = "default_exposure_top_k")]
    exposure_top_k: usize,
}

fn default_se_threshold() -> f64 {
    0.3
}

fn default_exposure_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize)]
struct TomlCategoryRange {
    min: f64,
    max: f64,
}

/// Parse an exam configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ExamConfig> {
    let file: TomlConfigFile = toml::from_str(content).context("failed to parse exam config")?;

    let test_plan = match file.test_plan {
        None => TestPlan::default(),
        Some(entries) => {
            let mut ranges = BTreeMap::new();
            for (key, range) in entries {
                let category: Category = match key.parse() {
                    Ok(category) => category,
                    Err(e) => bail!("invalid test plan entry: {e}"),
                };
                ranges.insert(
                    category,
                    CategoryRange {
                        min: range.min,
                        max: range.max,
                    },
                );
            }
            TestPlan::new(ranges)
        }
    };

    let config = ExamConfig {
        min_items: file.exam.min_items,
        max_items: file.exam.max_items,
        se_threshold: file.exam.se_threshold,
        cut_score: file.exam.cut_score,
        exposure_top_k: file.exam.exposure_top_k,
        test_plan,
    };

    if let Err(e) = config.validate() {
        bail!("invalid exam config: {e}");
    }
    Ok(config)
}

/// Load and validate an exam configuration file.
pub fn load_config(path: &Path) -> Result<ExamConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    parse_config(&content).with_context(|| format!("in config file {}", path.display()))
}
