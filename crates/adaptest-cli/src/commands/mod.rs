//! CLI subcommand implementations.

use std::path::Path;

use anyhow::Result;

use adaptest_core::model::{ExamConfig, Item};

pub mod init;
pub mod report;
pub mod simulate;
pub mod validate;

/// Load items from a bank file or every bank file in a directory.
pub(crate) fn load_items(path: &Path) -> Result<Vec<Item>> {
    if path.is_dir() {
        adaptest_bank::load_bank_dir(path)
    } else {
        adaptest_bank::load_bank(path)
    }
}

/// Load the exam config, or fall back to the built-in NCLEX defaults.
pub(crate) fn load_exam_config(path: Option<&Path>) -> Result<ExamConfig> {
    match path {
        Some(path) => adaptest_core::parser::load_config(path),
        None => Ok(ExamConfig::default()),
    }
}
