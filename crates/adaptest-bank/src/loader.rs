//! TOML item bank loader.
//!
//! Bank files carry a `[bank]` header and a list of `[[items]]`. Every item
//! is validated at load time so a bad calibration fails fast, not mid-exam.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use adaptest_core::model::{Category, Item};

/// Intermediate TOML structure for a bank file.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    id: String,
    category: String,
    discrimination: f64,
    difficulty: f64,
    guessing: f64,
    key: String,
    #[serde(default)]
    stem: Option<String>,
    #[serde(default)]
    times_administered: u32,
    #[serde(default = "default_true")]
    active: bool,
}

fn default_true() -> bool {
    true
}

/// Parse a bank file's contents into validated items.
pub fn parse_bank(content: &str) -> Result<Vec<Item>> {
    let file: TomlBankFile = toml::from_str(content).context("failed to parse item bank")?;
    if file.bank.id.trim().is_empty() {
        bail!("bank id must not be empty");
    }

    let mut items = Vec::with_capacity(file.items.len());
    for raw in file.items {
        let category: Category = raw
            .category
            .parse()
            .map_err(|e: String| anyhow::anyhow!("item {}: {e}", raw.id))?;
        let item = Item {
            id: raw.id,
            category,
            discrimination: raw.discrimination,
            difficulty: raw.difficulty,
            guessing: raw.guessing,
            times_administered: raw.times_administered,
            active: raw.active,
            key: raw.key,
            stem: raw.stem,
        };
        if let Err(e) = item.validate() {
            bail!("invalid item in bank {}: {e}", file.bank.id);
        }
        items.push(item);
    }

    if let Some(duplicate) = first_duplicate_id(&items) {
        bail!("duplicate item id in bank {}: {duplicate}", file.bank.id);
    }

    tracing::debug!(
        bank = %file.bank.id,
        name = %file.bank.name,
        items = items.len(),
        "item bank parsed"
    );
    Ok(items)
}

/// Load one bank file.
pub fn load_bank(path: &Path) -> Result<Vec<Item>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank from {}", path.display()))?;
    parse_bank(&content).with_context(|| format!("in bank file {}", path.display()))
}

/// Load every `.toml` bank file in a directory, combining the pools.
pub fn load_bank_dir(dir: &Path) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read bank directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            items.extend(load_bank(&path)?);
        }
    }
    if let Some(duplicate) = first_duplicate_id(&items) {
        bail!(
            "duplicate item id across bank files in {}: {duplicate}",
            dir.display()
        );
    }
    Ok(items)
}

fn first_duplicate_id(items: &[Item]) -> Option<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .iter()
        .find(|item| !seen.insert(item.id.as_str()))
        .map(|item| item.id.clone())
}
