//! The `adaptest simulate` command.
//!
//! Runs simulated candidates through the real engine: each response is drawn
//! from the 3PL probability of a correct answer at the configured true
//! ability, so a seeded run exercises the full select/estimate/stop loop
//! deterministically.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use comfy_table::Table;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use adaptest_bank::MemoryBank;
use adaptest_core::engine::ExamEngine;
use adaptest_core::estimator;
use adaptest_core::model::{ExamConfig, Item};
use adaptest_core::report::ExamReport;
use adaptest_store::MemoryStore;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    bank: PathBuf,
    config: Option<PathBuf>,
    ability: f64,
    candidates: usize,
    seed: Option<u64>,
    output: Option<PathBuf>,
    format: String,
) -> Result<()> {
    if !["json", "markdown", "html", "all"].contains(&format.as_str()) {
        bail!("unknown report format: {format}");
    }

    let items = super::load_items(&bank)?;
    if items.is_empty() {
        bail!("bank {} contains no items", bank.display());
    }
    let exam_config = super::load_exam_config(config.as_deref())?;

    let by_id: HashMap<String, Item> =
        items.iter().map(|i| (i.id.clone(), i.clone())).collect();

    let bank_impl: Arc<MemoryBank> = Arc::new(MemoryBank::from_items(items));
    let store = Arc::new(MemoryStore::new());
    let engine = match seed {
        Some(seed) => ExamEngine::with_seed(bank_impl, store, seed),
        None => ExamEngine::new(bank_impl, store),
    };

    let mut table = Table::new();
    table.set_header(vec![
        "Candidate",
        "Outcome",
        "Items",
        "Ability",
        "SE",
        "Pass prob",
        "Confidence",
        "Readiness",
    ]);

    for i in 1..=candidates {
        let candidate_id = format!("candidate-{i}");
        let mut response_rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(i as u64)),
            None => StdRng::from_entropy(),
        };

        let report = run_candidate(
            &engine,
            &by_id,
            &candidate_id,
            exam_config.clone(),
            ability,
            &mut response_rng,
        )
        .await?;

        tracing::info!(
            candidate = %candidate_id,
            outcome = %report.outcome,
            items = report.total_questions,
            theta = report.final_ability,
            "simulated exam finished"
        );

        table.add_row(vec![
            candidate_id.clone(),
            report.outcome.to_string(),
            report.total_questions.to_string(),
            format!("{:.3}", report.final_ability),
            format!("{:.3}", report.standard_error),
            format!("{:.1}%", report.passing_probability * 100.0),
            format!("{}%", report.confidence_percent),
            report.readiness.to_string(),
        ]);

        if let Some(dir) = &output {
            write_reports(&report, dir, &candidate_id, &format)?;
        }
    }

    println!("{table}");
    Ok(())
}

/// Drive one candidate to a terminal state.
async fn run_candidate(
    engine: &ExamEngine,
    items: &HashMap<String, Item>,
    candidate_id: &str,
    config: ExamConfig,
    ability: f64,
    rng: &mut StdRng,
) -> Result<ExamReport> {
    let mut snapshot = engine
        .start_session(candidate_id, config)
        .await
        .with_context(|| format!("failed to start session for {candidate_id}"))?;

    while snapshot.result.is_none() {
        let served = snapshot
            .current_item
            .clone()
            .context("in-progress session without a pending item")?;
        let item = items
            .get(&served.id)
            .with_context(|| format!("served unknown item {}", served.id))?;

        let p = estimator::probability(
            ability,
            item.discrimination,
            item.difficulty,
            item.guessing,
        );
        let correct = rng.gen_bool(p.clamp(0.0, 1.0));
        let selected = if correct {
            item.key.clone()
        } else {
            wrong_answer(&item.key)
        };
        let time_spent = rng.gen_range(20..=120);

        snapshot = engine
            .submit_response(snapshot.session_id, &served.id, &selected, time_spent)
            .await
            .with_context(|| format!("failed to submit response for {candidate_id}"))?;
    }

    engine
        .result(snapshot.session_id)
        .await
        .with_context(|| format!("failed to build report for {candidate_id}"))
}

/// Any token that cannot match the key.
fn wrong_answer(key: &str) -> String {
    if key.eq_ignore_ascii_case("x") {
        "y".to_string()
    } else {
        "x".to_string()
    }
}

fn write_reports(
    report: &ExamReport,
    dir: &Path,
    candidate_id: &str,
    format: &str,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    if format == "json" || format == "all" {
        report.save_json(&dir.join(format!("{candidate_id}.json")))?;
    }
    if format == "markdown" || format == "all" {
        std::fs::write(
            dir.join(format!("{candidate_id}.md")),
            adaptest_report::to_markdown(report),
        )?;
    }
    if format == "html" || format == "all" {
        adaptest_report::save_html(report, &dir.join(format!("{candidate_id}.html")))?;
    }
    Ok(())
}
