//! The `adaptest report` command.

use std::path::PathBuf;

use anyhow::{bail, Result};

use adaptest_core::report::ExamReport;

pub fn execute(input: PathBuf, format: String, output: Option<PathBuf>) -> Result<()> {
    let report = ExamReport::load_json(&input)?;

    let rendered = match format.as_str() {
        "markdown" | "md" => adaptest_report::to_markdown(&report),
        "html" => adaptest_report::generate_html(&report),
        other => bail!("unknown report format: {other}"),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, rendered)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
