//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined and an inline
//! SVG chart of the ability trajectory.

use std::path::Path;

use anyhow::{Context, Result};

use adaptest_core::estimator::{THETA_MAX, THETA_MIN};
use adaptest_core::report::ExamReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report page.
pub fn generate_html(report: &ExamReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>adaptest report — {}</title>\n",
        html_escape(&report.candidate_id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>adaptest report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Candidate: <strong>{}</strong> | Session: {} | Started: {}</p>\n",
        html_escape(&report.candidate_id),
        report.session_id,
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str(&format!(
        "<p class=\"outcome outcome-{}\">{}</p>\n",
        report.outcome, report.outcome
    ));
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Questions</th><th>Final ability</th><th>SE</th><th>Passing probability</th><th>Confidence</th><th>Readiness</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    html.push_str(&format!(
        "<tr><td>{}</td><td>{:.3}</td><td>{:.3}</td><td>{:.1}%</td><td>{}%</td><td>{}</td></tr>\n",
        report.total_questions,
        report.final_ability,
        report.standard_error,
        report.passing_probability * 100.0,
        report.confidence_percent,
        report.readiness,
    ));
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Trajectory chart
    if !report.responses.is_empty() {
        html.push_str("<section>\n<h2>Ability trajectory</h2>\n");
        html.push_str(&trajectory_svg(report));
        html.push_str("</section>\n");
    }

    // Category breakdown
    html.push_str("<section>\n<h2>Category breakdown</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str(
        "<thead><tr><th>Category</th><th>Administered</th><th>Correct</th><th>Quota</th></tr></thead>\n",
    );
    html.push_str("<tbody>\n");
    for row in &report.category_breakdown {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}-{}</td></tr>\n",
            row.category, row.administered, row.correct, row.min_count, row.max_count
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    html.push_str("</body>\n</html>\n");
    html
}

/// Render the per-response ability estimates as an inline SVG polyline.
fn trajectory_svg(report: &ExamReport) -> String {
    const WIDTH: f64 = 720.0;
    const HEIGHT: f64 = 220.0;
    const PAD: f64 = 20.0;

    let n = report.responses.len();
    let x_step = if n > 1 {
        (WIDTH - 2.0 * PAD) / (n - 1) as f64
    } else {
        0.0
    };
    let y_of = |theta: f64| {
        let clamped = theta.clamp(THETA_MIN, THETA_MAX);
        let fraction = (clamped - THETA_MIN) / (THETA_MAX - THETA_MIN);
        HEIGHT - PAD - fraction * (HEIGHT - 2.0 * PAD)
    };

    let points: Vec<String> = report
        .responses
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{:.1},{:.1}", PAD + x_step * i as f64, y_of(r.ability_after)))
        .collect();

    let mut svg = format!(
        "<svg viewBox=\"0 0 {WIDTH} {HEIGHT}\" class=\"trajectory\" role=\"img\" aria-label=\"Ability trajectory\">\n"
    );
    // Zero-ability reference line.
    svg.push_str(&format!(
        "<line x1=\"{PAD}\" y1=\"{0:.1}\" x2=\"{1:.1}\" y2=\"{0:.1}\" class=\"axis\"/>\n",
        y_of(0.0),
        WIDTH - PAD
    ));
    svg.push_str(&format!(
        "<polyline fill=\"none\" class=\"line\" points=\"{}\"/>\n",
        points.join(" ")
    ));
    for (i, (point, response)) in points.iter().zip(&report.responses).enumerate() {
        let class = if response.is_correct { "dot correct" } else { "dot incorrect" };
        let (x, y) = point.split_once(',').unwrap_or(("0", "0"));
        svg.push_str(&format!(
            "<circle cx=\"{x}\" cy=\"{y}\" r=\"3\" class=\"{class}\"><title>#{}: {:.3}</title></circle>\n",
            i + 1,
            response.ability_after
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

/// Write the HTML report to a file.
pub fn save_html(report: &ExamReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

const CSS: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 60rem; color: #222; }
header h1 { margin-bottom: 0.2rem; }
.meta { color: #666; }
.outcome { display: inline-block; padding: 0.3rem 0.9rem; border-radius: 4px; font-weight: 600; text-transform: uppercase; }
.outcome-passed { background: #e4f7e4; color: #14691b; }
.outcome-failed { background: #fde8e8; color: #8f1616; }
.outcome-inconclusive, .outcome-abandoned { background: #fdf3d7; color: #8a6d1a; }
table.summary { border-collapse: collapse; width: 100%; margin: 0.8rem 0; }
table.summary th, table.summary td { border: 1px solid #ddd; padding: 0.4rem 0.7rem; text-align: left; }
table.summary th { background: #f6f6f6; }
svg.trajectory { width: 100%; height: auto; background: #fafafa; border: 1px solid #eee; }
svg .axis { stroke: #bbb; stroke-dasharray: 4 3; }
svg .line { stroke: #3465a4; stroke-width: 1.5; }
svg .dot.correct { fill: #2e8b2e; }
svg .dot.incorrect { fill: #c03030; }
"#;
