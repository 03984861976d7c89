//! Markdown report generator.

use adaptest_core::report::ExamReport;

/// Render an exam report as markdown.
pub fn to_markdown(report: &ExamReport) -> String {
    let mut md = String::new();

    md.push_str("# Exam Report\n\n");
    md.push_str(&format!(
        "**Candidate:** {} | **Session:** {}\n\n",
        report.candidate_id, report.session_id
    ));
    md.push_str(&format!(
        "**Outcome:** {} | **Questions:** {} | **Readiness:** {}\n\n",
        report.outcome, report.total_questions, report.readiness
    ));
    md.push_str(&format!(
        "**Final ability:** {:.3} (SE {:.3}) | **Passing probability:** {:.1}% | **Confidence:** {}%\n\n",
        report.final_ability,
        report.standard_error,
        report.passing_probability * 100.0,
        report.confidence_percent
    ));
    if let Some(rule) = report.stop_rule {
        md.push_str(&format!("Stopped by the {rule} rule.\n\n"));
    }

    md.push_str("## Category breakdown\n\n");
    md.push_str("| Category | Administered | Correct | Quota |\n");
    md.push_str("|----------|--------------|---------|-------|\n");
    for row in &report.category_breakdown {
        md.push_str(&format!(
            "| {} | {} | {} | {}-{} |\n",
            row.category, row.administered, row.correct, row.min_count, row.max_count
        ));
    }
    md.push('\n');

    if !report.responses.is_empty() {
        md.push_str("## Ability trajectory\n\n");
        md.push_str("| # | Item | Correct | Difficulty | Ability after | Time (s) |\n");
        md.push_str("|---|------|---------|------------|---------------|----------|\n");
        for (i, response) in report.responses.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {:.2} | {:.3} | {} |\n",
                i + 1,
                response.question_id,
                if response.is_correct { "yes" } else { "no" },
                response.difficulty,
                response.ability_after,
                response.time_spent_seconds
            ));
        }
    }

    md
}
