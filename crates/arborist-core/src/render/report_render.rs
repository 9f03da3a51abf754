use serde::Serialize;

use crate::errors::Result;
use crate::model::{ReportCounts, RunReport, TargetOutcome};

/// Render a report as a fixed-width text table
pub fn render_table(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Run {} ({}) on '{}' - stage {}\n\n",
        report.run_id, report.mode, report.root_collection, report.stage
    ));

    let width = report
        .outcomes
        .iter()
        .map(|o| o.reference.to_string().len())
        .max()
        .unwrap_or(0)
        .max("ENTITY".len());

    output.push_str(&format!(
        "{:<width$}  {:<7}  {:>11}  {:<13}  {:<12}  {}\n",
        "ENTITY",
        "VERDICT",
        "DESCENDANTS",
        "DELETION",
        "VERIFICATION",
        "REASON",
        width = width
    ));

    for outcome in &report.outcomes {
        output.push_str(&format!(
            "{:<width$}  {:<7}  {:>11}  {:<13}  {:<12}  {}\n",
            outcome.reference.to_string(),
            outcome.disposition.verdict.to_string(),
            outcome.descendant_count,
            outcome.deletion.to_string(),
            outcome.verification.to_string(),
            outcome.disposition.reason,
            width = width
        ));
        for err in &outcome.errors {
            output.push_str(&format!("{:<width$}    ! {}\n", "", err.message, width = width));
        }
    }

    output.push('\n');
    output.push_str(&summary_line(&report.counts()));
    output.push_str(&format!(
        "Result: {}\n",
        if report.is_success() { "OK" } else { "INCOMPLETE" }
    ));
    output
}

/// Render a report to Markdown
pub fn render_markdown(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Run {}\n\n", report.run_id));
    output.push_str(&format!("- **Mode**: {}\n", report.mode));
    output.push_str(&format!("- **Root collection**: {}\n", report.root_collection));
    output.push_str(&format!("- **Stage**: {}\n", report.stage));
    output.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    if let Some(finished) = report.finished_at {
        output.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    output.push_str(&format!(
        "- **Success**: {}\n\n",
        if report.is_success() { "yes" } else { "no" }
    ));

    output.push_str("| Entity | Verdict | Rule | Descendants | Deletion | Verification |\n");
    output.push_str("|---|---|---|---:|---|---|\n");
    for outcome in &report.outcomes {
        output.push_str(&format!(
            "| `{}` | {} | {} | {} | {} | {} |\n",
            outcome.reference,
            outcome.disposition.verdict,
            outcome.disposition.matched_rule.as_deref().unwrap_or("-"),
            outcome.descendant_count,
            outcome.deletion,
            outcome.verification,
        ));
    }

    let with_errors: Vec<&TargetOutcome> =
        report.outcomes.iter().filter(|o| !o.errors.is_empty()).collect();
    if !with_errors.is_empty() {
        output.push_str("\n## Errors\n\n");
        for outcome in with_errors {
            for err in &outcome.errors {
                output.push_str(&format!(
                    "- `{}` **{}**: {}\n",
                    outcome.reference, err.code, err.message
                ));
            }
        }
    }

    output.push_str(&format!("\n{}", summary_line(&report.counts())));
    output
}

#[derive(Serialize)]
struct JsonReport<'a> {
    success: bool,
    counts: ReportCounts,
    report: &'a RunReport,
}

/// Render a report as pretty JSON with counts and the success flag
///
/// # Errors
///
/// Returns `Serialization` if the report cannot be encoded.
pub fn render_json(report: &RunReport) -> Result<String> {
    let doc = JsonReport {
        success: report.is_success(),
        counts: report.counts(),
        report,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn summary_line(counts: &ReportCounts) -> String {
    format!(
        "Totals: {} entities, {} keep, {} delete, {} unknown | {} deleted, {} would delete, {} failed, {} blocked | {} gone, {} still exist, {} read failed\n",
        counts.total,
        counts.keep,
        counts.delete,
        counts.unknown,
        counts.deleted,
        counts.would_delete,
        counts.failed,
        counts.blocked,
        counts.gone,
        counts.still_exists,
        counts.read_failed,
    )
}
