//! Text report builder for CLI output.

use crate::model::{ChangeType, OutcomeStatus, SessionReport};

/// Pre-formatted lines for text output.
pub(crate) struct TextReport {
    pub lines: Vec<String>,
}

/// Build a human-readable report from the final session state.
pub(crate) fn build_text_report(report: &SessionReport) -> TextReport {
    let mut lines = Vec::new();

    let status = match report.outcome.status {
        OutcomeStatus::Idle => "idle",
        OutcomeStatus::Success => "success",
        OutcomeStatus::Error => "error",
    };
    match report.outcome.latency_ms {
        Some(ms) => lines.push(format!("Status: {} ({} ms)", status, ms)),
        None => lines.push(format!("Status: {}", status)),
    }

    if !report.outcome.output.is_empty() {
        lines.push("Output:".to_string());
        for l in report.outcome.output.lines() {
            lines.push(format!("  {}", l));
        }
    }

    if report.patches.is_empty() {
        lines.push("No patches generated.".to_string());
    } else {
        lines.push(format!("Patches ({}):", report.patches.len()));
        for p in &report.patches {
            let kind = match p.change_type {
                ChangeType::Added => "ADDED",
                ChangeType::Removed => "REMOVED",
            };
            let line_old = p
                .line_old
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string());
            let line_new = p
                .line_new
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "  [{}] {} old:{} new:{}",
                p.iteration, kind, line_old, line_new
            ));
            if !p.old_text.is_empty() {
                lines.push(format!("    - {}", p.old_text));
            }
            if !p.new_text.is_empty() {
                lines.push(format!("    + {}", p.new_text));
            }
            if !p.reason.is_empty() {
                lines.push(format!("    {}", p.reason));
            }
        }
    }

    TextReport { lines }
}
