//! Output formatting for CLI commands

use serde::Serialize;

use crate::share::{DispatchOutcome, SendResult};

/// Format output as pretty JSON
pub fn format_output<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

fn result_marker(result: &SendResult) -> &'static str {
    match result {
        SendResult::Sent => "✓",
        SendResult::Skipped(_) => "-",
        SendResult::Failed(_) => "✗",
    }
}

/// Human readable dispatch outcome
pub fn format_outcome(content_id: &str, outcome: &DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::NotShared { reason } => {
            format!("Content {} not shared: {}", content_id, reason)
        }
        DispatchOutcome::Dispatched(report) if report.is_empty() => {
            format!("Content {} shared to no destinations (none enabled)", content_id)
        }
        DispatchOutcome::Dispatched(report) => {
            let mut lines = vec![format!(
                "Content {} dispatched ({}/{} sent)",
                content_id,
                report.sent_count(),
                report.len()
            )];
            for (id, result) in &report.results {
                lines.push(format!("  {} {}: {}", result_marker(result), id, result));
            }
            lines.join("\n")
        }
    }
}
