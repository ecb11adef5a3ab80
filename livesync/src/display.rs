//! Terminal rendering for the CLI

use std::io::Write;

use colored::{Color, Colorize};

use crate::logview::format::{FormattedLog, Severity};
use crate::logview::search::SearchMatch;
use crate::reconcile::reconciler::DeploymentState;

/// Terminal color for a severity
pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Neutral => Color::White,
        Severity::Info => Color::Cyan,
        Severity::Success => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    }
}

/// One terminal line for a formatted log entry
pub fn render_log(record: &FormattedLog) -> String {
    let color = severity_color(record.severity);
    let mut line = format!(
        "{} {} {}",
        record.timestamp.dimmed(),
        record.icon.glyph().color(color).bold(),
        record.collapsed_preview.color(color),
    );
    if let Some(progress) = &record.progress {
        line.push_str(&format!(" [{} {}]", progress.status, progress.progress).blue().to_string());
    }
    if record.is_verbose {
        line.push_str(&" (collapsed)".dimmed().to_string());
    }
    line
}

/// Write the log view, one entry per line
pub fn print_logs<W: Write>(out: &mut W, records: &[FormattedLog]) -> std::io::Result<()> {
    for record in records {
        writeln!(out, "{}", render_log(record))?;
    }
    Ok(())
}

/// Write search results as `row:col` followed by the matching row text
pub fn print_matches<W: Write>(
    out: &mut W,
    status: &str,
    matches: &[SearchMatch],
    rows: &[String],
) -> std::io::Result<()> {
    writeln!(out, "{} {}", "Matches:".yellow().bold(), status)?;
    for m in matches {
        let text = rows.get(m.row).map(String::as_str).unwrap_or("");
        let before = text.get(..m.start_column).unwrap_or("");
        let hit = text.get(m.start_column..m.end_column).unwrap_or("");
        let after = text.get(m.end_column..).unwrap_or("");
        writeln!(
            out,
            "{:>5}:{:<4} {}{}{}",
            m.row,
            m.start_column,
            before,
            hit.black().on_yellow(),
            after
        )?;
    }
    Ok(())
}

/// Write the deployment list, newest first
pub fn print_deployments<W: Write>(out: &mut W, state: &DeploymentState) -> std::io::Result<()> {
    for entry in state.entries() {
        let status = match entry.live_status {
            Some(status) if status.status.is_in_progress() => status.status.to_string().yellow(),
            Some(status) => status.status.to_string().normal(),
            None => "unknown".dimmed(),
        };
        writeln!(
            out,
            "{} {} {}",
            entry.deployment.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            entry.deployment.id.bold(),
            status
        )?;
    }
    Ok(())
}
