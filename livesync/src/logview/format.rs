//! Per-entry presentation records

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::logview::progress::{extract_progress, ProgressInfo};
use crate::logview::verbosity::classify_scanned;
use crate::models::log_entry::LogEntry;

/// Timestamp layout used in presentation records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Neutral,
    Info,
    Success,
    Warning,
    Error,
}

/// Icon shown next to a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Play,
    Flag,
    ArrowRight,
    Check,
    Cross,
    Alert,
    Dot,
}

impl Icon {
    /// Stable class name for front ends
    pub fn class(&self) -> &'static str {
        match self {
            Icon::Play => "icon-play",
            Icon::Flag => "icon-flag",
            Icon::ArrowRight => "icon-arrow-right",
            Icon::Check => "icon-check",
            Icon::Cross => "icon-cross",
            Icon::Alert => "icon-alert",
            Icon::Dot => "icon-dot",
        }
    }

    /// Single-character glyph for terminals
    pub fn glyph(&self) -> &'static str {
        match self {
            Icon::Play => ">",
            Icon::Flag => "#",
            Icon::ArrowRight => "-",
            Icon::Check => "+",
            Icon::Cross => "x",
            Icon::Alert => "!",
            Icon::Dot => ".",
        }
    }
}

/// Presentation record for one log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedLog {
    pub entry_id: String,
    pub created_at: DateTime<Utc>,
    pub timestamp: String,
    pub severity: Severity,
    pub icon: Icon,
    pub icon_class: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub collapsed_preview: String,
    pub is_verbose: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressInfo>,
}

/// Severity and icon for a message token and declared level.
///
/// A declared `error` level wins over any token.
pub fn classify_event(message: Option<&str>, level: Option<&str>) -> (Severity, Icon) {
    let level = level.map(|l| l.trim().to_ascii_lowercase());
    if level.as_deref() == Some("error") {
        return (Severity::Error, Icon::Alert);
    }

    let token = message.map(|m| m.trim().to_ascii_lowercase());
    match token.as_deref() {
        Some("execution_started") => (Severity::Info, Icon::Play),
        Some("execution_completed") => (Severity::Success, Icon::Flag),
        Some("step_started") => (Severity::Info, Icon::ArrowRight),
        Some("step_completed") => (Severity::Success, Icon::Check),
        Some("step_failed") => (Severity::Error, Icon::Cross),
        _ => match level.as_deref() {
            Some("warn") | Some("warning") => (Severity::Warning, Icon::Alert),
            _ => (Severity::Neutral, Icon::Dot),
        },
    }
}

/// Build the presentation record for `entry`
pub fn format(entry: &LogEntry) -> FormattedLog {
    let payload = entry.payload_text();
    let (severity, icon) = classify_event(entry.message.as_deref(), entry.level.as_deref());
    let progress = extract_progress(&payload);
    let verbosity = classify_scanned(&payload, progress.is_some());

    FormattedLog {
        entry_id: entry.id.clone(),
        created_at: entry.created_at,
        timestamp: entry.created_at.format(TIMESTAMP_FORMAT).to_string(),
        severity,
        icon,
        icon_class: icon.class(),
        message: entry.message.clone(),
        collapsed_preview: verbosity.preview.clone(),
        is_verbose: verbosity.is_verbose(),
        progress,
    }
}
