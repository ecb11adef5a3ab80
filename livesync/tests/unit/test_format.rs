//! Log formatting tests

use livesync::logview::format::{classify_event, format, Icon, Severity};
use livesync::logview::progress::extract_progress;
use livesync::logview::verbosity::{classify, preview, PREVIEW_LENGTH};
use livesync::models::log_entry::LogEntry;
use serde_json::{json, Value};

fn entry(message: Option<&str>, level: Option<&str>, payload: Value) -> LogEntry {
    serde_json::from_value(json!({
        "id": "l1",
        "created_at": "2025-01-01T12:30:45Z",
        "message": message,
        "level": level,
        "payload": payload
    }))
    .unwrap()
}

#[test]
fn test_event_tokens() {
    assert_eq!(classify_event(Some("execution_started"), None), (Severity::Info, Icon::Play));
    assert_eq!(classify_event(Some("execution_completed"), None), (Severity::Success, Icon::Flag));
    assert_eq!(classify_event(Some("step_started"), None), (Severity::Info, Icon::ArrowRight));
    assert_eq!(classify_event(Some("step_completed"), None), (Severity::Success, Icon::Check));
    assert_eq!(classify_event(Some("step_failed"), None), (Severity::Error, Icon::Cross));
    assert_eq!(classify_event(Some("something else"), None), (Severity::Neutral, Icon::Dot));
    assert_eq!(classify_event(None, None), (Severity::Neutral, Icon::Dot));
}

#[test]
fn test_levels() {
    assert_eq!(
        classify_event(Some("step_completed"), Some("error")),
        (Severity::Error, Icon::Alert)
    );
    assert_eq!(classify_event(None, Some("warn")), (Severity::Warning, Icon::Alert));
    assert_eq!(classify_event(None, Some("Warning")), (Severity::Warning, Icon::Alert));
    assert_eq!(classify_event(None, Some("info")), (Severity::Neutral, Icon::Dot));
}

#[test]
fn test_progress_last_line_wins() {
    let payload = [
        r#"{"status": "Downloading", "progress": "10%"}"#,
        "plain text line",
        r#"{"status": "Extracting", "progress": "40%"}"#,
        r#"{"status": "Pulling fs layer"}"#,
        "{not json",
    ]
    .join("\n");

    let progress = extract_progress(&payload).unwrap();
    assert_eq!(progress.status, "Extracting");
    assert_eq!(progress.progress, "40%");
}

#[test]
fn test_progress_requires_keyword() {
    assert!(extract_progress(r#"{"status": "Waiting", "progress": "1/2"}"#).is_none());
    assert!(extract_progress("").is_none());
}

#[test]
fn test_verbosity_boundary() {
    assert!(!classify(&"a".repeat(5000)).is_verbose());
    assert!(classify(&"a".repeat(5001)).is_verbose());
    assert!(classify(r#"{"status": "pull complete", "progress": "100%"}"#).is_verbose());
}

#[test]
fn test_preview_boundary() {
    let exact = "b".repeat(PREVIEW_LENGTH);
    assert_eq!(preview(&exact), exact);

    let long = "é".repeat(PREVIEW_LENGTH + 1);
    let cut = preview(&long);
    assert!(cut.ends_with("..."));
    assert_eq!(cut.chars().count(), PREVIEW_LENGTH + 3);
}

#[test]
fn test_format_entry() {
    let record = format(&entry(Some("step_started"), Some("info"), json!("building image")));

    assert_eq!(record.entry_id, "l1");
    assert_eq!(record.timestamp, "2025-01-01 12:30:45");
    assert_eq!(record.severity, Severity::Info);
    assert_eq!(record.icon_class, "icon-arrow-right");
    assert_eq!(record.collapsed_preview, "building image");
    assert!(!record.is_verbose);
    assert!(record.progress.is_none());
}

#[test]
fn test_format_structured_payload() {
    let record = format(&entry(None, None, json!({"status": "Downloading", "progress": "5%"})));

    assert!(record.is_verbose);
    assert_eq!(record.progress.unwrap().progress, "5%");
}
