//! Log page aggregation tests

use livesync::logview::aggregator::{display_order, flatten, merge, LogBuffer, ScrollIntent};
use livesync::models::log_entry::{LogEntry, LogPage};
use serde_json::json;

fn entry(id: &str, created_at: &str, payload: &str) -> LogEntry {
    serde_json::from_value(json!({
        "id": id,
        "created_at": created_at,
        "payload": payload
    }))
    .unwrap()
}

fn ids(entries: &[LogEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn test_first_page_replaces_buffer() {
    let existing = vec![entry("old", "2025-01-01T00:00:00Z", "x")];
    let page = LogPage::new(
        1,
        vec![
            entry("b", "2025-01-02T00:00:02Z", "b"),
            entry("a", "2025-01-02T00:00:01Z", "a"),
        ],
    );

    let merged = merge(&existing, &page);
    assert_eq!(ids(&merged.entries), vec!["b", "a"]);
    assert_eq!(merged.scroll, ScrollIntent::StickToNewest);
}

#[test]
fn test_older_page_dedups_and_prepends() {
    let existing = vec![
        entry("c", "2025-01-01T00:00:03Z", "c"),
        entry("d", "2025-01-01T00:00:04Z", "d"),
    ];
    let page = LogPage::new(
        2,
        vec![
            entry("a", "2025-01-01T00:00:01Z", "a"),
            entry("c", "2025-01-01T00:00:03Z", "c"),
            entry("b", "2025-01-01T00:00:02Z", "b"),
            entry("a", "2025-01-01T00:00:01Z", "a"),
        ],
    );

    let merged = merge(&existing, &page);
    assert_eq!(ids(&merged.entries), vec!["a", "b", "c", "d"]);
    assert_eq!(merged.added, 2);
    assert_eq!(merged.scroll, ScrollIntent::PreserveAnchor);
}

#[test]
fn test_older_page_with_nothing_new() {
    let existing = vec![entry("a", "2025-01-01T00:00:01Z", "a")];
    let merged = merge(&existing, &LogPage::new(3, existing.clone()));
    assert_eq!(merged.added, 0);
    assert_eq!(merged.scroll, ScrollIntent::Unchanged);
}

#[test]
fn test_empty_page_leaves_buffer() {
    let mut buffer = LogBuffer::new();
    buffer.merge(&LogPage::new(1, vec![entry("a", "2025-01-01T00:00:01Z", "a")]));
    let version = buffer.version();

    assert_eq!(buffer.merge(&LogPage::new(1, vec![])), ScrollIntent::Unchanged);
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.version(), version);
}

#[test]
fn test_display_order_by_time_then_id() {
    let entries = vec![
        entry("b", "2025-01-01T00:00:01Z", ""),
        entry("c", "2025-01-01T00:00:00Z", ""),
        entry("a", "2025-01-01T00:00:01Z", ""),
    ];
    let ordered: Vec<&str> = display_order(&entries).iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ordered, vec!["c", "a", "b"]);
}

#[test]
fn test_flatten_multiline_payloads() {
    let entries = vec![
        entry("a", "2025-01-01T00:00:01Z", "first\nsecond"),
        entry("b", "2025-01-01T00:00:02Z", ""),
    ];
    let lines = flatten(&entries);

    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", ""]);
    assert_eq!(lines[1].entry_id, "a");
    assert_eq!(lines[2].entry_id, "b");
}
