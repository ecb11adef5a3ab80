//! Log search tests

use livesync::logview::search::{index, navigate, Direction, SearchState};
use livesync::logview::view::LogView;
use livesync::models::log_entry::{LogEntry, LogPage};
use livesync::logview::aggregator::ScrollIntent;
use serde_json::json;

fn entry(id: &str, created_at: &str, payload: &str) -> LogEntry {
    serde_json::from_value(json!({
        "id": id,
        "created_at": created_at,
        "payload": payload
    }))
    .unwrap()
}

#[test]
fn test_index_reports_byte_columns() {
    let lines = ["Pulling IMAGE", "no hit", "image image"];
    let matches = index(&lines, "image");

    let found: Vec<(usize, usize, usize)> = matches
        .iter()
        .map(|m| (m.row, m.start_column, m.end_column))
        .collect();
    assert_eq!(found, vec![(0, 8, 13), (2, 0, 5), (2, 6, 11)]);
}

#[test]
fn test_index_treats_query_literally() {
    let lines = ["a.b", "axb"];
    assert_eq!(index(&lines, "a.b").len(), 1);
    assert!(index(&lines, "").is_empty());
}

#[test]
fn test_navigation_is_cyclic() {
    assert_eq!(navigate(3, 2, Direction::Next), 0);
    assert_eq!(navigate(3, 0, Direction::Prev), 2);
    assert_eq!(navigate(0, 0, Direction::Next), 0);

    let lines = ["x", "x", "x"];
    let mut state = SearchState::new();
    state.set_query("x");
    state.refresh(1, &lines);
    assert_eq!(state.status(), "1 of 3");

    for _ in 0..3 {
        state.next_match();
    }
    assert_eq!(state.current_index(), 0);

    state.prev_match();
    assert_eq!(state.status(), "3 of 3");
}

#[test]
fn test_status_without_matches() {
    let mut state = SearchState::new();
    state.set_query("missing");
    state.refresh(1, &["nothing here"]);
    assert_eq!(state.status(), "0 of 0");
    assert!(state.next_match().is_none());
}

#[test]
fn test_refresh_is_memoized() {
    let lines = ["abc"];
    let mut state = SearchState::new();
    state.set_query("b");
    assert!(state.refresh(1, &lines));
    assert!(!state.refresh(1, &lines));
    assert!(state.refresh(2, &lines));
}

#[test]
fn test_view_search_follows_new_pages() {
    let mut view = LogView::new(true);
    view.merge_page(&LogPage::new(1, vec![entry("a", "2025-01-01T00:00:02Z", "error one")]));
    assert_eq!(view.set_query("ERROR").len(), 1);

    view.merge_page(&LogPage::new(2, vec![entry("b", "2025-01-01T00:00:01Z", "error zero")]));
    assert_eq!(view.matches().len(), 2);
    assert_eq!(view.search_status(), "2 of 2");
    let current = view.search_summary().current.unwrap();
    assert_eq!(view.lines()[current.row].text, "error one");

    let wrapped = view.next_match().unwrap();
    assert_eq!(wrapped.row, 0);
}

#[test]
fn test_older_page_keeps_cursor_on_same_match() {
    let mut view = LogView::new(true);
    view.merge_page(&LogPage::new(
        1,
        vec![
            entry("c", "2025-01-01T00:00:30Z", "hit c"),
            entry("d", "2025-01-01T00:00:40Z", "hit d"),
        ],
    ));
    view.set_query("hit");
    view.next_match();
    assert_eq!(view.search_status(), "2 of 2");

    let intent = view.merge_page(&LogPage::new(
        2,
        vec![
            entry("a", "2025-01-01T00:00:10Z", "hit a"),
            entry("b", "2025-01-01T00:00:20Z", "hit b"),
        ],
    ));
    assert_eq!(intent, ScrollIntent::PreserveAnchor);

    // rows are re-flattened before the cursor is read
    assert_eq!(view.lines().len(), 4);
    assert_eq!(view.search_status(), "4 of 4");
    let current = view.search_summary().current.unwrap();
    assert_eq!(view.lines()[current.row].text, "hit d");
}

#[test]
fn test_cursor_anchor_inside_multiline_entry() {
    let mut view = LogView::new(true);
    view.merge_page(&LogPage::new(
        1,
        vec![entry("m", "2025-01-01T00:00:30Z", "step hit\nsecond hit")],
    ));
    view.set_query("hit");
    view.next_match();

    view.merge_page(&LogPage::new(2, vec![entry("o", "2025-01-01T00:00:10Z", "old hit")]));
    let current = view.search_summary().current.unwrap();
    assert_eq!(view.search_status(), "3 of 3");
    assert_eq!(view.lines()[current.row].text, "second hit");
}

#[test]
fn test_fresh_page_resets_cursor() {
    let mut view = LogView::new(true);
    view.merge_page(&LogPage::new(
        1,
        vec![
            entry("c", "2025-01-01T00:00:30Z", "hit c"),
            entry("d", "2025-01-01T00:00:40Z", "hit d"),
        ],
    ));
    view.set_query("hit");
    view.next_match();

    view.merge_page(&LogPage::new(1, vec![entry("e", "2025-01-01T00:00:50Z", "hit e")]));
    assert_eq!(view.search_status(), "1 of 1");
}

#[test]
fn test_clear_query_scrolls_to_newest() {
    let mut view = LogView::new(true);
    view.set_query("x");
    assert_eq!(view.clear_query(), ScrollIntent::StickToNewest);
    assert_eq!(view.query(), "");

    let mut view = LogView::new(false);
    view.set_query("x");
    assert_eq!(view.clear_query(), ScrollIntent::Unchanged);
}
