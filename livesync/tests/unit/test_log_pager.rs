//! Log pager tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use livesync::errors::SyncError;
use livesync::http::logs::{FetchedLogs, LogScope};
use livesync::logview::aggregator::ScrollIntent;
use livesync::models::log_entry::{LogEntry, LogPage};
use livesync::sync::log_pager::{FetchOutcome, LogFetcher, LogPager};
use openapi_client::models::LogsQuery;
use serde_json::json;

fn entry(id: &str, secs: u32) -> LogEntry {
    serde_json::from_value(json!({
        "id": id,
        "created_at": format!("2025-01-01T00:00:{:02}Z", secs),
        "payload": format!("line {}", id)
    }))
    .unwrap()
}

fn page(number: u32, entries: Vec<LogEntry>, total_pages: u32) -> FetchedLogs {
    FetchedLogs {
        total_count: entries.len() as u64,
        page: LogPage::new(number, entries),
        total_pages,
    }
}

/// Serves canned pages keyed by (resource id, page) and records queries
#[derive(Default)]
struct CannedFetcher {
    pages: HashMap<(String, u32), FetchedLogs>,
    queries: Mutex<Vec<(LogScope, String, u32)>>,
}

impl CannedFetcher {
    fn with_page(mut self, id: &str, fetched: FetchedLogs) -> Self {
        self.pages.insert((id.to_string(), fetched.page.page_number), fetched);
        self
    }
}

#[async_trait]
impl LogFetcher for CannedFetcher {
    async fn fetch_logs(&self, scope: LogScope, query: &LogsQuery) -> Result<FetchedLogs, SyncError> {
        self.queries
            .lock()
            .unwrap()
            .push((scope, query.id.clone(), query.page));
        self.pages
            .get(&(query.id.clone(), query.page))
            .cloned()
            .ok_or_else(|| SyncError::Internal(format!("{} page {}", query.id, query.page)))
    }
}

#[test]
fn test_stale_response_after_resource_switch() {
    let mut pager = LogPager::new(10);
    pager.select_resource(LogScope::Deployment, "d1");
    let (ticket, _) = pager.begin_refresh().unwrap();

    // user switches to another deployment while d1's request is in flight
    pager.select_resource(LogScope::Deployment, "d2");

    let outcome = pager.complete(&ticket, Ok(page(1, vec![entry("from-d1", 1)], 1)));
    assert_eq!(outcome, FetchOutcome::Stale);
    assert!(pager.view().buffer().is_empty());
}

#[test]
fn test_stale_response_after_reselecting_same_id() {
    let mut pager = LogPager::new(10);
    pager.select_resource(LogScope::Deployment, "d1");
    let (ticket, _) = pager.begin_refresh().unwrap();

    pager.select_resource(LogScope::Deployment, "d2");
    pager.select_resource(LogScope::Deployment, "d1");

    let outcome = pager.complete(&ticket, Ok(page(1, vec![entry("a", 1)], 1)));
    assert_eq!(outcome, FetchOutcome::Stale);
}

#[test]
fn test_reselecting_active_resource_keeps_view() {
    let mut pager = LogPager::new(10);
    pager.select_resource(LogScope::Application, "app");
    let (ticket, _) = pager.begin_refresh().unwrap();
    pager.complete(&ticket, Ok(page(1, vec![entry("a", 1)], 1)));

    let epoch = pager.epoch();
    pager.select_resource(LogScope::Application, "app");
    assert_eq!(pager.epoch(), epoch);
    assert_eq!(pager.view().buffer().len(), 1);
}

#[tokio::test]
async fn test_refresh_and_load_older_with_fetcher() {
    let fetcher = CannedFetcher::default()
        .with_page("app", page(1, vec![entry("c", 3), entry("d", 4)], 2))
        .with_page("app", page(2, vec![entry("a", 1), entry("b", 2), entry("c", 3)], 2));

    let mut pager = LogPager::new(2);
    pager.select_resource(LogScope::Application, "app");

    let outcome = pager.refresh(&fetcher).await;
    assert_eq!(outcome, Some(FetchOutcome::Applied(ScrollIntent::StickToNewest)));
    assert!(pager.has_older());

    let outcome = pager.load_older(&fetcher).await;
    assert_eq!(outcome, Some(FetchOutcome::Applied(ScrollIntent::PreserveAnchor)));
    assert!(!pager.has_older());
    assert_eq!(pager.load_older(&fetcher).await, None);

    let ids: Vec<String> = pager
        .view_mut()
        .formatted()
        .iter()
        .map(|r| r.entry_id.clone())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);

    let queries = fetcher.queries.lock().unwrap().clone();
    assert_eq!(
        queries,
        vec![
            (LogScope::Application, "app".to_string(), 1),
            (LogScope::Application, "app".to_string(), 2),
        ]
    );
}

#[test]
fn test_failed_fetch_records_error() {
    let fetcher = CannedFetcher::default();
    let mut pager = LogPager::default();
    pager.select_resource(LogScope::Deployment, "missing");

    let outcome = tokio_test::block_on(pager.refresh(&fetcher));
    assert_eq!(outcome, Some(FetchOutcome::Failed));
    assert!(pager.last_error().unwrap().contains("missing"));
    assert!(pager.view().buffer().is_empty());
}

#[test]
fn test_search_term_is_sent() {
    let mut pager = LogPager::new(25);
    pager.select_resource(LogScope::Application, "app");
    pager.set_search_term(Some("error".to_string()));

    let (_, query) = pager.begin_refresh().unwrap();
    assert_eq!(query.search_term.as_deref(), Some("error"));
    assert_eq!(query.page_size, 25);

    pager.set_search_term(Some(String::new()));
    let (_, query) = pager.begin_refresh().unwrap();
    assert!(query.search_term.is_none());
}
