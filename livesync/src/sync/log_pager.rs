//! Paged log loading for one resource at a time
//!
//! Fetches are split into `begin_*` and [`LogPager::complete`] so the caller
//! can drop any lock while the request is in flight. Every fetch carries a
//! [`FetchTicket`]; a response whose ticket no longer names the active
//! resource (or was issued before the last resource switch) is discarded.

use async_trait::async_trait;
use openapi_client::models::LogsQuery;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::SyncError;
use crate::http::logs::{FetchedLogs, LogScope};
use crate::logview::aggregator::ScrollIntent;
use crate::logview::view::LogView;

/// Default number of entries requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Where log pages come from
#[async_trait]
pub trait LogFetcher: Send + Sync {
    async fn fetch_logs(&self, scope: LogScope, query: &LogsQuery) -> Result<FetchedLogs, SyncError>;
}

/// The resource whose logs are on display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogResource {
    pub scope: LogScope,
    pub id: String,
}

/// Identifies one in-flight fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub resource_id: String,
    pub epoch: u64,
    pub page: u32,
}

/// What happened to a completed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "scroll", rename_all = "lowercase")]
pub enum FetchOutcome {
    /// Entries were merged into the view
    Applied(ScrollIntent),
    /// The response belonged to a resource that is no longer active
    Stale,
    /// The request failed; the buffer is untouched
    Failed,
    /// The page carried no entries
    Empty,
}

/// Paging state plus the view for the active resource
#[derive(Debug)]
pub struct LogPager {
    resource: Option<LogResource>,
    epoch: u64,
    page_size: u32,
    search_term: Option<String>,
    view: LogView,
    current_page: u32,
    total_pages: u32,
    last_error: Option<String>,
}

impl Default for LogPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl LogPager {
    pub fn new(page_size: u32) -> Self {
        Self {
            resource: None,
            epoch: 0,
            page_size: page_size.max(1),
            search_term: None,
            view: LogView::default(),
            current_page: 0,
            total_pages: 0,
            last_error: None,
        }
    }

    pub fn resource(&self) -> Option<&LogResource> {
        self.resource.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn view(&self) -> &LogView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut LogView {
        &mut self.view
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether an older page can still be requested
    pub fn has_older(&self) -> bool {
        self.current_page > 0 && self.current_page < self.total_pages
    }

    /// Server-side filter sent with the next fetches. Takes effect on the
    /// next refresh.
    pub fn set_search_term(&mut self, term: Option<String>) {
        self.search_term = term.filter(|t| !t.is_empty());
    }

    /// Switch to another resource. The view is cleared and every fetch
    /// issued before the switch becomes stale.
    pub fn select_resource(&mut self, scope: LogScope, id: &str) {
        let next = LogResource {
            scope,
            id: id.to_string(),
        };
        if self.resource.as_ref() == Some(&next) {
            return;
        }
        debug!("Switching log view to {:?} {}", scope, id);
        self.resource = Some(next);
        self.epoch += 1;
        self.view.reset();
        self.current_page = 0;
        self.total_pages = 0;
        self.last_error = None;
    }

    /// Start a fetch of the newest page
    pub fn begin_refresh(&self) -> Option<(FetchTicket, LogsQuery)> {
        self.begin(1)
    }

    /// Start a fetch of the next older page. `None` when nothing is loaded
    /// yet or every page has been loaded.
    pub fn begin_load_older(&self) -> Option<(FetchTicket, LogsQuery)> {
        if !self.has_older() {
            return None;
        }
        self.begin(self.current_page + 1)
    }

    fn begin(&self, page: u32) -> Option<(FetchTicket, LogsQuery)> {
        let resource = self.resource.as_ref()?;
        let ticket = FetchTicket {
            resource_id: resource.id.clone(),
            epoch: self.epoch,
            page,
        };
        let query = LogsQuery {
            id: resource.id.clone(),
            page,
            page_size: self.page_size,
            search_term: self.search_term.clone(),
        };
        Some((ticket, query))
    }

    /// Finish a fetch started with `begin_*`
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<FetchedLogs, SyncError>,
    ) -> FetchOutcome {
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale log page {} for {}",
                ticket.page, ticket.resource_id
            );
            return FetchOutcome::Stale;
        }

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Failed to fetch log page {}: {}", ticket.page, e);
                self.last_error = Some(e.to_string());
                return FetchOutcome::Failed;
            }
        };

        self.last_error = None;
        self.total_pages = fetched.total_pages;

        if fetched.page.entries.is_empty() {
            if ticket.page <= 1 {
                self.current_page = 1;
            }
            return FetchOutcome::Empty;
        }

        let intent = self.view.merge_page(&fetched.page);
        if ticket.page <= 1 {
            self.current_page = 1;
        } else {
            self.current_page = self.current_page.max(ticket.page);
        }
        FetchOutcome::Applied(intent)
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        match &self.resource {
            Some(resource) => resource.id == ticket.resource_id && self.epoch == ticket.epoch,
            None => false,
        }
    }

    /// Fetch and merge the newest page
    pub async fn refresh<F: LogFetcher + ?Sized>(&mut self, fetcher: &F) -> Option<FetchOutcome> {
        let (ticket, query) = self.begin_refresh()?;
        let scope = self.resource.as_ref()?.scope;
        let result = fetcher.fetch_logs(scope, &query).await;
        Some(self.complete(&ticket, result))
    }

    /// Fetch and merge the next older page
    pub async fn load_older<F: LogFetcher + ?Sized>(&mut self, fetcher: &F) -> Option<FetchOutcome> {
        let (ticket, query) = self.begin_load_older()?;
        let scope = self.resource.as_ref()?.scope;
        let result = fetcher.fetch_logs(scope, &query).await;
        Some(self.complete(&ticket, result))
    }
}
