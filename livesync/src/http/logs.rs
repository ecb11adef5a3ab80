//! Log API client

use async_trait::async_trait;
use openapi_client::models::{LogsPageResponse, LogsQuery};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::SyncError;
use crate::http::client::HttpClient;
use crate::models::log_entry::{LogEntry, LogPage};
use crate::sync::log_pager::LogFetcher;

/// Which resource a log stream belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogScope {
    #[default]
    Application,
    Deployment,
}

impl LogScope {
    /// Path of the paginated log endpoint for `id`
    pub fn path(&self, id: &str) -> String {
        match self {
            LogScope::Application => format!("/applications/{}/logs", id),
            LogScope::Deployment => format!("/deployments/{}/logs", id),
        }
    }
}

impl std::str::FromStr for LogScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "application" | "app" => Ok(LogScope::Application),
            "deployment" => Ok(LogScope::Deployment),
            _ => Err(format!("Invalid log scope: {}", s)),
        }
    }
}

/// A decoded page plus the paging totals reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedLogs {
    pub page: LogPage,
    pub total_count: u64,
    pub total_pages: u32,
}

impl HttpClient {
    /// Fetch one page of logs
    pub async fn get_logs(&self, scope: LogScope, query: &LogsQuery) -> Result<FetchedLogs, SyncError> {
        let path = scope.path(&query.id);
        let response: LogsPageResponse = self.get(&path, query).await?;
        Ok(decode_logs(query.page, response))
    }
}

/// Decode a page response. The page number requested wins over an absent
/// or zero `current_page` in the response.
pub fn decode_logs(requested_page: u32, response: LogsPageResponse) -> FetchedLogs {
    let total = response.logs.len();
    let entries: Vec<LogEntry> = response
        .logs
        .into_iter()
        .filter_map(|raw| match serde_json::from_value(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping undecodable log entry: {}", e);
                None
            }
        })
        .collect();
    debug!("Decoded {}/{} log entries", entries.len(), total);

    let page_number = if response.current_page == 0 {
        requested_page
    } else {
        response.current_page
    };

    FetchedLogs {
        page: LogPage::new(page_number, entries),
        total_count: response.total_count,
        total_pages: response.total_pages,
    }
}

#[async_trait]
impl LogFetcher for HttpClient {
    async fn fetch_logs(&self, scope: LogScope, query: &LogsQuery) -> Result<FetchedLogs, SyncError> {
        self.get_logs(scope, query).await
    }
}
