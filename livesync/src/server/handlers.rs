//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::logs::LogScope;
use crate::logview::aggregator::ScrollIntent;
use crate::logview::format::FormattedLog;
use crate::logview::view::SearchSummary;
use crate::reconcile::reconciler::DeploymentWithStatus;
use crate::server::state::ServerState;
use crate::sync::log_pager::{FetchOutcome, LogResource};
use crate::transport::ConnectionState;
use crate::utils::version_info;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "livesync".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    Json(version_info())
}

#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub state: ConnectionState,
}

/// Transport connectivity
pub async fn connection_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let current = *state.connection.borrow();
    Json(ConnectionResponse { state: current })
}

#[derive(Debug, Serialize)]
pub struct DeploymentsResponse<'a> {
    pub application_id: &'a str,
    pub total: usize,
    pub deployments: Vec<DeploymentWithStatus<'a>>,
}

/// Current deployments, newest first, each joined with its live status
pub async fn deployments_handler(State(state): State<Arc<ServerState>>) -> Response {
    let snapshot = state.deployments.borrow().clone();
    let body = DeploymentsResponse {
        application_id: &state.application_id,
        total: snapshot.len(),
        deployments: snapshot.entries(),
    };
    Json(body).into_response()
}

#[derive(Debug, Deserialize)]
pub struct LogsParams {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub resource: Option<LogResource>,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_older: bool,
    pub auto_scroll: bool,
    pub scroll: ScrollIntent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub search: SearchSummary,
    pub entries: Vec<FormattedLog>,
}

/// Formatted log view. `query` sets the search; an empty value clears it
/// and `scroll` tells the client where the viewport goes.
pub async fn logs_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<LogsParams>,
) -> impl IntoResponse {
    let mut pager = state.log_pager.lock().await;

    let mut scroll = ScrollIntent::Unchanged;
    if let Some(query) = params.query {
        if query != pager.view().query() {
            if query.is_empty() {
                scroll = pager.view_mut().clear_query();
            } else {
                pager.view_mut().set_query(&query);
            }
        }
    }

    let resource = pager.resource().cloned();
    let current_page = pager.current_page();
    let total_pages = pager.total_pages();
    let has_older = pager.has_older();
    let last_error = pager.last_error().map(str::to_string);
    let view = pager.view_mut();

    let body = LogsResponse {
        resource,
        current_page,
        total_pages,
        has_older,
        auto_scroll: view.auto_scroll(),
        scroll,
        last_error,
        search: view.search_summary(),
        entries: view.formatted().to_vec(),
    };
    Json(body)
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub outcome: FetchOutcome,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_older: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Fetch the newest page for the selected resource
pub async fn refresh_logs_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, StatusCode> {
    fetch(&state, Page::Newest).await.map(Json)
}

/// Fetch the next older page
pub async fn load_older_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, StatusCode> {
    fetch(&state, Page::Older).await.map(Json)
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    #[serde(default)]
    pub scope: LogScope,
    pub id: String,
}

/// Switch the log view to another resource and load its newest page
pub async fn select_logs_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<SelectRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if request.id.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    state
        .log_pager
        .lock()
        .await
        .select_resource(request.scope, &request.id);

    fetch(&state, Page::Newest).await.map(Json)
}

enum Page {
    Newest,
    Older,
}

/// Run one fetch without holding the pager lock across the request. A
/// resource switch while the request is in flight makes the result stale.
async fn fetch(state: &ServerState, page: Page) -> Result<FetchResponse, StatusCode> {
    let begun = {
        let pager = state.log_pager.lock().await;
        let scope = pager.resource().map(|r| r.scope).ok_or(StatusCode::CONFLICT)?;
        let begun = match page {
            Page::Newest => pager.begin_refresh(),
            Page::Older => pager.begin_load_older(),
        };
        begun.map(|(ticket, query)| (scope, ticket, query))
    };

    let mut outcome = FetchOutcome::Empty;
    if let Some((scope, ticket, query)) = begun {
        let result = state.fetcher.fetch_logs(scope, &query).await;
        outcome = state.log_pager.lock().await.complete(&ticket, result);
    } else {
        debug!("No older log pages to load");
    }

    let pager = state.log_pager.lock().await;
    Ok(FetchResponse {
        outcome,
        current_page: pager.current_page(),
        total_pages: pager.total_pages(),
        has_older: pager.has_older(),
        last_error: pager.last_error().map(str::to_string),
    })
}
