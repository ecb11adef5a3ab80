//! Local status server tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use livesync::errors::SyncError;
use livesync::http::logs::{FetchedLogs, LogScope};
use livesync::models::deployment::Deployment;
use livesync::models::log_entry::{LogEntry, LogPage};
use livesync::reconcile::reconciler::DeploymentState;
use livesync::server::serve::router;
use livesync::server::state::ServerState;
use livesync::sync::log_pager::{LogFetcher, LogPager};
use livesync::transport::ConnectionState;
use openapi_client::models::LogsQuery;
use serde_json::{json, Value};
use tokio::sync::{watch, Mutex};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

/// Returns one page per resource whose entries mention the resource id
struct EchoFetcher;

#[async_trait]
impl LogFetcher for EchoFetcher {
    async fn fetch_logs(&self, _scope: LogScope, query: &LogsQuery) -> Result<FetchedLogs, SyncError> {
        let entry: LogEntry = serde_json::from_value(json!({
            "id": format!("{}-{}", query.id, query.page),
            "created_at": "2025-01-01T00:00:00Z",
            "message": "step_started",
            "payload": format!("log for {}", query.id)
        }))?;
        Ok(FetchedLogs {
            page: LogPage::new(query.page, vec![entry]),
            total_count: 2,
            total_pages: 2,
        })
    }
}

fn test_state() -> (Arc<ServerState>, watch::Sender<ConnectionState>) {
    let deployments: Vec<Deployment> = serde_json::from_value(json!([
        {
            "id": "d2",
            "created_at": "2025-01-02T00:00:00Z",
            "current_status": {"id": "s2", "deployment_id": "d2", "status": "building"}
        },
        {"id": "d1", "created_at": "2025-01-01T00:00:00Z"}
    ]))
    .unwrap();
    let (_deployments_tx, deployments_rx) =
        watch::channel(Arc::new(DeploymentState::from_snapshot(deployments)));
    let (connection_tx, connection_rx) = watch::channel(ConnectionState::Connecting);

    let mut pager = LogPager::new(10);
    pager.select_resource(LogScope::Application, "app");

    let state = ServerState::new(
        "app".to_string(),
        deployments_rx,
        connection_rx,
        Arc::new(Mutex::new(pager)),
        Arc::new(EchoFetcher),
    );
    (Arc::new(state), connection_tx)
}

async fn send(state: &Arc<ServerState>, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (state, _conn) = test_state();
    let (status, body) = send(&state, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "livesync");
}

#[tokio::test]
async fn test_connection_state() {
    let (state, conn) = test_state();
    let (_, body) = send(&state, get("/connection")).await;
    assert_eq!(body["state"], "connecting");

    conn.send(ConnectionState::Connected).unwrap();
    let (_, body) = send(&state, get("/connection")).await;
    assert_eq!(body["state"], "connected");
}

#[tokio::test]
async fn test_deployments_with_status() {
    let (state, _conn) = test_state();
    let (status, body) = send(&state, get("/deployments")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["deployments"][0]["id"], "d2");
    assert_eq!(body["deployments"][0]["live_status"]["status"], "building");
    assert!(body["deployments"][1]["live_status"].is_null());
}

#[tokio::test]
async fn test_refresh_then_search() {
    let (state, _conn) = test_state();

    let (status, body) = send(&state, post("/logs/refresh", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["outcome"], "applied");
    assert_eq!(body["has_older"], true);

    let (_, body) = send(&state, post("/logs/older", json!({}))).await;
    assert_eq!(body["current_page"], 2);
    assert_eq!(body["has_older"], false);

    let (_, body) = send(&state, get("/logs?query=LOG")).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 2);
    assert_eq!(body["entries"][0]["severity"], "info");
    assert_eq!(body["search"]["status"], "1 of 2");
}

#[tokio::test]
async fn test_select_switches_resource() {
    let (state, _conn) = test_state();
    send(&state, post("/logs/refresh", json!({}))).await;

    let (status, _) = send(
        &state,
        post("/logs/select", json!({"scope": "deployment", "id": "d1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&state, get("/logs")).await;
    assert_eq!(body["resource"]["scope"], "deployment");
    assert_eq!(body["resource"]["id"], "d1");
    assert_eq!(body["entries"][0]["entry_id"], "d1-1");

    let (status, _) = send(&state, post("/logs/select", json!({"id": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clearing_query_scrolls_to_newest() {
    let (state, _conn) = test_state();
    send(&state, post("/logs/refresh", json!({}))).await;

    let (_, body) = send(&state, get("/logs?query=log")).await;
    assert_eq!(body["scroll"], "unchanged");
    assert_eq!(body["search"]["status"], "1 of 1");

    let (_, body) = send(&state, get("/logs?query=")).await;
    assert_eq!(body["scroll"], "stick_to_newest");
    assert_eq!(body["search"]["query"], "");
    assert_eq!(body["search"]["status"], "0 of 0");

    let (_, body) = send(&state, get("/logs")).await;
    assert_eq!(body["scroll"], "unchanged");
}
