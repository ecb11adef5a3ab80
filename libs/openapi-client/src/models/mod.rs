//! API models

use serde::{Deserialize, Serialize};

/// Deployment snapshot response
///
/// Items are kept as raw JSON so that consumers decide how strictly to
/// decode them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentListResponse {
    #[serde(default)]
    pub deployments: Vec<serde_json::Value>,
}

/// Query parameters for a paginated log fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsQuery {
    /// Application or deployment id
    #[serde(skip_serializing)]
    pub id: String,
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
}

/// Paginated log fetch response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsPageResponse {
    #[serde(default)]
    pub logs: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default = "default_page")]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

fn default_page() -> u32 {
    1
}

/// Outbound topic subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub topic: String,
    pub event: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}
