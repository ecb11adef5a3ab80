//! Deployment API client

use async_trait::async_trait;
use openapi_client::models::DeploymentListResponse;
use tracing::{debug, warn};

use crate::errors::SyncError;
use crate::http::client::HttpClient;
use crate::models::deployment::Deployment;
use crate::sync::deployments::SnapshotSource;

impl HttpClient {
    /// Get the deployment snapshot for an application, newest first
    pub async fn get_deployments(&self, application_id: &str) -> Result<Vec<Deployment>, SyncError> {
        let path = format!("/applications/{}/deployments", application_id);
        let no_query: [(&str, &str); 0] = [];
        let response: DeploymentListResponse = self.get(&path, &no_query).await?;
        Ok(decode_deployments(response))
    }
}

/// Decode snapshot rows, skipping the ones this client cannot read
pub fn decode_deployments(response: DeploymentListResponse) -> Vec<Deployment> {
    let total = response.deployments.len();
    let deployments: Vec<Deployment> = response
        .deployments
        .into_iter()
        .filter_map(|raw| match serde_json::from_value(raw) {
            Ok(deployment) => Some(deployment),
            Err(e) => {
                warn!("Skipping undecodable deployment: {}", e);
                None
            }
        })
        .collect();
    debug!("Decoded {}/{} deployments", deployments.len(), total);
    deployments
}

#[async_trait]
impl SnapshotSource for HttpClient {
    async fn fetch_snapshot(&self, application_id: &str) -> Result<Vec<Deployment>, SyncError> {
        self.get_deployments(application_id).await
    }
}
