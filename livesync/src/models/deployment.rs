//! Deployment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A deployment of an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    /// Unique deployment ID
    pub id: String,

    /// Application this deployment belongs to
    #[serde(default)]
    pub application_id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Current status as embedded by the snapshot endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<DeploymentStatus>,

    /// Server fields this client does not interpret (commit, branch, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Status row attached to a deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    /// Unique status ID
    pub id: String,

    /// Deployment this status belongs to
    pub deployment_id: String,

    /// Lifecycle phase
    pub status: DeploymentPhase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Deployment lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentPhase {
    Draft,
    Cloning,
    Building,
    Deploying,
    Deployed,
    Failed,
    Stopped,
    /// Phases added server-side after this client was built
    #[serde(other)]
    Unknown,
}

impl DeploymentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentPhase::Draft => "draft",
            DeploymentPhase::Cloning => "cloning",
            DeploymentPhase::Building => "building",
            DeploymentPhase::Deploying => "deploying",
            DeploymentPhase::Deployed => "deployed",
            DeploymentPhase::Failed => "failed",
            DeploymentPhase::Stopped => "stopped",
            DeploymentPhase::Unknown => "unknown",
        }
    }

    /// Whether the deployment is still moving through the pipeline
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            DeploymentPhase::Cloning | DeploymentPhase::Building | DeploymentPhase::Deploying
        )
    }
}

impl std::fmt::Display for DeploymentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
