//! Inbound push messages
//!
//! The transport is best-effort, so decoding here never fails loudly: every
//! step returns `Option` and anything unrecognized is simply `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::deployment::{Deployment, DeploymentStatus};

/// Envelope action carried by deliverable messages
pub const MESSAGE_ACTION: &str = "message";

/// Raw message as delivered by the subscription transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(default)]
    pub action: String,

    #[serde(default)]
    pub topic: String,

    #[serde(default)]
    pub data: Option<Value>,
}

/// Row-level change action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Insert,
    Update,
    #[serde(other)]
    Unknown,
}

/// Table the changed row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeTable {
    #[serde(rename = "application_deployment", alias = "deployment")]
    Deployment,
    #[serde(rename = "application_deployment_status", alias = "deployment_status")]
    DeploymentStatus,
    #[serde(other)]
    Unknown,
}

/// Body of a deliverable push message
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangeEnvelope {
    pub action: ChangeAction,
    pub table: ChangeTable,
    #[serde(default)]
    pub application_id: Option<String>,
    pub data: Value,
}

/// A decoded change the reconciler knows how to apply
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    DeploymentInserted(Deployment),
    DeploymentUpdated(Deployment),
    StatusUpserted(DeploymentStatus),
}

impl PushMessage {
    /// Parse a raw transport frame. Unparsable frames yield `None`.
    pub fn from_text(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// The change envelope, if this is a deliverable message with a table
    pub fn envelope(&self) -> Option<ChangeEnvelope> {
        if self.action != MESSAGE_ACTION {
            return None;
        }
        let data = self.data.as_ref()?;
        data.get("table")?;
        ChangeEnvelope::deserialize(data).ok()
    }

    /// Application the change belongs to, when the server named one
    pub fn application_id(&self) -> Option<String> {
        self.envelope().and_then(|envelope| envelope.application_id)
    }

    /// Decode into a typed change
    pub fn change(&self) -> Option<Change> {
        self.envelope()?.into_change()
    }
}

impl ChangeEnvelope {
    pub fn into_change(self) -> Option<Change> {
        match (self.table, self.action) {
            (ChangeTable::Deployment, ChangeAction::Insert) => {
                serde_json::from_value(self.data).ok().map(Change::DeploymentInserted)
            }
            (ChangeTable::Deployment, ChangeAction::Update) => {
                serde_json::from_value(self.data).ok().map(Change::DeploymentUpdated)
            }
            (ChangeTable::DeploymentStatus, ChangeAction::Insert | ChangeAction::Update) => {
                serde_json::from_value(self.data).ok().map(Change::StatusUpserted)
            }
            _ => None,
        }
    }
}
