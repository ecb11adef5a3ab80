//! Deployment state reconciler
//!
//! Folds inbound push messages into a newest-first deployment list plus a
//! side table of current statuses. Every function here is pure: inputs are
//! borrowed, new snapshots are returned, and nothing is ever raised.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::deployment::{Deployment, DeploymentStatus};
use crate::models::events::{Change, PushMessage};

/// Current status per deployment id
pub type StatusTable = HashMap<String, DeploymentStatus>;

/// Apply one push message to a list and status table.
///
/// Messages that are malformed or do not change anything return copies of
/// the inputs.
pub fn apply(
    list: &[Deployment],
    statuses: &StatusTable,
    message: &PushMessage,
) -> (Vec<Deployment>, StatusTable) {
    message
        .change()
        .and_then(|change| reduce(list, statuses, &change))
        .unwrap_or_else(|| (list.to_vec(), statuses.clone()))
}

/// Apply a decoded change. Returns `None` when the change is a no-op.
pub fn reduce(
    list: &[Deployment],
    statuses: &StatusTable,
    change: &Change,
) -> Option<(Vec<Deployment>, StatusTable)> {
    match change {
        Change::DeploymentInserted(deployment) => {
            if list.iter().any(|d| d.id == deployment.id) {
                return None;
            }
            let mut next = Vec::with_capacity(list.len() + 1);
            next.push(deployment.clone());
            next.extend_from_slice(list);
            Some((next, statuses.clone()))
        }
        Change::DeploymentUpdated(deployment) => {
            let position = list.iter().position(|d| d.id == deployment.id)?;
            if list[position] == *deployment {
                return None;
            }
            let mut next = list.to_vec();
            next[position] = deployment.clone();
            Some((next, statuses.clone()))
        }
        Change::StatusUpserted(status) => {
            if !list.iter().any(|d| d.id == status.deployment_id) {
                return None;
            }
            if statuses.get(&status.deployment_id) == Some(status) {
                return None;
            }
            let mut next = statuses.clone();
            next.insert(status.deployment_id.clone(), status.clone());
            Some((list.to_vec(), next))
        }
    }
}

/// Reconciled deployment state for one application view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentState {
    deployments: Vec<Deployment>,
    statuses: StatusTable,
}

/// A deployment joined with its current status
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentWithStatus<'a> {
    #[serde(flatten)]
    pub deployment: &'a Deployment,
    pub live_status: Option<&'a DeploymentStatus>,
}

impl DeploymentState {
    /// Seed from a snapshot. The snapshot order is kept as-is (the backend
    /// returns newest first); repeated ids keep their first occurrence.
    pub fn from_snapshot(snapshot: Vec<Deployment>) -> Self {
        let mut deployments: Vec<Deployment> = Vec::with_capacity(snapshot.len());
        let mut statuses = StatusTable::new();

        for deployment in snapshot {
            if deployments.iter().any(|d| d.id == deployment.id) {
                continue;
            }
            if let Some(status) = &deployment.current_status {
                statuses.insert(deployment.id.clone(), status.clone());
            }
            deployments.push(deployment);
        }

        Self {
            deployments,
            statuses,
        }
    }

    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }

    pub fn statuses(&self) -> &StatusTable {
        &self.statuses
    }

    pub fn get(&self, deployment_id: &str) -> Option<&Deployment> {
        self.deployments.iter().find(|d| d.id == deployment_id)
    }

    pub fn status_of(&self, deployment_id: &str) -> Option<&DeploymentStatus> {
        self.statuses.get(deployment_id)
    }

    pub fn len(&self) -> usize {
        self.deployments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }

    /// Deployments newest first, each with its current status
    pub fn entries(&self) -> Vec<DeploymentWithStatus<'_>> {
        self.deployments
            .iter()
            .map(|deployment| DeploymentWithStatus {
                deployment,
                live_status: self.statuses.get(&deployment.id),
            })
            .collect()
    }

    /// Apply a message, returning the next state or `None` if nothing changed
    pub fn apply(&self, message: &PushMessage) -> Option<DeploymentState> {
        let change = message.change()?;
        let (deployments, statuses) = reduce(&self.deployments, &self.statuses, &change)?;
        Some(Self {
            deployments,
            statuses,
        })
    }
}
