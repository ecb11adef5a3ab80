//! Live deployment feed

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::errors::SyncError;
use crate::models::deployment::Deployment;
use crate::models::events::PushMessage;
use crate::reconcile::reconciler::DeploymentState;
use crate::transport::topics::Topics;
use crate::transport::TransportEvent;

/// Where deployment snapshots come from
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self, application_id: &str) -> Result<Vec<Deployment>, SyncError>;
}

/// Owns the reconciled deployment state for one application and publishes
/// every new state to its watchers.
pub struct DeploymentFeed {
    application_id: String,
    state: Arc<DeploymentState>,
    publisher: watch::Sender<Arc<DeploymentState>>,
    needs_reseed: bool,
}

impl DeploymentFeed {
    /// Create a feed seeded from a snapshot
    pub fn new(
        application_id: &str,
        snapshot: Vec<Deployment>,
    ) -> (Self, watch::Receiver<Arc<DeploymentState>>) {
        let state = Arc::new(DeploymentState::from_snapshot(snapshot));
        let (publisher, receiver) = watch::channel(state.clone());
        let feed = Self {
            application_id: application_id.to_string(),
            state,
            publisher,
            needs_reseed: false,
        };
        (feed, receiver)
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn state(&self) -> &DeploymentState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DeploymentState>> {
        self.publisher.subscribe()
    }

    /// Apply one message. Returns true when the state changed and a new
    /// version was published.
    pub fn handle(&mut self, message: &PushMessage) -> bool {
        if !self.belongs_here(message) {
            debug!("Ignoring message on topic {:?}", message.topic);
            return false;
        }

        match self.state.apply(message) {
            Some(next) => {
                self.publish(next);
                true
            }
            None => false,
        }
    }

    /// Re-seed on the next connection even if it is the first one
    pub fn mark_stale(&mut self) {
        self.needs_reseed = true;
    }

    /// Replace the state with a fresh snapshot
    pub fn reseed(&mut self, snapshot: Vec<Deployment>) {
        self.needs_reseed = false;
        let next = DeploymentState::from_snapshot(snapshot);
        if next == *self.state {
            return;
        }
        info!("Re-seeded deployment state ({} deployments)", next.len());
        self.publish(next);
    }

    fn publish(&mut self, next: DeploymentState) {
        self.state = Arc::new(next);
        // no receivers left is fine, the feed keeps its own copy
        let _ = self.publisher.send(self.state.clone());
    }

    fn belongs_here(&self, message: &PushMessage) -> bool {
        if !message.topic.is_empty() && !Topics::is_deployments_topic(&message.topic) {
            return false;
        }
        if let Some(topic_app) = Topics::parse_application_id(&message.topic) {
            if topic_app != self.application_id {
                return false;
            }
        }
        match message.application_id() {
            Some(app) => app == self.application_id,
            None => true,
        }
    }

    /// Consume transport events until shutdown or until the transport goes
    /// away. After every reconnect (and on the first connection when the
    /// feed is stale) the state is re-seeded from `source`.
    pub async fn run<S: SnapshotSource + ?Sized>(
        mut self,
        source: Arc<S>,
        mut events: mpsc::Receiver<TransportEvent>,
        mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
    ) {
        info!("Deployment feed starting for application {}...", self.application_id);

        loop {
            tokio::select! {
                _ = &mut shutdown_signal => {
                    info!("Deployment feed shutting down...");
                    return;
                }
                event = events.recv() => {
                    match event {
                        Some(TransportEvent::Message(message)) => {
                            if self.handle(&message) {
                                debug!("Deployment state updated ({} deployments)", self.state.len());
                            }
                        }
                        Some(TransportEvent::Connected { resumed }) => {
                            if resumed || self.needs_reseed {
                                match source.fetch_snapshot(&self.application_id).await {
                                    Ok(snapshot) => self.reseed(snapshot),
                                    Err(e) => {
                                        error!("Failed to re-seed deployments: {}", e);
                                        self.needs_reseed = true;
                                    }
                                }
                            }
                        }
                        Some(TransportEvent::Disconnected) => {
                            warn!("Transport disconnected, deployment state may be stale");
                        }
                        None => {
                            info!("Transport closed, deployment feed exiting");
                            return;
                        }
                    }
                }
            }
        }
    }
}
