//! Server state

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::app::state::AppState;
use crate::reconcile::reconciler::DeploymentState;
use crate::sync::log_pager::{LogFetcher, LogPager};
use crate::transport::ConnectionState;

/// Server state shared across handlers
pub struct ServerState {
    pub application_id: String,
    pub deployments: watch::Receiver<Arc<DeploymentState>>,
    pub connection: watch::Receiver<ConnectionState>,
    pub log_pager: Arc<Mutex<LogPager>>,
    pub fetcher: Arc<dyn LogFetcher>,
}

impl ServerState {
    pub fn new(
        application_id: String,
        deployments: watch::Receiver<Arc<DeploymentState>>,
        connection: watch::Receiver<ConnectionState>,
        log_pager: Arc<Mutex<LogPager>>,
        fetcher: Arc<dyn LogFetcher>,
    ) -> Self {
        Self {
            application_id,
            deployments,
            connection,
            log_pager,
            fetcher,
        }
    }

    pub fn from_app_state(app_state: &AppState) -> Self {
        Self::new(
            app_state.application_id.clone(),
            app_state.deployments.clone(),
            app_state.connection.clone(),
            app_state.log_pager.clone(),
            app_state.http_client.clone(),
        )
    }
}
