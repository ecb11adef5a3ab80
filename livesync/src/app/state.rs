//! Application state management

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::app::options::AppOptions;
use crate::errors::SyncError;
use crate::http::client::HttpClient;
use crate::reconcile::reconciler::DeploymentState;
use crate::sync::deployments::DeploymentFeed;
use crate::sync::log_pager::LogPager;
use crate::transport::ConnectionState;

/// Main application state
pub struct AppState {
    /// Application whose deployments are followed
    pub application_id: String,

    /// HTTP client for backend communication
    pub http_client: Arc<HttpClient>,

    /// Latest reconciled deployment state
    pub deployments: watch::Receiver<Arc<DeploymentState>>,

    /// Transport connectivity
    pub connection: watch::Receiver<ConnectionState>,

    /// Log view for the selected resource
    pub log_pager: Arc<Mutex<LogPager>>,
}

impl AppState {
    /// Initialize application state. Returns the state plus the deployment
    /// feed that keeps it current; the caller decides where the feed runs.
    pub async fn init(
        options: &AppOptions,
        connection: watch::Receiver<ConnectionState>,
    ) -> Result<(Self, DeploymentFeed), SyncError> {
        info!("Initializing application state...");

        let http_client = Arc::new(match &options.api_token {
            Some(token) => HttpClient::with_token(
                &options.backend_base_url,
                options.request_timeout,
                token.clone(),
            )?,
            None => HttpClient::new(&options.backend_base_url, options.request_timeout)?,
        });

        let (feed, deployments) = match http_client.get_deployments(&options.application_id).await {
            Ok(snapshot) => {
                info!("Loaded {} deployments", snapshot.len());
                DeploymentFeed::new(&options.application_id, snapshot)
            }
            Err(e) => {
                warn!("Failed to load deployment snapshot, retrying on connect: {}", e);
                let (mut feed, rx) = DeploymentFeed::new(&options.application_id, Vec::new());
                feed.mark_stale();
                (feed, rx)
            }
        };

        let mut pager = LogPager::new(options.logs.page_size);
        pager.view_mut().set_auto_scroll(options.logs.auto_scroll);
        let (scope, resource_id) = options.logs.resource(&options.application_id);
        pager.select_resource(scope, &resource_id);
        if let Some(outcome) = pager.refresh(http_client.as_ref()).await {
            info!("Initial log page: {:?}", outcome);
        }

        let state = Self {
            application_id: options.application_id.clone(),
            http_client,
            deployments,
            connection,
            log_pager: Arc::new(Mutex::new(pager)),
        };
        Ok((state, feed))
    }
}
