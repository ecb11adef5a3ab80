//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::errors::SyncError;
use crate::http::client::HttpClient;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::sync::deployments::DeploymentFeed;
use crate::transport::{ConnectionState, TransportEvent};
use crate::workers::subscriber::{self, Subscription};

/// Run livesync until `shutdown_signal` resolves
pub async fn run(
    version: String,
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), SyncError> {
    info!("Initializing livesync {}...", version);

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    let app_state = match init(&options, shutdown_tx.clone(), &mut shutdown_manager).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to start livesync: {}", e);
            shutdown_manager.shutdown().await?;
            return Err(e);
        }
    };
    info!(
        "Following deployments of application {}",
        app_state.application_id
    );

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<AppState>, SyncError> {
    let (connection_tx, connection_rx) = watch::channel(ConnectionState::Connecting);
    let (events_tx, events_rx) = mpsc::channel(options.event_buffer.max(1));

    let (app_state, feed) = AppState::init(options, connection_rx).await?;
    let app_state = Arc::new(app_state);

    init_deployment_feed(
        feed,
        app_state.http_client.clone(),
        events_rx,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    init_subscriber_worker(
        options,
        app_state.http_client.token().map(str::to_string),
        events_tx,
        connection_tx,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    if options.enable_server {
        init_server(
            options,
            app_state.clone(),
            shutdown_manager,
            shutdown_tx.subscribe(),
        )
        .await?;
    }

    Ok(app_state)
}

fn init_deployment_feed(
    feed: DeploymentFeed,
    http_client: Arc<HttpClient>,
    events: mpsc::Receiver<TransportEvent>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), SyncError> {
    info!("Initializing deployment feed...");

    let feed_handle = tokio::spawn(async move {
        feed.run(
            http_client,
            events,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_feed_handle(feed_handle)
}

fn init_subscriber_worker(
    options: &AppOptions,
    token: Option<String>,
    events: mpsc::Sender<TransportEvent>,
    connection: watch::Sender<ConnectionState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), SyncError> {
    info!("Initializing subscriber worker...");

    let worker_options = options.subscriber.clone();
    let subscription = Subscription {
        backend_url: options.backend_base_url.clone(),
        application_id: options.application_id.clone(),
        client_id: options.client_id.clone(),
        token,
    };

    let subscriber_handle = tokio::spawn(async move {
        subscriber::run(
            &worker_options,
            subscription,
            events,
            connection,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_subscriber_handle(subscriber_handle)
}

async fn init_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), SyncError> {
    info!("Initializing local HTTP server...");

    let server_state = ServerState::from_app_state(&app_state);

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    subscriber_handle: Option<JoinHandle<()>>,
    feed_handle: Option<JoinHandle<()>>,
    server_handle: Option<JoinHandle<Result<(), SyncError>>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            subscriber_handle: None,
            feed_handle: None,
            server_handle: None,
        }
    }

    pub fn with_subscriber_handle(&mut self, handle: JoinHandle<()>) -> Result<(), SyncError> {
        if self.subscriber_handle.is_some() {
            return Err(SyncError::ShutdownError("subscriber_handle already set".to_string()));
        }
        self.subscriber_handle = Some(handle);
        Ok(())
    }

    pub fn with_feed_handle(&mut self, handle: JoinHandle<()>) -> Result<(), SyncError> {
        if self.feed_handle.is_some() {
            return Err(SyncError::ShutdownError("feed_handle already set".to_string()));
        }
        self.feed_handle = Some(handle);
        Ok(())
    }

    pub fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), SyncError>>,
    ) -> Result<(), SyncError> {
        if self.server_handle.is_some() {
            return Err(SyncError::ShutdownError("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), SyncError> {
        let _ = self.shutdown_tx.send(());

        let max_delay = self.lifecycle_options.max_shutdown_delay;
        match tokio::time::timeout(max_delay, self.shutdown_impl()).await {
            Ok(result) => result,
            Err(_) => {
                error!("Shutdown timed out after {:?}, aborting workers...", max_delay);
                self.abort_all();
                Err(SyncError::ShutdownError(format!(
                    "shutdown timed out after {:?}",
                    max_delay
                )))
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), SyncError> {
        info!("Shutting down livesync...");

        // 1. Subscriber worker, so no more events are produced
        if let Some(handle) = self.subscriber_handle.take() {
            handle.await.map_err(|e| SyncError::ShutdownError(e.to_string()))?;
        }

        // 2. Deployment feed
        if let Some(handle) = self.feed_handle.take() {
            handle.await.map_err(|e| SyncError::ShutdownError(e.to_string()))?;
        }

        // 3. Server
        if let Some(handle) = self.server_handle.take() {
            handle.await.map_err(|e| SyncError::ShutdownError(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }

    fn abort_all(&mut self) {
        for handle in [self.subscriber_handle.take(), self.feed_handle.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}
