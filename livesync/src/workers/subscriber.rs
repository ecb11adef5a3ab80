//! Subscription worker: keeps one websocket open and forwards messages

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use openapi_client::models::SubscribeRequest;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::transport::client::{build_subscription_url, SubscriptionClient};
use crate::transport::topics::{Topics, MONITOR_EVENT};
use crate::transport::{ConnectionState, TransportEvent};
use crate::utils::{calc_exp_backoff, CooldownOptions};

/// Subscriber worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Path of the websocket endpoint, relative to the backend URL
    pub transport_path: String,

    /// Reconnect backoff
    pub reconnect: CooldownOptions,

    /// Heartbeat interval
    pub heartbeat_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            transport_path: "ws".to_string(),
            reconnect: CooldownOptions::default(),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

/// Who the worker connects as and what it subscribes to
#[derive(Debug, Clone)]
pub struct Subscription {
    pub backend_url: String,
    pub application_id: String,
    pub client_id: String,
    pub token: Option<String>,
}

enum Session {
    /// Connection dropped, reconnect
    Dropped,
    /// Shutdown requested or nobody is listening anymore
    Stop,
}

/// Run the subscriber worker
pub async fn run(
    options: &Options,
    subscription: Subscription,
    events: mpsc::Sender<TransportEvent>,
    connection: watch::Sender<ConnectionState>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Subscriber worker starting...");

    let url = match build_subscription_url(&subscription.backend_url, &options.transport_path) {
        Ok(url) => url,
        Err(e) => {
            error!("Failed to build subscription URL: {}", e);
            return;
        }
    };

    let request = SubscribeRequest {
        topic: Topics::application_deployments(&subscription.application_id),
        event: MONITOR_EVENT.to_string(),
    };

    let mut attempt: u32 = 0;
    let mut connected_before = false;

    loop {
        let _ = connection.send(ConnectionState::Connecting);
        info!("Connecting to subscription transport: {}", url);

        let connect = SubscriptionClient::connect(
            &url,
            &subscription.client_id,
            subscription.token.as_deref(),
        );
        let result = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Subscriber worker shutting down...");
                let _ = connection.send(ConnectionState::Disconnected);
                return;
            }
            result = connect => result,
        };

        match result {
            Ok(mut client) => match client.subscribe(&request).await {
                Ok(()) => {
                    attempt = 0;
                    let _ = connection.send(ConnectionState::Connected);
                    let resumed = connected_before;
                    connected_before = true;
                    if events.send(TransportEvent::Connected { resumed }).await.is_err() {
                        let _ = client.close().await;
                        return;
                    }

                    let session =
                        run_session(options, &mut client, &events, &mut shutdown_signal).await;
                    let _ = connection.send(ConnectionState::Disconnected);
                    match session {
                        Session::Stop => {
                            let _ = client.close().await;
                            info!("Subscriber worker shutting down...");
                            return;
                        }
                        Session::Dropped => {
                            if events.send(TransportEvent::Disconnected).await.is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to subscribe to {}: {}", request.topic, e);
                    let _ = client.close().await;
                    let _ = connection.send(ConnectionState::Disconnected);
                }
            },
            Err(e) => {
                let _ = connection.send(ConnectionState::Disconnected);
                error!("Failed to connect to subscription transport: {}", e);
            }
        }

        let delay = calc_exp_backoff(&options.reconnect, attempt);
        attempt = attempt.saturating_add(1);
        warn!("Reconnecting in {:?}...", delay);

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Subscriber worker shutting down...");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

async fn run_session(
    options: &Options,
    client: &mut SubscriptionClient,
    events: &mpsc::Sender<TransportEvent>,
    shutdown_signal: &mut Pin<Box<dyn Future<Output = ()> + Send>>,
) -> Session {
    let mut heartbeat_tick = tokio::time::interval(options.heartbeat_interval);
    // the first tick completes immediately
    heartbeat_tick.tick().await;

    loop {
        tokio::select! {
            _ = &mut *shutdown_signal => {
                return Session::Stop;
            }
            _ = heartbeat_tick.tick() => {
                if let Err(e) = client.ping().await {
                    warn!("Failed to send heartbeat: {}", e);
                    return Session::Dropped;
                }
            }
            message = client.next_message() => {
                match message {
                    Ok(Some(message)) => {
                        debug!("Received message on {}", message.topic);
                        if events.send(TransportEvent::Message(message)).await.is_err() {
                            return Session::Stop;
                        }
                    }
                    Ok(None) => {
                        warn!("Subscription transport closed the connection");
                        return Session::Dropped;
                    }
                    Err(e) => {
                        error!("Subscription transport error: {}", e);
                        return Session::Dropped;
                    }
                }
            }
        }
    }
}
