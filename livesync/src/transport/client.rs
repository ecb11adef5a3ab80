//! WebSocket subscription client

use futures::{SinkExt, StreamExt};
use http::HeaderValue;
use openapi_client::models::SubscribeRequest;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use url::Url;

use crate::errors::SyncError;
use crate::models::events::PushMessage;

/// One open connection to the push transport
pub struct SubscriptionClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl SubscriptionClient {
    /// Open a connection
    pub async fn connect(
        url: &Url,
        client_id: &str,
        token: Option<&str>,
    ) -> Result<Self, SyncError> {
        let mut request = url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert("X-Client-ID", header_value(client_id)?);
        headers.insert("User-Agent", HeaderValue::from_static("livesync"));
        if let Some(token) = token {
            headers.insert("Authorization", header_value(&format!("Bearer {}", token))?);
        }

        let (stream, _) = connect_async(request).await?;
        info!("Connected to {}", url);
        Ok(Self { stream })
    }

    /// Send a subscribe request
    pub async fn subscribe(&mut self, request: &SubscribeRequest) -> Result<(), SyncError> {
        let text = serde_json::to_string(request)?;
        self.stream.send(Message::Text(text.into())).await?;
        info!("Subscribed to: {}", request.topic);
        Ok(())
    }

    /// Wait for the next decodable message.
    ///
    /// Frames that are not JSON push messages are skipped. Returns `Ok(None)`
    /// once the server closes the connection.
    pub async fn next_message(&mut self) -> Result<Option<PushMessage>, SyncError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => match PushMessage::from_text(&text) {
                    Some(message) => return Ok(Some(message)),
                    None => debug!("Skipping undecodable frame ({} bytes)", text.len()),
                },
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Send a heartbeat ping
    pub async fn ping(&mut self) -> Result<(), SyncError> {
        self.stream.send(Message::Ping(Default::default())).await?;
        Ok(())
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<(), SyncError> {
        self.stream.close(None).await?;
        info!("Subscription connection closed");
        Ok(())
    }
}

fn header_value(value: &str) -> Result<HeaderValue, SyncError> {
    HeaderValue::from_str(value).map_err(|e| SyncError::ConfigError(e.to_string()))
}

/// Build the websocket URL from the backend base URL
pub fn build_subscription_url(backend_url: &str, path: &str) -> Result<Url, SyncError> {
    let mut url = Url::parse(backend_url).map_err(|e| SyncError::ConfigError(e.to_string()))?;

    // Change http/https to ws/wss
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(SyncError::ConfigError("Invalid backend URL scheme".to_string())),
    };

    url.set_scheme(scheme)
        .map_err(|_| SyncError::ConfigError("Failed to set scheme".to_string()))?;

    url.set_path(&format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    ));

    Ok(url)
}
