//! Subscription transport

pub mod client;
pub mod topics;

use serde::Serialize;

use crate::models::events::PushMessage;

/// Events handed from the transport to consumers, in delivery order
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The socket is open and the subscription was sent. `resumed` is true
    /// for every connection after the first one.
    Connected { resumed: bool },
    /// An inbound message
    Message(PushMessage),
    /// The socket dropped; a reconnect will follow
    Disconnected,
}

/// Connectivity notice surfaced to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}
