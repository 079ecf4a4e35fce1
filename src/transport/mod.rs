//! Transport capability for the harness
//!
//! This module defines the MQTT client capability the harness depends on,
//! so the protocol engine can be swapped for a test double. The concrete
//! rumqttc-backed implementation lives in [`mqtt`].

use crate::transport::mqtt::{ConnectionConfig, MqttError};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

pub mod mqtt;

/// Protocol events a live connection can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEvent {
    PacketReceive,
    PacketSend,
    Message,
    Error,
    Close,
    Disconnect,
    End,
}

impl ClientEvent {
    /// Every event the harness wires a handler for, in registration order
    pub const ALL: [ClientEvent; 7] = [
        ClientEvent::PacketReceive,
        ClientEvent::PacketSend,
        ClientEvent::Message,
        ClientEvent::Error,
        ClientEvent::Close,
        ClientEvent::Disconnect,
        ClientEvent::End,
    ];

    /// Wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientEvent::PacketReceive => "packetreceive",
            ClientEvent::PacketSend => "packetsend",
            ClientEvent::Message => "message",
            ClientEvent::Error => "error",
            ClientEvent::Close => "close",
            ClientEvent::Disconnect => "disconnect",
            ClientEvent::End => "end",
        }
    }
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload delivered to an event handler
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Raw packet rendering for packet send/receive events
    Packet(String),
    /// Application message received on a subscribed topic
    Message { topic: String, payload: Bytes },
    /// Client error text
    Error(String),
    Close,
    /// Broker-initiated disconnect, with the optional MQTT v5 reason string
    Disconnect { reason: Option<String> },
    End,
}

/// Handler invoked for a registered event
pub type EventHandler = Arc<dyn Fn(&EventPayload) + Send + Sync>;

/// Capability that opens MQTT connections
///
/// The harness never depends on a concrete protocol engine, only on this
/// trait, to enable dependency injection and testing.
#[async_trait::async_trait]
pub trait MqttConnector: Send + Sync {
    /// Open a connection to `uri` using `config`
    async fn connect(
        &self,
        uri: &str,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn MqttConnection>, MqttError>;
}

/// Live connection handle returned by a successful connect
#[async_trait::async_trait]
pub trait MqttConnection: Send + Sync {
    /// Subscribe to every topic filter in `topics`
    async fn subscribe(&self, topics: &[String]) -> Result<(), MqttError>;

    /// Publish `message` on `topic`
    async fn publish(&self, topic: &str, message: &str) -> Result<(), MqttError>;

    /// Close the connection without waiting for the broker
    fn end(&self);

    /// Register `handler` for `event`
    fn on(&self, event: ClientEvent, handler: EventHandler);

    /// Check if the connection is currently up
    fn is_connected(&self) -> bool;
}
