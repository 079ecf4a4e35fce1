//! Connection-lifecycle wrapper around the MQTT capability
//!
//! [`ClientWrapper`] owns the TLS credentials and the immutable connection
//! record, and exposes connect/subscribe/publish/end guarded by the current
//! connection state. Runtime failures are logged and absorbed so that an
//! interactive session survives transient connectivity problems.

use super::fingerprint::{certificate_id, FingerprintOperation};
use super::handlers;
use crate::error::HarnessResult;
use crate::observability::EventLog;
use crate::transport::mqtt::{ConnectionConfig, Credentials};
use crate::transport::{ClientEvent, EventHandler, EventPayload, MqttConnection, MqttConnector};
use std::path::PathBuf;
use std::sync::Arc;

/// Construction inputs for [`ClientWrapper`]
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperOptions {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub ca_path: PathBuf,
    pub client_id: String,
    pub subscription_topics: Vec<String>,
    /// Log every packet sent and received
    pub log_packets: bool,
}

/// AWS IoT test client with an injected MQTT capability
pub struct ClientWrapper<C>
where
    C: MqttConnector,
{
    connector: C,
    options: WrapperOptions,
    config: ConnectionConfig,
    certificate_id: String,
    connection: Option<Box<dyn MqttConnection>>,
    log: Arc<dyn EventLog>,
}

impl<C> ClientWrapper<C>
where
    C: MqttConnector,
{
    /// Load credentials, fingerprint the certificate and build the connection record
    ///
    /// Fails if any credential file is unreadable or the certificate cannot be
    /// fingerprinted.
    pub fn new(
        connector: C,
        options: WrapperOptions,
        fingerprint: &dyn FingerprintOperation,
        log: Arc<dyn EventLog>,
    ) -> HarnessResult<Self> {
        log.log("Initializing new AWS IoT client instance", None);

        let credentials =
            Credentials::load(&options.cert_path, &options.key_path, &options.ca_path)?;
        let certificate_id = certificate_id(fingerprint, &options.cert_path)?;
        let config = ConnectionConfig::new(options.client_id.clone(), credentials);

        let wrapper = Self {
            connector,
            options,
            config,
            certificate_id,
            connection: None,
            log,
        };

        wrapper.log.log(&wrapper.config_summary(), None);
        wrapper
            .log
            .log("Initialized new AWS IoT client instance", None);

        Ok(wrapper)
    }

    /// Connection record passed to every connect call
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Lowercase hex SHA-256 fingerprint of the client certificate
    pub fn certificate_id(&self) -> &str {
        &self.certificate_id
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    pub fn subscription_topics(&self) -> &[String] {
        &self.options.subscription_topics
    }

    /// Check if a connection exists and reports connected
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| connection.is_connected())
    }

    /// Human-readable client configuration block
    pub fn config_summary(&self) -> String {
        format!(
            "
    ==== Client configuration ====
    Certificate id: {}
    Client id: {}
    Certificate path: {}
    Key path: {}
    CA path: {}
    MQTT version: {}
    Protocol: {}
    Port: {}
    Clean session: {}
    Reconnect period: {}
",
            self.certificate_id,
            self.config.client_id,
            self.options.cert_path.display(),
            self.options.key_path.display(),
            self.options.ca_path.display(),
            self.config.protocol_version,
            self.config.protocol,
            self.config.port,
            self.config.clean,
            self.config.reconnect_period.as_millis(),
        )
    }

    /// Connect to `broker_endpoint` and wire the event handlers
    ///
    /// Never fails: errors are logged, and the absence of a connection is the
    /// only observable outcome.
    pub async fn connect(&mut self, broker_endpoint: &str) {
        let uri = self.config.connection_uri(broker_endpoint);

        match self.connector.connect(&uri, &self.config).await {
            Ok(connection) => {
                let connection = self.connection.insert(connection);
                self.log
                    .log("Connected to AWS IoT broker:", Some(broker_endpoint));

                for event in ClientEvent::ALL {
                    connection.on(
                        event,
                        event_handler(self.log.clone(), event, self.options.log_packets),
                    );
                }
            }
            Err(e) => {
                self.log.log("Connection error:", Some(e.to_string().as_str()));
            }
        }
    }

    /// Subscribe to the configured topics if connected
    pub async fn subscribe(&self) {
        let Some(connection) = self.live_connection() else {
            self.log
                .log("Client not connected, skipping subscription attempt", None);
            return;
        };

        let topics = topics_detail(&self.options.subscription_topics);
        self.log.log("Subscribing to topics:", Some(topics.as_str()));

        match connection.subscribe(&self.options.subscription_topics).await {
            Ok(()) => self.log.log("Successfully subscribed to:", Some(topics.as_str())),
            Err(e) => self.log.log("Subscription failed: ", Some(e.to_string().as_str())),
        }
    }

    /// Publish `message` on `topic` if connected
    pub async fn publish(&self, topic: &str, message: &str) {
        let Some(connection) = self.live_connection() else {
            self.log
                .log("Client not connected, skipping sending message", None);
            return;
        };

        match connection.publish(topic, message).await {
            Ok(()) => self.log.log(
                &format!(" -->   Message published on topic {topic}. Message: {message}"),
                None,
            ),
            Err(e) => self.log.log("Publish failed: ", Some(e.to_string().as_str())),
        }
    }

    /// End the connection if it is up; a no-op otherwise
    pub fn end(&self) {
        if let Some(connection) = self.live_connection() {
            connection.end();
        }
    }

    fn live_connection(&self) -> Option<&dyn MqttConnection> {
        self.connection
            .as_deref()
            .filter(|connection| connection.is_connected())
    }
}

fn event_handler(log: Arc<dyn EventLog>, event: ClientEvent, log_packets: bool) -> EventHandler {
    Arc::new(move |payload: &EventPayload| {
        handlers::handle(log.as_ref(), event, payload, log_packets)
    })
}

/// Topics rendered as a JSON array, e.g. `["a/b","c/#"]`
fn topics_detail(topics: &[String]) -> String {
    serde_json::to_string(topics).unwrap_or_else(|_| format!("{topics:?}"))
}
