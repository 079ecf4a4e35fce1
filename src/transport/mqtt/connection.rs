//! Pure connection configuration for the MQTT capability
//!
//! This module contains the immutable connection record, credential loading,
//! and the pure mapping from that record to rumqttc options.

use crate::error::HarnessError;
use rumqttc::v5::MqttOptions;
use rumqttc::{TlsConfiguration, Transport as RumqttcTransport};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// AWS IoT Core accepts MQTT over TLS on 443 when ALPN is negotiated
pub const AWS_IOT_PORT: u16 = 443;

/// ALPN protocol token for MQTT with X.509 client certificates on AWS IoT
pub const AWS_IOT_ALPN: &str = "x-amzn-mqtt-ca";

pub const MQTT_PROTOCOL_VERSION: u8 = 5;

pub const MQTT_SCHEME: &str = "mqtts";

/// TLS material read from disk at startup
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: Vec<u8>,
    pub cert: Vec<u8>,
    pub ca: Vec<u8>,
}

impl Credentials {
    /// Read the client certificate, private key and root CA as raw bytes
    pub fn load(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
        ca_path: impl AsRef<Path>,
    ) -> Result<Self, HarnessError> {
        Ok(Self {
            key: read_credential(key_path.as_ref())?,
            cert: read_credential(cert_path.as_ref())?,
            ca: read_credential(ca_path.as_ref())?,
        })
    }
}

fn read_credential(path: &Path) -> Result<Vec<u8>, HarnessError> {
    std::fs::read(path).map_err(|source| HarnessError::CredentialLoad {
        path: path.to_path_buf(),
        source,
    })
}

// Key material must never reach the logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &format_args!("<{} bytes redacted>", self.key.len()))
            .field("cert", &format_args!("<{} bytes>", self.cert.len()))
            .field("ca", &format_args!("<{} bytes>", self.ca.len()))
            .finish()
    }
}

/// Immutable connection record passed to every connect call
#[derive(Clone, PartialEq)]
pub struct ConnectionConfig {
    pub port: u16,
    pub alpn_protocols: Vec<String>,
    pub protocol_version: u8,
    pub protocol: String,
    pub client_id: String,
    pub key: Vec<u8>,
    pub cert: Vec<u8>,
    pub ca: Vec<u8>,
    /// Request a clean session on every connect
    pub clean: bool,
    /// Zero disables automatic reconnect
    pub reconnect_period: Duration,
}

impl ConnectionConfig {
    /// Build the AWS IoT connection record for `client_id`
    pub fn new(client_id: impl Into<String>, credentials: Credentials) -> Self {
        let Credentials { key, cert, ca } = credentials;
        Self {
            port: AWS_IOT_PORT,
            alpn_protocols: vec![AWS_IOT_ALPN.to_string()],
            protocol_version: MQTT_PROTOCOL_VERSION,
            protocol: MQTT_SCHEME.to_string(),
            client_id: client_id.into(),
            key,
            cert,
            ca,
            clean: true,
            reconnect_period: Duration::ZERO,
        }
    }

    /// Connection URI for `endpoint`, e.g. `mqtts://xxxx-ats.iot.region.amazonaws.com`
    pub fn connection_uri(&self, endpoint: &str) -> String {
        format!("{}://{}", self.protocol, endpoint)
    }

    pub fn reconnect_enabled(&self) -> bool {
        !self.reconnect_period.is_zero()
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("port", &self.port)
            .field("alpn_protocols", &self.alpn_protocols)
            .field("protocol_version", &self.protocol_version)
            .field("protocol", &self.protocol)
            .field("client_id", &self.client_id)
            .field("key", &format_args!("<{} bytes redacted>", self.key.len()))
            .field("cert", &format_args!("<{} bytes>", self.cert.len()))
            .field("ca", &format_args!("<{} bytes>", self.ca.len()))
            .field("clean", &self.clean)
            .field("reconnect_period", &self.reconnect_period)
            .finish()
    }
}

/// MQTT capability errors
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Connection refused by broker: {0}")]
    ConnectionRefused(String),
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Publishing failed: {0}")]
    PublishFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Not connected")]
    NotConnected,
}

/// Pure function to configure rumqttc options from the connection record
///
/// The host comes from `uri`; the port always comes from `config` so that
/// ALPN on 443 is used even when the URI names no port.
pub fn configure_mqtt_options(
    uri: &str,
    config: &ConnectionConfig,
) -> Result<MqttOptions, MqttError> {
    let url = Url::parse(uri).map_err(|_| MqttError::InvalidBrokerUrl(uri.to_string()))?;

    if url.scheme() != MQTT_SCHEME {
        return Err(MqttError::InvalidBrokerUrl(format!(
            "{uri}: only {MQTT_SCHEME}:// is supported"
        )));
    }

    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| MqttError::InvalidBrokerUrl(uri.to_string()))?;

    let mut mqtt_options = MqttOptions::new(config.client_id.clone(), host, config.port);
    mqtt_options.set_clean_start(config.clean);
    mqtt_options.set_keep_alive(Duration::from_secs(60));

    let alpn = config
        .alpn_protocols
        .iter()
        .map(|protocol| protocol.as_bytes().to_vec())
        .collect::<Vec<_>>();

    let transport = RumqttcTransport::Tls(TlsConfiguration::Simple {
        ca: config.ca.clone(),
        alpn: (!alpn.is_empty()).then_some(alpn),
        client_auth: Some((config.cert.clone(), config.key.clone())),
    });
    mqtt_options.set_transport(transport);

    Ok(mqtt_options)
}
