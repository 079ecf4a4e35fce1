//! rumqttc-backed MQTT capability
//!
//! This module provides the production implementation of the transport
//! capability, split the same way as the rest of the transport layer: pure
//! functions apart from I/O.
//!
//! # Architecture
//!
//! - [`connection`] - Pure connection configuration and option building
//! - [`message_handler`] - Pure translation of rumqttc events into client events
//! - [`client`] - Impure I/O: connecting, the event loop driver, publish/subscribe
//!
//! # Usage
//!
//! ```rust,no_run
//! use awsiot_harness::transport::mqtt::{ConnectionConfig, Credentials, RumqttcConnector};
//! use awsiot_harness::transport::MqttConnector;
//!
//! # tokio_test::block_on(async {
//! let credentials = Credentials::load("device.pem.crt", "private.pem.key", "AmazonRootCA1.pem")?;
//! let config = ConnectionConfig::new("my-thing", credentials);
//!
//! let connection = RumqttcConnector::new()
//!     .connect("mqtts://example-ats.iot.eu-west-1.amazonaws.com", &config)
//!     .await?;
//! connection.publish("things/my-thing/hello", "Hello").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod client;
pub mod connection;
pub mod message_handler;

// Re-export public types for convenience
pub use client::{RumqttcConnection, RumqttcConnector};
pub use connection::{
    configure_mqtt_options, ConnectionConfig, Credentials, MqttError, AWS_IOT_ALPN, AWS_IOT_PORT,
    MQTT_PROTOCOL_VERSION, MQTT_SCHEME,
};
pub use message_handler::route_event;
