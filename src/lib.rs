//! AWS IoT MQTT test harness
//!
//! An interactive test client for exercising an MQTT-over-TLS connection to
//! AWS IoT Core. An operator presses single keys to connect, subscribe,
//! publish or disconnect and watches the logged protocol events.
//!
//! # Overview
//!
//! - [`harness::ClientWrapper`]: connection lifecycle with state-guarded operations
//! - [`transport`]: the MQTT capability seam and its `rumqttc` implementation
//! - [`observability`]: the timestamped log sink
//! - [`config`]: TOML configuration
//! - [`testing`]: mocks for the capability seams
//!
//! # Quick Start
//!
//! ```rust
//! use awsiot_harness::harness::{KeyCommand, parse_fingerprint};
//!
//! let id = parse_fingerprint("sha256 Fingerprint=AB:CD:EF").unwrap();
//! assert_eq!(id, "abcdef");
//!
//! assert_eq!(KeyCommand::parse("c\n"), Some(KeyCommand::Connect));
//! ```

pub mod config;
pub mod error;
pub mod harness;
pub mod observability;
pub mod testing;
pub mod transport;

pub use config::{ConfigError, HarnessConfig};
pub use error::{HarnessError, HarnessResult};
pub use harness::{ClientWrapper, WrapperOptions};
pub use transport::mqtt::RumqttcConnector;
