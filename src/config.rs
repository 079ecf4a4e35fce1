//! Harness configuration
//!
//! Broker endpoint, client identity, TLS credential paths and topics are read
//! from a TOML file:
//!
//! ```toml
//! [broker]
//! endpoint = "example-ats.iot.eu-west-1.amazonaws.com"
//! client_id = "test-thing"
//!
//! [tls]
//! cert_path = "./certificates/certificate.pem.crt"
//! key_path = "./certificates/private.pem.key"
//!
//! [topics]
//! subscribe = ["things/test-thing/in", "things/test-thing/status"]
//! publish = "things/test-thing/out"
//! ```

use crate::harness::WrapperOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Locations searched, in order, when no `--config` is given
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["harness.toml", "config/harness.toml"];

/// Root CA location used when `[tls] ca_path` is omitted
pub const DEFAULT_CA_PATH: &str = "./certificates/awsRootCA.crt";

/// Message published by the `p` key when `[topics] message` is omitted
pub const DEFAULT_MESSAGE: &str = "Hello from test client";

/// Main harness configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    pub broker: BrokerSection,
    pub tls: TlsSection,
    pub topics: TopicsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrokerSection {
    /// AWS IoT data endpoint, without scheme or port
    pub endpoint: String,
    /// MQTT client id; the thing name when the certificate is registered
    pub client_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TlsSection {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    #[serde(default = "default_ca_path")]
    pub ca_path: PathBuf,
}

fn default_ca_path() -> PathBuf {
    PathBuf::from(DEFAULT_CA_PATH)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicsSection {
    pub subscribe: Vec<String>,
    pub publish: String,
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// Log every packet sent and received
    #[serde(default = "default_log_packets")]
    pub log_packets: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            log_packets: default_log_packets(),
        }
    }
}

fn default_log_packets() -> bool {
    true
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HarnessConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: HarnessConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from the first of [`DEFAULT_CONFIG_PATHS`] that exists
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let found = DEFAULT_CONFIG_PATHS
                    .iter()
                    .map(Path::new)
                    .find(|candidate| candidate.is_file())
                    .ok_or_else(|| {
                        ConfigError::InvalidConfig(format!(
                            "No configuration file found (looked for {})",
                            DEFAULT_CONFIG_PATHS.join(", ")
                        ))
                    })?;
                Self::load_from_file(found)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "[broker] endpoint must not be empty".to_string(),
            ));
        }
        if self.broker.endpoint.contains("://") {
            return Err(ConfigError::InvalidConfig(format!(
                "[broker] endpoint '{}' must be a host name without a scheme",
                self.broker.endpoint
            )));
        }

        validate_client_id(&self.broker.client_id)?;

        if self.topics.subscribe.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "[topics] subscribe must list at least one topic".to_string(),
            ));
        }
        if let Some(topic) = self.topics.subscribe.iter().find(|t| t.is_empty()) {
            return Err(ConfigError::InvalidConfig(format!(
                "[topics] subscribe contains an empty topic: {topic:?}"
            )));
        }
        if self.topics.publish.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "[topics] publish must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Construction inputs for the client wrapper
    pub fn wrapper_options(&self) -> WrapperOptions {
        WrapperOptions {
            cert_path: self.tls.cert_path.clone(),
            key_path: self.tls.key_path.clone(),
            ca_path: self.tls.ca_path.clone(),
            client_id: self.broker.client_id.clone(),
            subscription_topics: self.topics.subscribe.clone(),
            log_packets: self.logging.log_packets,
        }
    }

    /// Render the resolved configuration, defaults included, as TOML
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[broker]
endpoint = "example-ats.iot.eu-west-1.amazonaws.com"
client_id = "test-thing"

[tls]
cert_path = "certs/cert.pem"
key_path = "certs/key.pem"

[topics]
subscribe = ["topic1", "topic2"]
publish = "topic"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Client ids must match [a-zA-Z0-9:_-]+, the AWS IoT thing name alphabet
fn validate_client_id(client_id: &str) -> Result<(), ConfigError> {
    let valid_chars = client_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ':' || c == '_' || c == '-');

    if client_id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidConfig(format!(
            "Client ID '{client_id}' must match pattern [a-zA-Z0-9:_-]+"
        )));
    }

    Ok(())
}
