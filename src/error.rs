//! Startup error types for the harness
//!
//! Construction-time failures are fatal and abort startup. Runtime MQTT
//! failures use [`crate::transport::mqtt::MqttError`] and are absorbed by the
//! client wrapper instead.

use crate::config::ConfigError;
use crate::harness::fingerprint::FingerprintError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for harness startup
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Failed to read credential file {}: {source}", path.display())]
    CredentialLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compute certificate fingerprint: {0}")]
    Fingerprint(#[from] FingerprintError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for harness startup
pub type HarnessResult<T> = Result<T, HarnessError>;
