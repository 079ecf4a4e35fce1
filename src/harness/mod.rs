//! AWS IoT test client
//!
//! The connection-lifecycle wrapper and everything it needs at construction
//! time: certificate fingerprinting, event handlers and operator commands.

pub mod commands;
pub mod fingerprint;
pub mod handlers;
pub mod wrapper;

pub use crate::transport::mqtt::Credentials;
pub use commands::{usage_banner, KeyCommand};
pub use fingerprint::{parse_fingerprint, FingerprintError, FingerprintOperation, OpensslFingerprint};
pub use wrapper::{ClientWrapper, WrapperOptions};
