//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing the harness without
//! requiring a broker, TLS credentials from AWS or the openssl binary.

pub mod mocks;

pub use mocks::*;
