//! Certificate fingerprinting
//!
//! The certificate id shown at startup is the SHA-256 fingerprint of the
//! client certificate as printed by `openssl x509 -fingerprint`, with the
//! separators removed and lowercased. On AWS IoT this equals the id the
//! console shows for the registered certificate.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

static FINGERPRINT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)Fingerprint=(\S*)").expect("fingerprint pattern is valid"));

/// Fingerprinting errors
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("Failed to run fingerprint command: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Fingerprint command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },
    #[error("Fingerprint command produced non-UTF-8 output")]
    InvalidOutput,
    #[error("Failed to extract fingerprint from output: {0}")]
    Unparseable(String),
}

/// External operation that prints a certificate fingerprint
pub trait FingerprintOperation: Send + Sync {
    /// Raw output of the operation run against `cert_path`
    fn fingerprint_output(&self, cert_path: &Path) -> Result<String, FingerprintError>;
}

/// Fingerprints certificates with the `openssl` command line tool
#[derive(Debug, Clone)]
pub struct OpensslFingerprint {
    program: PathBuf,
}

impl OpensslFingerprint {
    pub fn new() -> Self {
        Self::with_program("openssl")
    }

    /// Use a specific openssl binary instead of the one on `PATH`
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for OpensslFingerprint {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintOperation for OpensslFingerprint {
    fn fingerprint_output(&self, cert_path: &Path) -> Result<String, FingerprintError> {
        debug!(
            program = %self.program.display(),
            cert_path = %cert_path.display(),
            "Computing certificate fingerprint"
        );

        let output = Command::new(&self.program)
            .args(["x509", "-noout", "-fingerprint", "-sha256", "-inform", "pem", "-in"])
            .arg(cert_path)
            .output()
            .map_err(FingerprintError::Spawn)?;

        if !output.status.success() {
            return Err(FingerprintError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| FingerprintError::InvalidOutput)
    }
}

/// Extract the certificate id from fingerprint output (pure function)
///
/// `sha256 Fingerprint=B1:14:32:...` becomes `b11432...`.
pub fn parse_fingerprint(output: &str) -> Result<String, FingerprintError> {
    let raw = FINGERPRINT_LINE
        .captures(output)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| FingerprintError::Unparseable(output.trim().to_string()))?;

    let fingerprint = raw.replace(':', "").to_lowercase();
    if fingerprint.is_empty() || !fingerprint.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FingerprintError::Unparseable(raw.to_string()));
    }

    Ok(fingerprint)
}

/// Run `operation` against `cert_path` and parse its output
pub fn certificate_id(
    operation: &dyn FingerprintOperation,
    cert_path: &Path,
) -> Result<String, FingerprintError> {
    let output = operation.fingerprint_output(cert_path)?;
    parse_fingerprint(&output)
}
