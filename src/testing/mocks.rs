//! Mock implementations for testing
//!
//! Provides a mock MQTT capability, a recording log sink and a canned
//! fingerprint operation so the client wrapper can be exercised without a
//! broker, an openssl binary or a tracing subscriber.

use crate::harness::fingerprint::{FingerprintError, FingerprintOperation};
use crate::observability::EventLog;
use crate::transport::mqtt::{ConnectionConfig, MqttError};
use crate::transport::{ClientEvent, EventHandler, EventPayload, MqttConnection, MqttConnector};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Output of `openssl x509 -fingerprint -sha256` for the fixture certificate
pub const SAMPLE_FINGERPRINT_OUTPUT: &str = "sha256 Fingerprint=B1:14:32:88:70:39:D2:A0:D9:F7:15:01:B4:CC:56:14:D9:53:FD:28:6C:6B:C0:69:34:F0:62:B3:ED:B1:9C:BA";

/// Certificate id derived from [`SAMPLE_FINGERPRINT_OUTPUT`]
pub const SAMPLE_CERTIFICATE_ID: &str =
    "b11432887039d2a0d9f71501b4cc5614d953fd286c6bc06934f062b3edb19cba";

pub type PublishedMessage = (String, String);

/// State shared by a mock connector and every connection it hands out
#[derive(Default)]
pub struct MockConnectionState {
    pub connected: AtomicBool,
    pub fail_operations: AtomicBool,
    pub subscribe_calls: Mutex<Vec<Vec<String>>>,
    pub publish_calls: Mutex<Vec<PublishedMessage>>,
    pub end_calls: AtomicUsize,
    pub handlers: Mutex<Vec<(ClientEvent, EventHandler)>>,
}

/// Mock MQTT connector for testing
#[derive(Clone, Default)]
pub struct MockConnector {
    pub state: Arc<MockConnectionState>,
    pub connect_calls: Arc<Mutex<Vec<(String, ConnectionConfig)>>>,
    pub should_fail: bool,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Make subscribe and publish reject from now on
    pub fn fail_operations(&self) {
        self.state.fail_operations.store(true, Ordering::SeqCst);
    }

    /// Flip the `connected` flag the live connection reports
    pub fn set_connected(&self, connected: bool) {
        self.state.connected.store(connected, Ordering::SeqCst);
    }

    pub fn get_connect_calls(&self) -> Vec<(String, ConnectionConfig)> {
        self.connect_calls.lock().unwrap().clone()
    }

    pub fn get_subscribe_calls(&self) -> Vec<Vec<String>> {
        self.state.subscribe_calls.lock().unwrap().clone()
    }

    pub fn get_publish_calls(&self) -> Vec<PublishedMessage> {
        self.state.publish_calls.lock().unwrap().clone()
    }

    pub fn end_calls(&self) -> usize {
        self.state.end_calls.load(Ordering::SeqCst)
    }

    /// Events with a registered handler, in registration order
    pub fn registered_events(&self) -> Vec<ClientEvent> {
        self.state
            .handlers
            .lock()
            .unwrap()
            .iter()
            .map(|(event, _)| *event)
            .collect()
    }

    /// Invoke every handler registered for `event` with `payload`
    pub fn trigger(&self, event: ClientEvent, payload: EventPayload) {
        let handlers = self
            .state
            .handlers
            .lock()
            .unwrap()
            .iter()
            .filter(|(registered, _)| *registered == event)
            .map(|(_, handler)| handler.clone())
            .collect::<Vec<_>>();

        for handler in handlers {
            handler(&payload);
        }
    }

    pub fn clear_history(&self) {
        self.connect_calls.lock().unwrap().clear();
        self.state.subscribe_calls.lock().unwrap().clear();
        self.state.publish_calls.lock().unwrap().clear();
        self.state.end_calls.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl MqttConnector for MockConnector {
    async fn connect(
        &self,
        uri: &str,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn MqttConnection>, MqttError> {
        self.connect_calls
            .lock()
            .unwrap()
            .push((uri.to_string(), config.clone()));

        if self.should_fail {
            return Err(MqttError::ConnectionFailed(
                "Mock connection failure".into(),
            ));
        }

        self.state.connected.store(true, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            state: self.state.clone(),
        }))
    }
}

/// Mock live connection
pub struct MockConnection {
    state: Arc<MockConnectionState>,
}

#[async_trait]
impl MqttConnection for MockConnection {
    async fn subscribe(&self, topics: &[String]) -> Result<(), MqttError> {
        self.state
            .subscribe_calls
            .lock()
            .unwrap()
            .push(topics.to_vec());

        if self.state.fail_operations.load(Ordering::SeqCst) {
            return Err(MqttError::SubscriptionFailed(
                "Mock subscription failure".into(),
            ));
        }
        Ok(())
    }

    async fn publish(&self, topic: &str, message: &str) -> Result<(), MqttError> {
        self.state
            .publish_calls
            .lock()
            .unwrap()
            .push((topic.to_string(), message.to_string()));

        if self.state.fail_operations.load(Ordering::SeqCst) {
            return Err(MqttError::PublishFailed("Mock publish failure".into()));
        }
        Ok(())
    }

    fn end(&self) {
        self.state.end_calls.fetch_add(1, Ordering::SeqCst);
        self.state.connected.store(false, Ordering::SeqCst);
    }

    fn on(&self, event: ClientEvent, handler: EventHandler) {
        self.state.handlers.lock().unwrap().push((event, handler));
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }
}

/// Log sink that records every `(message, detail)` pair
#[derive(Debug, Default)]
pub struct RecordingLog {
    entries: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, Option<String>)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|(message, _)| message)
            .collect()
    }

    /// Check if `(message, detail)` was logged
    pub fn contains(&self, message: &str, detail: Option<&str>) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|(m, d)| m == message && d.as_deref() == detail)
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl EventLog for RecordingLog {
    fn log(&self, message: &str, detail: Option<&str>) {
        self.entries
            .lock()
            .unwrap()
            .push((message.to_string(), detail.map(str::to_string)));
    }
}

/// Fingerprint operation returning canned output
#[derive(Debug, Default)]
pub struct StaticFingerprint {
    output: Option<String>,
    calls: Mutex<Vec<PathBuf>>,
}

impl StaticFingerprint {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Output of the fixture certificate
    pub fn sample() -> Self {
        Self::new(SAMPLE_FINGERPRINT_OUTPUT)
    }

    /// Operation that fails as if openssl exited non-zero
    pub fn failing() -> Self {
        Self::default()
    }

    /// Certificate paths the operation was run against
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

impl FingerprintOperation for StaticFingerprint {
    fn fingerprint_output(&self, cert_path: &Path) -> Result<String, FingerprintError> {
        self.calls.lock().unwrap().push(cert_path.to_path_buf());
        self.output
            .clone()
            .ok_or_else(|| FingerprintError::CommandFailed {
                status: "exit status: 1".to_string(),
                stderr: "unable to load certificate".to_string(),
            })
    }
}
