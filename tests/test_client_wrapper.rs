//! Client wrapper behavior tests
//!
//! Exercises construction, connect, subscribe, publish and end against the
//! mock MQTT capability and checks the resulting log lines.


use awsiot_harness::error::HarnessError;
use awsiot_harness::harness::{ClientWrapper, FingerprintError};
use awsiot_harness::testing::{
    MockConnector, RecordingLog, StaticFingerprint, SAMPLE_CERTIFICATE_ID,
};
use awsiot_harness::transport::mqtt::ConnectionConfig;
use awsiot_harness::transport::ClientEvent;
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{build_wrapper, credential_fixture, TEST_CA, TEST_CERT, TEST_KEY};

#[test]
fn test_constructor_builds_connection_config() {
    let fixture = credential_fixture();
    let (wrapper, _log) = build_wrapper(MockConnector::new(), fixture.options.clone());

    let expected = ConnectionConfig {
        port: 443,
        alpn_protocols: vec!["x-amzn-mqtt-ca".to_string()],
        protocol_version: 5,
        protocol: "mqtts".to_string(),
        client_id: "clientId".to_string(),
        key: TEST_KEY.to_vec(),
        cert: TEST_CERT.to_vec(),
        ca: TEST_CA.to_vec(),
        clean: true,
        reconnect_period: Duration::ZERO,
    };
    assert_eq!(wrapper.config(), &expected);
    assert!(!wrapper.config().reconnect_enabled());
    assert_eq!(wrapper.client_id(), "clientId");
    assert_eq!(wrapper.subscription_topics(), ["topic1", "topic2"]);
}

#[test]
fn test_constructor_computes_certificate_id() {
    let fixture = credential_fixture();
    let log = Arc::new(RecordingLog::new());
    let fingerprint = StaticFingerprint::sample();

    let wrapper = ClientWrapper::new(
        MockConnector::new(),
        fixture.options.clone(),
        &fingerprint,
        log.clone(),
    )
    .unwrap();

    assert_eq!(wrapper.certificate_id(), SAMPLE_CERTIFICATE_ID);
    assert_eq!(fingerprint.calls(), vec![fixture.options.cert_path.clone()]);
}

#[test]
fn test_constructor_logs_initialization() {
    let fixture = credential_fixture();
    let (wrapper, log) = build_wrapper(MockConnector::new(), fixture.options.clone());

    let messages = log.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], "Initializing new AWS IoT client instance");
    assert_eq!(messages[1], wrapper.config_summary());
    assert_eq!(messages[2], "Initialized new AWS IoT client instance");

    let summary = &messages[1];
    assert!(summary.contains(&format!("Certificate id: {SAMPLE_CERTIFICATE_ID}")));
    assert!(summary.contains("Client id: clientId"));
    assert!(summary.contains("MQTT version: 5"));
    assert!(summary.contains("Protocol: mqtts"));
    assert!(summary.contains("Port: 443"));
    assert!(summary.contains("Clean session: true"));
    assert!(summary.contains("Reconnect period: 0"));
}

#[test]
fn test_constructor_fails_on_missing_credential_file() {
    let fixture = credential_fixture();
    let mut options = fixture.options.clone();
    options.ca_path = fixture.dir.path().join("missing-ca.pem");

    let result = ClientWrapper::new(
        MockConnector::new(),
        options,
        &StaticFingerprint::sample(),
        Arc::new(RecordingLog::new()),
    );

    match result {
        Err(HarnessError::CredentialLoad { path, .. }) => {
            assert!(path.ends_with("missing-ca.pem"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("construction should fail"),
    }
}

#[test]
fn test_constructor_fails_when_fingerprint_fails() {
    let fixture = credential_fixture();

    let result = ClientWrapper::new(
        MockConnector::new(),
        fixture.options.clone(),
        &StaticFingerprint::failing(),
        Arc::new(RecordingLog::new()),
    );

    assert!(matches!(
        result,
        Err(HarnessError::Fingerprint(FingerprintError::CommandFailed { .. }))
    ));
}

#[test]
fn test_constructor_fails_on_unparseable_fingerprint() {
    let fixture = credential_fixture();

    let result = ClientWrapper::new(
        MockConnector::new(),
        fixture.options.clone(),
        &StaticFingerprint::new("unable to load certificate"),
        Arc::new(RecordingLog::new()),
    );

    assert!(matches!(
        result,
        Err(HarnessError::Fingerprint(FingerprintError::Unparseable(_)))
    ));
}

#[tokio::test]
async fn test_connect_uses_mqtts_uri_and_config() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (mut wrapper, log) = build_wrapper(connector.clone(), fixture.options.clone());

    wrapper.connect("test").await;

    let calls = connector.get_connect_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "mqtts://test");
    assert_eq!(&calls[0].1, wrapper.config());
    assert!(wrapper.is_connected());
    assert!(log.contains("Connected to AWS IoT broker:", Some("test")));
}

#[tokio::test]
async fn test_connect_registers_seven_handlers_in_order() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (mut wrapper, _log) = build_wrapper(connector.clone(), fixture.options.clone());

    wrapper.connect("test").await;

    assert_eq!(connector.registered_events(), ClientEvent::ALL.to_vec());
}

#[tokio::test]
async fn test_connect_failure_is_logged_not_raised() {
    let fixture = credential_fixture();
    let connector = MockConnector::with_failure();
    let (mut wrapper, log) = build_wrapper(connector.clone(), fixture.options.clone());

    wrapper.connect("test").await;

    assert!(!wrapper.is_connected());
    assert!(connector.registered_events().is_empty());
    assert!(log.contains(
        "Connection error:",
        Some("Connection failed: Mock connection failure")
    ));

    // No handle was stored, so the guarded operations skip
    log.clear();
    wrapper.subscribe().await;
    assert_eq!(
        log.messages(),
        vec!["Client not connected, skipping subscription attempt"]
    );
}

#[tokio::test]
async fn test_reconnect_replaces_handle() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (mut wrapper, _log) = build_wrapper(connector.clone(), fixture.options.clone());

    wrapper.connect("test").await;
    wrapper.end();
    assert!(!wrapper.is_connected());

    wrapper.connect("test").await;
    assert!(wrapper.is_connected());
    assert_eq!(connector.get_connect_calls().len(), 2);
}

#[tokio::test]
async fn test_subscribe_when_connected() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (mut wrapper, log) = build_wrapper(connector.clone(), fixture.options.clone());
    wrapper.connect("test").await;
    log.clear();

    wrapper.subscribe().await;

    assert_eq!(
        connector.get_subscribe_calls(),
        vec![vec!["topic1".to_string(), "topic2".to_string()]]
    );
    assert_eq!(
        log.entries(),
        vec![
            (
                "Subscribing to topics:".to_string(),
                Some(r#"["topic1","topic2"]"#.to_string())
            ),
            (
                "Successfully subscribed to:".to_string(),
                Some(r#"["topic1","topic2"]"#.to_string())
            ),
        ]
    );
}

#[tokio::test]
async fn test_subscribe_skipped_when_disconnected() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (mut wrapper, log) = build_wrapper(connector.clone(), fixture.options.clone());
    wrapper.connect("test").await;
    connector.set_connected(false);
    log.clear();

    wrapper.subscribe().await;

    assert!(connector.get_subscribe_calls().is_empty());
    assert_eq!(
        log.messages(),
        vec!["Client not connected, skipping subscription attempt"]
    );
}

#[tokio::test]
async fn test_subscribe_failure_is_logged() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (mut wrapper, log) = build_wrapper(connector.clone(), fixture.options.clone());
    wrapper.connect("test").await;
    connector.fail_operations();

    wrapper.subscribe().await;

    assert!(log.contains(
        "Subscription failed: ",
        Some("Subscription failed: Mock subscription failure")
    ));
    assert!(!log.messages().iter().any(|m| m == "Successfully subscribed to:"));
}

#[tokio::test]
async fn test_publish_when_connected() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (mut wrapper, log) = build_wrapper(connector.clone(), fixture.options.clone());
    wrapper.connect("test").await;
    log.clear();

    wrapper.publish("topic", "message").await;

    assert_eq!(
        connector.get_publish_calls(),
        vec![("topic".to_string(), "message".to_string())]
    );
    assert_eq!(
        log.messages(),
        vec![" -->   Message published on topic topic. Message: message"]
    );
}

#[tokio::test]
async fn test_publish_skipped_when_never_connected() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (wrapper, log) = build_wrapper(connector.clone(), fixture.options.clone());
    log.clear();

    wrapper.publish("topic", "message").await;

    assert!(connector.get_publish_calls().is_empty());
    assert_eq!(
        log.messages(),
        vec!["Client not connected, skipping sending message"]
    );
}

#[tokio::test]
async fn test_publish_failure_is_logged() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (mut wrapper, log) = build_wrapper(connector.clone(), fixture.options.clone());
    wrapper.connect("test").await;
    connector.fail_operations();
    log.clear();

    wrapper.publish("topic", "message").await;

    assert_eq!(
        log.entries(),
        vec![(
            "Publish failed: ".to_string(),
            Some("Publishing failed: Mock publish failure".to_string())
        )]
    );
}

#[tokio::test]
async fn test_end_when_connected() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (mut wrapper, _log) = build_wrapper(connector.clone(), fixture.options.clone());
    wrapper.connect("test").await;

    wrapper.end();

    assert_eq!(connector.end_calls(), 1);
    assert!(!wrapper.is_connected());
}

#[tokio::test]
async fn test_end_twice_is_noop() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (mut wrapper, _log) = build_wrapper(connector.clone(), fixture.options.clone());
    wrapper.connect("test").await;

    wrapper.end();
    wrapper.end();

    assert_eq!(connector.end_calls(), 1);
}

#[test]
fn test_end_without_connection_is_noop() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (wrapper, _log) = build_wrapper(connector.clone(), fixture.options.clone());

    wrapper.end();

    assert_eq!(connector.end_calls(), 0);
}

#[tokio::test]
async fn test_end_skipped_when_handle_reports_disconnected() {
    let fixture = credential_fixture();
    let connector = MockConnector::new();
    let (mut wrapper, _log) = build_wrapper(connector.clone(), fixture.options.clone());
    wrapper.connect("test").await;
    connector.set_connected(false);

    wrapper.end();

    assert_eq!(connector.end_calls(), 0);
}
