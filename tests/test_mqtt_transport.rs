//! rumqttc transport tests that need no broker
//!
//! Covers option building and the failure paths of the production connector.


use awsiot_harness::harness::ClientWrapper;
use awsiot_harness::testing::{RecordingLog, StaticFingerprint};
use awsiot_harness::transport::mqtt::{
    configure_mqtt_options, ConnectionConfig, Credentials, MqttError, RumqttcConnector,
};
use awsiot_harness::transport::MqttConnector;
use std::sync::Arc;
use std::time::Duration;
use test_helpers::credential_fixture;

fn test_config() -> ConnectionConfig {
    ConnectionConfig::new(
        "clientId",
        Credentials {
            key: b"key".to_vec(),
            cert: b"cert".to_vec(),
            ca: b"ca".to_vec(),
        },
    )
}

#[test]
fn test_options_use_endpoint_host_and_config_port() {
    let options =
        configure_mqtt_options("mqtts://abc-ats.iot.us-east-1.amazonaws.com", &test_config())
            .unwrap();

    assert_eq!(
        options.broker_address(),
        ("abc-ats.iot.us-east-1.amazonaws.com".to_string(), 443)
    );
    assert_eq!(options.client_id(), "clientId");
    assert_eq!(options.keep_alive(), Duration::from_secs(60));
}

#[test]
fn test_options_reject_plain_mqtt() {
    let result = configure_mqtt_options("mqtt://localhost", &test_config());
    assert!(matches!(result, Err(MqttError::InvalidBrokerUrl(_))));
}

#[tokio::test]
async fn test_connector_rejects_invalid_uri_before_network() {
    let result = RumqttcConnector::new()
        .connect("not a uri", &test_config())
        .await;
    assert!(matches!(result, Err(MqttError::InvalidBrokerUrl(_))));
}

#[tokio::test]
async fn test_connector_reports_unreachable_broker() {
    let mut config = test_config();
    // Nothing listens on port 1
    config.port = 1;

    let result = RumqttcConnector::new()
        .connect("mqtts://127.0.0.1", &config)
        .await;
    assert!(matches!(result, Err(MqttError::ConnectionFailed(_))));
}

#[tokio::test]
async fn test_wrapper_absorbs_invalid_endpoint() {
    let fixture = credential_fixture();
    let log = Arc::new(RecordingLog::new());
    let mut wrapper = ClientWrapper::new(
        RumqttcConnector::new(),
        fixture.options.clone(),
        &StaticFingerprint::sample(),
        log.clone(),
    )
    .unwrap();

    // An empty endpoint leaves the URI without a host
    wrapper.connect("").await;

    assert!(!wrapper.is_connected());
    assert_eq!(log.messages().last().map(String::as_str), Some("Connection error:"));
}
