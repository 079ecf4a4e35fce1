//! Impure I/O operations for the MQTT capability
//!
//! This module handles network communication and async coordination with
//! the rumqttc v5 client: establishing the connection, driving the event
//! loop on a spawned task, and dispatching events to registered handlers.

use super::connection::{configure_mqtt_options, ConnectionConfig, MqttError};
use super::message_handler::{
    connack_outcome, is_outgoing_disconnect, route_event, server_disconnect_events,
};
use crate::transport::{ClientEvent, EventHandler, EventPayload, MqttConnection, MqttConnector};
use async_trait::async_trait;
use rumqttc::v5::mqttbytes::v5::Filter;
use rumqttc::v5::{mqttbytes::QoS, AsyncClient, EventLoop};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the rumqttc request channel
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Handlers registered per event, invoked in registration order
#[derive(Default)]
struct HandlerRegistry {
    handlers: HashMap<ClientEvent, Vec<EventHandler>>,
}

impl HandlerRegistry {
    fn register(&mut self, event: ClientEvent, handler: EventHandler) {
        self.handlers.entry(event).or_default().push(handler);
    }

    fn dispatch(&self, event: ClientEvent, payload: &EventPayload) {
        if let Some(handlers) = self.handlers.get(&event) {
            for handler in handlers {
                handler(payload);
            }
        }
    }
}

/// State shared between a connection handle and its event loop driver
#[derive(Default)]
struct SharedState {
    connected: AtomicBool,
    ending: AtomicBool,
    registry: RwLock<HandlerRegistry>,
}

impl SharedState {
    fn dispatch(&self, event: ClientEvent, payload: EventPayload) {
        match self.registry.read() {
            Ok(registry) => registry.dispatch(event, &payload),
            Err(poisoned) => poisoned.into_inner().dispatch(event, &payload),
        }
    }
}

/// Production MQTT capability backed by rumqttc
#[derive(Debug, Default, Clone)]
pub struct RumqttcConnector;

impl RumqttcConnector {
    pub fn new() -> Self {
        Self
    }

    /// Poll until the broker answers the CONNECT
    ///
    /// rumqttc only opens the socket once the event loop is polled, so the
    /// first CONNACK is the earliest point a connection is known to be up.
    async fn wait_for_connack(event_loop: &mut EventLoop) -> Result<(), MqttError> {
        loop {
            let event = event_loop
                .poll()
                .await
                .map_err(|e| MqttError::ConnectionFailed(Box::new(e)))?;

            if let Some(outcome) = connack_outcome(&event) {
                return outcome.map_err(MqttError::ConnectionRefused);
            }
            debug!(target: "mqtt_transport", "Pre-CONNACK event: {:?}", event);
        }
    }
}

#[async_trait]
impl MqttConnector for RumqttcConnector {
    async fn connect(
        &self,
        uri: &str,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn MqttConnection>, MqttError> {
        let mqtt_options = configure_mqtt_options(uri, config)?;
        let (client, mut event_loop) = AsyncClient::new(mqtt_options, REQUEST_CHANNEL_CAPACITY);

        Self::wait_for_connack(&mut event_loop).await?;
        info!(client_id = %config.client_id, uri = %uri, "MQTT CONNACK received");

        let state = Arc::new(SharedState::default());
        state.connected.store(true, Ordering::SeqCst);

        let driver = tokio::spawn(drive_event_loop(event_loop, state.clone()));

        Ok(Box::new(RumqttcConnection {
            client,
            state,
            driver,
        }))
    }
}

/// Run the event loop until the connection goes away
///
/// Automatic reconnect is disabled: rumqttc would reconnect on the next poll
/// after an error, so the driver stops at the first one. A broker DISCONNECT
/// arrives as such an error and is reported as `Disconnect`, not `Error`.
async fn drive_event_loop(mut event_loop: EventLoop, state: Arc<SharedState>) {
    loop {
        match event_loop.poll().await {
            Ok(event) => {
                for (client_event, payload) in route_event(&event) {
                    if client_event == ClientEvent::Disconnect {
                        state.connected.store(false, Ordering::SeqCst);
                    }
                    state.dispatch(client_event, payload);
                }

                if is_outgoing_disconnect(&event) && state.ending.load(Ordering::SeqCst) {
                    finish(&state, true);
                    break;
                }
            }
            Err(e) => {
                let ending = state.ending.load(Ordering::SeqCst);
                if let Some(routed) = server_disconnect_events(&e) {
                    info!(target: "mqtt_transport", "Broker closed the connection: {}", e);
                    state.connected.store(false, Ordering::SeqCst);
                    for (client_event, payload) in routed {
                        state.dispatch(client_event, payload);
                    }
                } else if !ending {
                    warn!(target: "mqtt_transport", "MQTT event loop error: {}", e);
                    state.dispatch(ClientEvent::Error, EventPayload::Error(e.to_string()));
                }
                finish(&state, ending);
                break;
            }
        }
    }
    debug!(target: "mqtt_transport", "MQTT event loop stopped");
}

fn finish(state: &SharedState, ended: bool) {
    state.connected.store(false, Ordering::SeqCst);
    state.dispatch(ClientEvent::Close, EventPayload::Close);
    if ended {
        state.dispatch(ClientEvent::End, EventPayload::End);
    }
}

/// Live rumqttc connection
pub struct RumqttcConnection {
    client: AsyncClient,
    state: Arc<SharedState>,
    driver: JoinHandle<()>,
}

#[async_trait]
impl MqttConnection for RumqttcConnection {
    async fn subscribe(&self, topics: &[String]) -> Result<(), MqttError> {
        let filters = topics
            .iter()
            .map(|topic| Filter::new(topic.clone(), QoS::AtMostOnce))
            .collect::<Vec<_>>();

        self.client
            .subscribe_many(filters)
            .await
            .map_err(|e| MqttError::SubscriptionFailed(Box::new(e)))
    }

    async fn publish(&self, topic: &str, message: &str) -> Result<(), MqttError> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, message.as_bytes().to_vec())
            .await
            .map_err(|e| MqttError::PublishFailed(Box::new(e)))
    }

    fn end(&self) {
        self.state.ending.store(true, Ordering::SeqCst);
        if let Err(e) = self.client.try_disconnect() {
            // Request channel is gone, the driver has already stopped
            warn!(target: "mqtt_transport", "Failed to queue DISCONNECT: {}", e);
            self.state.connected.store(false, Ordering::SeqCst);
            self.state.dispatch(ClientEvent::End, EventPayload::End);
        }
    }

    fn on(&self, event: ClientEvent, handler: EventHandler) {
        match self.state.registry.write() {
            Ok(mut registry) => registry.register(event, handler),
            Err(poisoned) => poisoned.into_inner().register(event, handler),
        }
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }
}

impl Drop for RumqttcConnection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
