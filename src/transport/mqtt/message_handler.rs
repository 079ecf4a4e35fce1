//! Pure translation of rumqttc events into client events
//!
//! The event loop driver calls [`route_event`] for every polled event and
//! dispatches the result to the registered handlers. A broker DISCONNECT
//! surfaces as a poll error instead, see [`server_disconnect_events`].

use crate::transport::{ClientEvent, EventPayload};
use rumqttc::v5::mqttbytes::v5::{ConnectReturnCode, Packet};
use rumqttc::v5::{ConnectionError, Event, StateError};
use rumqttc::Outgoing;

/// Map one rumqttc event to the client events it produces (pure function)
///
/// Every incoming packet yields a `PacketReceive`, every outgoing one a
/// `PacketSend`. PUBLISH additionally yields a `Message`.
pub fn route_event(event: &Event) -> Vec<(ClientEvent, EventPayload)> {
    match event {
        Event::Incoming(packet) => {
            let mut routed = vec![(
                ClientEvent::PacketReceive,
                EventPayload::Packet(format!("{packet:?}")),
            )];
            if let Packet::Publish(publish) = packet {
                routed.push((
                    ClientEvent::Message,
                    EventPayload::Message {
                        topic: String::from_utf8_lossy(&publish.topic).to_string(),
                        payload: publish.payload.clone(),
                    },
                ));
            }
            routed
        }
        Event::Outgoing(outgoing) => vec![(
            ClientEvent::PacketSend,
            EventPayload::Packet(format!("{outgoing:?}")),
        )],
    }
}

/// Client events for a DISCONNECT sent by the broker (pure function)
///
/// rumqttc rejects an incoming DISCONNECT with
/// `StateError::ServerDisconnect` before queueing it as an event. Returns
/// `None` for every other poll error.
pub fn server_disconnect_events(
    error: &ConnectionError,
) -> Option<Vec<(ClientEvent, EventPayload)>> {
    match error {
        ConnectionError::MqttState(StateError::ServerDisconnect {
            reason_code,
            reason_string,
        }) => Some(vec![
            (
                ClientEvent::PacketReceive,
                EventPayload::Packet(format!(
                    "Disconnect {{ reason_code: {reason_code:?}, reason_string: {reason_string:?} }}"
                )),
            ),
            (
                ClientEvent::Disconnect,
                EventPayload::Disconnect {
                    reason: reason_string.clone(),
                },
            ),
        ]),
        _ => None,
    }
}

/// Outcome of a CONNACK seen while establishing the connection
pub fn connack_outcome(event: &Event) -> Option<Result<(), String>> {
    match event {
        Event::Incoming(Packet::ConnAck(connack)) => Some(match connack.code {
            ConnectReturnCode::Success => Ok(()),
            code => Err(format!("{code:?}")),
        }),
        _ => None,
    }
}

/// Check if the event is the DISCONNECT we sent ourselves
pub fn is_outgoing_disconnect(event: &Event) -> bool {
    matches!(event, Event::Outgoing(Outgoing::Disconnect))
}
