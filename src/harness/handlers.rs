//! Protocol event handlers
//!
//! Stateless functions registered on every successful connect. Each one turns
//! a raw event payload into log lines and nothing else.

use crate::observability::EventLog;
use crate::transport::{ClientEvent, EventPayload};

pub const PACKET_RECEIVED: &str = "Packet received:";
pub const CLIENT_ERROR: &str = "Client error:";
pub const CONNECTION_CLOSED: &str = "Connection closed.";
pub const CLIENT_DISCONNECTED: &str = "Client disconnected.";
pub const DISCONNECT_REASON: &str = "Reason:";
pub const CLIENT_ENDED: &str = "Client ended.";

/// Log line for an incoming application message
pub fn received_message_line(topic: &str, payload: &[u8]) -> String {
    format!(
        " <--   Received on topic {topic}: {}",
        String::from_utf8_lossy(payload)
    )
}

/// Handler for packet send and packet receive events
pub fn on_packet(log: &dyn EventLog, payload: &EventPayload, log_packets: bool) {
    if let (true, EventPayload::Packet(packet)) = (log_packets, payload) {
        log.log(PACKET_RECEIVED, Some(packet.as_str()));
    }
}

/// Handler for 'message' events
pub fn on_message(log: &dyn EventLog, payload: &EventPayload) {
    if let EventPayload::Message { topic, payload } = payload {
        log.log(&received_message_line(topic, payload), None);
    }
}

/// Handler for 'error' events
pub fn on_error(log: &dyn EventLog, payload: &EventPayload) {
    if let EventPayload::Error(message) = payload {
        log.log(CLIENT_ERROR, Some(message.as_str()));
    }
}

/// Handler for 'close' events
pub fn on_close(log: &dyn EventLog, _payload: &EventPayload) {
    log.log(CONNECTION_CLOSED, None);
}

/// Handler for 'disconnect' events
pub fn on_disconnect(log: &dyn EventLog, payload: &EventPayload) {
    log.log(CLIENT_DISCONNECTED, None);
    if let EventPayload::Disconnect {
        reason: Some(reason),
    } = payload
    {
        log.log(DISCONNECT_REASON, Some(reason.as_str()));
    }
}

/// Handler for 'end' events
pub fn on_end(log: &dyn EventLog, _payload: &EventPayload) {
    log.log(CLIENT_ENDED, None);
}

/// Route `payload` to the handler for `event`
pub fn handle(log: &dyn EventLog, event: ClientEvent, payload: &EventPayload, log_packets: bool) {
    match event {
        ClientEvent::PacketReceive | ClientEvent::PacketSend => {
            on_packet(log, payload, log_packets)
        }
        ClientEvent::Message => on_message(log, payload),
        ClientEvent::Error => on_error(log, payload),
        ClientEvent::Close => on_close(log, payload),
        ClientEvent::Disconnect => on_disconnect(log, payload),
        ClientEvent::End => on_end(log, payload),
    }
}
