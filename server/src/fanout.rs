//! Broadcast fan-out
//!
//! A message is serialized once and the resulting frame is shared by every
//! recipient. Handing a frame to a connection only enqueues it, so one broken
//! or slow member never holds up delivery to the others.

use crate::connection::ConnectionHandle;
use log::error;
use shared::ServerMessage;
use std::sync::Arc;

/// Serializes an outbound message into a shareable text frame
pub fn encode(message: &ServerMessage) -> Option<Arc<str>> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Arc::from(text)),
        Err(e) => {
            error!("Failed to serialize {:?}: {}", message, e);
            None
        }
    }
}

/// Hands one frame to every recipient and returns how many accepted it
pub fn deliver(recipients: &[ConnectionHandle], payload: &Arc<str>) -> usize {
    recipients
        .iter()
        .filter(|handle| handle.send_raw(Arc::clone(payload)))
        .count()
}

/// Outbound work produced by one state transition
#[derive(Debug)]
pub enum Delivery {
    Send {
        to: ConnectionHandle,
        payload: Arc<str>,
    },
    Broadcast {
        to: Vec<ConnectionHandle>,
        payload: Arc<str>,
    },
}

/// Deliveries collected while the state lock is held, flushed in order
#[derive(Debug, Default)]
pub struct Outbox {
    deliveries: Vec<Delivery>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, to: &ConnectionHandle, message: &ServerMessage) {
        if let Some(payload) = encode(message) {
            self.deliveries.push(Delivery::Send {
                to: to.clone(),
                payload,
            });
        }
    }

    pub fn broadcast(&mut self, to: Vec<ConnectionHandle>, message: &ServerMessage) {
        if to.is_empty() {
            return;
        }
        if let Some(payload) = encode(message) {
            self.deliveries.push(Delivery::Broadcast { to, payload });
        }
    }

    /// Enqueues every delivery onto its connections, preserving order
    pub fn flush(self) {
        for delivery in self.deliveries {
            match delivery {
                Delivery::Send { to, payload } => {
                    to.send_raw(payload);
                }
                Delivery::Broadcast { to, payload } => {
                    deliver(&to, &payload);
                }
            }
        }
    }
}
