//! Server-side handle for one live duplex channel to a participant
//!
//! A handle never touches the transport itself. Every outbound frame is pushed
//! onto the connection's own queue and a single writer task drains that queue
//! into the socket, so two concurrent writers can never interleave a frame and
//! a slow socket only ever delays its own queue.

use log::debug;
use shared::ServerMessage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Server-assigned identity of a connection, unique for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Work items consumed by a connection's writer task
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// A fully serialized frame, shared between every recipient of a broadcast
    Text(Arc<str>),
    /// Flush what is queued, then close the transport
    Close,
}

#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    /// Creates a handle plus the receiving end its writer task must drain
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        (Self { id, sender }, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues an already serialized frame.
    ///
    /// Returns false once the writer side is gone; the reader loop of that
    /// connection is responsible for the disconnect path.
    pub fn send_raw(&self, payload: Arc<str>) -> bool {
        if self.sender.send(Outbound::Text(payload)).is_err() {
            debug!("Dropping frame for closed connection {}", self.id);
            return false;
        }
        true
    }

    /// Serializes and queues a single message for this connection only
    pub fn send(&self, message: &ServerMessage) -> bool {
        match crate::fanout::encode(message) {
            Some(payload) => self.send_raw(payload),
            None => false,
        }
    }

    /// Asks the writer task to close the transport after draining the queue
    pub fn close(&self) {
        let _ = self.sender.send(Outbound::Close);
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}
