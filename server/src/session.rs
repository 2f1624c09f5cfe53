//! Per-connection protocol handling
//!
//! A `Session` is created for every persistent connection. It turns inbound
//! text frames into coordinator calls and remembers which room the
//! connection joined. Frames that fail to decode are dropped without
//! closing the connection.

use crate::connection::ConnectionHandle;
use crate::coordinator::{Actor, Coordinator};
use crate::error::CoordinatorError;
use crate::registry::Participant;
use log::{debug, warn};
use shared::{ClientMessage, ServerMessage, DEFAULT_ROOM};

/// What the reader loop should do after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

pub struct Session {
    coordinator: Coordinator,
    handle: ConnectionHandle,
    room: Option<String>,
}

impl Session {
    pub fn new(coordinator: Coordinator, handle: ConnectionHandle) -> Self {
        Self {
            coordinator,
            handle,
            room: None,
        }
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Room this connection is currently a member of
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub async fn handle_text(&mut self, text: &str) -> Flow {
        match ClientMessage::decode(text) {
            Some(message) => self.handle_message(message).await,
            None => {
                debug!("Ignoring undecodable frame from {}", self.handle.id());
                Flow::Continue
            }
        }
    }

    pub async fn handle_message(&mut self, message: ClientMessage) -> Flow {
        match message {
            ClientMessage::Resume {
                player_id,
                name,
                room,
            } => self.resume(player_id, name, room).await,

            ClientMessage::Who { room } => {
                let room = room
                    .filter(|room| !room.is_empty())
                    .or_else(|| self.room.clone())
                    .unwrap_or_default();
                let list = self.coordinator.roster(&room).await;
                self.handle.send(&ServerMessage::Players { list });
                Flow::Continue
            }

            ClientMessage::SubscribeLogs => {
                let room = self.room.as_deref().unwrap_or_default();
                self.handle.send(&ServerMessage::server_log(format!(
                    "Subscribed to server logs for room {}",
                    room
                )));
                Flow::Continue
            }

            ClientMessage::Roll => {
                if let Some(room) = &self.room {
                    if let Err(e) = self
                        .coordinator
                        .roll(room, Actor::Connection(&self.handle))
                        .await
                    {
                        debug!("Roll from {} refused: {}", self.handle.id(), e);
                    }
                }
                Flow::Continue
            }

            ClientMessage::Leave => Flow::Close,

            ClientMessage::Ping | ClientMessage::Unknown => Flow::Continue,
        }
    }

    async fn resume(&mut self, player_id: String, name: String, room: String) -> Flow {
        let room = if room.is_empty() {
            self.room
                .clone()
                .unwrap_or_else(|| DEFAULT_ROOM.to_string())
        } else {
            room
        };

        // Switching rooms goes through the regular leave path first
        if let Some(current) = self.room.take() {
            if current != room {
                self.coordinator.leave(&self.handle, &current).await;
            }
        }

        let participant = Participant::new(player_id, name, room.clone());
        match self.coordinator.join(&self.handle, participant).await {
            Ok(()) => {
                self.room = Some(room);
                Flow::Continue
            }
            Err(e @ CoordinatorError::RoomFull { .. }) => {
                warn!("Connection {} turned away: {}", self.handle.id(), e);
                self.handle.send(&ServerMessage::event(e.public_message()));
                self.handle.close();
                Flow::Close
            }
            Err(e) => {
                warn!("Join from {} failed: {}", self.handle.id(), e);
                Flow::Continue
            }
        }
    }

    /// Runs the leave path for whatever room this connection was in
    pub async fn disconnect(&mut self) -> bool {
        match self.room.take() {
            Some(room) => self.coordinator.leave(&self.handle, &room).await,
            None => false,
        }
    }
}
