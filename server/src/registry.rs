//! Room membership and roster ordering
//!
//! This module owns the set of live connections per room:
//! - Lazy room creation on first join, removal when the last member leaves
//! - Capacity enforcement per room
//! - Deterministic roster ordering shared by roster display and turn rotation
//!
//! The registry itself holds no lock. It lives inside the coordinator's state
//! and is only ever touched under the coordinator's mutex.

use crate::connection::{ConnectionHandle, ConnectionId};
use log::info;
use shared::Player;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Identity a client claims when it joins a room
///
/// Nothing here is validated; it is stable for the lifetime of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub room: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            room: room.into(),
        }
    }

    pub fn player(&self) -> Player {
        Player::new(self.id.clone(), self.name.clone())
    }
}

/// A connection currently admitted to a room
#[derive(Debug, Clone)]
pub struct Member {
    pub handle: ConnectionHandle,
    pub participant: Participant,
}

/// Roster order: display name, then participant id.
///
/// The connection id only breaks ties between two connections that claim the
/// exact same identity, so the order stays total.
pub fn roster_order(a: &Member, b: &Member) -> Ordering {
    a.participant
        .name
        .cmp(&b.participant.name)
        .then_with(|| a.participant.id.cmp(&b.participant.id))
        .then_with(|| a.handle.id().cmp(&b.handle.id()))
}

#[derive(Debug, Default)]
struct Room {
    members: Vec<Member>,
}

impl Room {
    fn position(&self, connection: ConnectionId) -> Option<usize> {
        self.members
            .iter()
            .position(|member| member.handle.id() == connection)
    }
}

pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    max_players: usize,
}

impl RoomRegistry {
    pub fn new(max_players: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            max_players,
        }
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Admits a connection into `participant.room`.
    ///
    /// Returns false without touching anything when the room is at capacity.
    /// A connection that is already a member only has its identity refreshed.
    pub fn join(&mut self, handle: ConnectionHandle, participant: Participant) -> bool {
        if let Some(room) = self.rooms.get_mut(&participant.room) {
            if let Some(idx) = room.position(handle.id()) {
                room.members[idx].participant = participant;
                return true;
            }
            if room.members.len() >= self.max_players {
                return false;
            }
        } else if self.max_players == 0 {
            return false;
        }

        let room_id = participant.room.clone();
        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Room {} created", room_id);
            Room::default()
        });
        room.members.push(Member {
            handle,
            participant,
        });
        true
    }

    /// Removes a connection from a room.
    ///
    /// Returns the removed member, or None if it was not in the room. The room
    /// itself is dropped as soon as it has no members left.
    pub fn leave(&mut self, room_id: &str, connection: ConnectionId) -> Option<Member> {
        let room = self.rooms.get_mut(room_id)?;
        let idx = room.position(connection)?;
        let member = room.members.swap_remove(idx);

        if room.members.is_empty() {
            self.rooms.remove(room_id);
            info!("Room {} is empty and was removed", room_id);
        }
        Some(member)
    }

    /// Members sorted by roster order
    pub fn ordered_members(&self, room_id: &str) -> Vec<&Member> {
        let mut members: Vec<&Member> = self
            .rooms
            .get(room_id)
            .map(|room| room.members.iter().collect())
            .unwrap_or_default();
        members.sort_by(|a, b| roster_order(a, b));
        members
    }

    /// Connection ids in roster order, as consumed by the turn scheduler
    pub fn rotation(&self, room_id: &str) -> Vec<ConnectionId> {
        self.ordered_members(room_id)
            .into_iter()
            .map(|member| member.handle.id())
            .collect()
    }

    pub fn roster(&self, room_id: &str) -> Vec<Player> {
        self.ordered_members(room_id)
            .into_iter()
            .map(|member| member.participant.player())
            .collect()
    }

    /// Finds the connection currently claiming `participant_id` in a room
    pub fn resolve(&self, room_id: &str, participant_id: &str) -> Option<&Member> {
        self.rooms
            .get(room_id)?
            .members
            .iter()
            .find(|member| member.participant.id == participant_id)
    }

    pub fn member(&self, room_id: &str, connection: ConnectionId) -> Option<&Member> {
        let room = self.rooms.get(room_id)?;
        room.position(connection).map(|idx| &room.members[idx])
    }

    pub fn contains(&self, room_id: &str, connection: ConnectionId) -> bool {
        self.member(room_id, connection).is_some()
    }

    /// Copies out every member's handle for fan-out
    pub fn handles(&self, room_id: &str) -> Vec<ConnectionHandle> {
        self.rooms
            .get(room_id)
            .map(|room| {
                room.members
                    .iter()
                    .map(|member| member.handle.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn room_ids(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    pub fn has_room(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Returns the number of members in a room
    pub fn len(&self, room_id: &str) -> usize {
        self.rooms
            .get(room_id)
            .map(|room| room.members.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Outbound;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn handle() -> (ConnectionHandle, UnboundedReceiver<Outbound>) {
        ConnectionHandle::new()
    }

    #[test]
    fn test_registry_creation() {
        let registry = RoomRegistry::new(5);
        assert_eq!(registry.max_players(), 5);
        assert_eq!(registry.len("r1"), 0);
        assert!(!registry.has_room("r1"));
        assert!(registry.room_ids().is_empty());
    }

    #[test]
    fn test_join_creates_room() {
        let mut registry = RoomRegistry::new(10);
        let (a, _rx) = handle();

        assert!(registry.join(a.clone(), Participant::new("a", "Alice", "r1")));
        assert!(registry.has_room("r1"));
        assert_eq!(registry.len("r1"), 1);
        assert!(registry.contains("r1", a.id()));
    }

    #[test]
    fn test_join_at_capacity_is_rejected() {
        let mut registry = RoomRegistry::new(2);
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();
        let (c, _rx_c) = handle();

        assert!(registry.join(a, Participant::new("a", "Alice", "r1")));
        assert!(registry.join(b, Participant::new("b", "Bob", "r1")));
        assert!(!registry.join(c.clone(), Participant::new("c", "Carol", "r1")));

        assert_eq!(registry.len("r1"), 2);
        assert!(!registry.contains("r1", c.id()));
    }

    #[test]
    fn test_capacity_is_per_room() {
        let mut registry = RoomRegistry::new(1);
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();

        assert!(registry.join(a, Participant::new("a", "Alice", "r1")));
        assert!(registry.join(b, Participant::new("b", "Bob", "r2")));
    }

    #[test]
    fn test_rejoin_refreshes_identity_without_capacity_check() {
        let mut registry = RoomRegistry::new(1);
        let (a, _rx) = handle();

        assert!(registry.join(a.clone(), Participant::new("a", "Alice", "r1")));
        assert!(registry.join(a.clone(), Participant::new("a", "Alicia", "r1")));

        assert_eq!(registry.len("r1"), 1);
        assert_eq!(registry.roster("r1"), vec![Player::new("a", "Alicia")]);
    }

    #[test]
    fn test_leave_removes_empty_room() {
        let mut registry = RoomRegistry::new(10);
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();

        registry.join(a.clone(), Participant::new("a", "Alice", "r1"));
        registry.join(b.clone(), Participant::new("b", "Bob", "r1"));

        let removed = registry.leave("r1", a.id()).unwrap();
        assert_eq!(removed.participant.id, "a");
        assert!(registry.has_room("r1"));

        assert!(registry.leave("r1", a.id()).is_none());

        registry.leave("r1", b.id());
        assert!(!registry.has_room("r1"));
        assert!(registry.leave("r1", b.id()).is_none());
    }

    #[test]
    fn test_roster_is_sorted_by_name_then_id() {
        let mut registry = RoomRegistry::new(10);
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();
        let (c, _rx_c) = handle();
        let (d, _rx_d) = handle();

        registry.join(d, Participant::new("z", "Bob", "r1"));
        registry.join(a, Participant::new("2", "Carol", "r1"));
        registry.join(b, Participant::new("y", "Alice", "r1"));
        registry.join(c, Participant::new("1", "Carol", "r1"));

        assert_eq!(
            registry.roster("r1"),
            vec![
                Player::new("y", "Alice"),
                Player::new("z", "Bob"),
                Player::new("1", "Carol"),
                Player::new("2", "Carol"),
            ]
        );
    }

    #[test]
    fn test_rotation_is_independent_of_join_order() {
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();
        let (c, _rx_c) = handle();

        let mut forward = RoomRegistry::new(10);
        forward.join(a.clone(), Participant::new("a", "Alice", "r1"));
        forward.join(b.clone(), Participant::new("b", "Bob", "r1"));
        forward.join(c.clone(), Participant::new("c", "Carol", "r1"));

        let mut backward = RoomRegistry::new(10);
        backward.join(c.clone(), Participant::new("c", "Carol", "r1"));
        backward.join(b.clone(), Participant::new("b", "Bob", "r1"));
        backward.join(a.clone(), Participant::new("a", "Alice", "r1"));

        assert_eq!(forward.rotation("r1"), vec![a.id(), b.id(), c.id()]);
        assert_eq!(forward.rotation("r1"), backward.rotation("r1"));
    }

    #[test]
    fn test_resolve_by_participant_id() {
        let mut registry = RoomRegistry::new(10);
        let (a, _rx) = handle();

        registry.join(a.clone(), Participant::new("p-1", "Alice", "r1"));

        let found = registry.resolve("r1", "p-1").unwrap();
        assert_eq!(found.handle, a);
        assert!(registry.resolve("r1", "p-2").is_none());
        assert!(registry.resolve("r2", "p-1").is_none());
    }

    #[test]
    fn test_handles_snapshot() {
        let mut registry = RoomRegistry::new(10);
        let (a, _rx_a) = handle();
        let (b, _rx_b) = handle();

        registry.join(a.clone(), Participant::new("a", "Alice", "r1"));
        registry.join(b.clone(), Participant::new("b", "Bob", "r1"));

        let handles = registry.handles("r1");
        assert_eq!(handles.len(), 2);
        assert!(handles.contains(&a));
        assert!(handles.contains(&b));
        assert!(registry.handles("nowhere").is_empty());
    }
}
