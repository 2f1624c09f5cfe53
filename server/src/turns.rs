//! Per-room turn holder state machine
//!
//! A room is either `NoHolder` or `HolderAssigned(connection)`. Rotation is
//! never stored: every transition receives the room's current roster order
//! from the registry and recomputes the next holder from it, so the schedule
//! cannot point at a member that already left.

use crate::connection::ConnectionId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    NoHolder,
    HolderAssigned(ConnectionId),
}

/// Picks the entry after `acting` in `rotation`, wrapping to the front.
///
/// When `acting` is not part of the rotation the first entry is chosen.
pub fn successor(rotation: &[ConnectionId], acting: ConnectionId) -> Option<ConnectionId> {
    if rotation.is_empty() {
        return None;
    }
    let next_idx = rotation
        .iter()
        .position(|id| *id == acting)
        .map(|idx| (idx + 1) % rotation.len())
        .unwrap_or(0);
    Some(rotation[next_idx])
}

#[derive(Debug, Default)]
pub struct TurnScheduler {
    holders: HashMap<String, ConnectionId>,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, room: &str) -> TurnState {
        match self.holders.get(room) {
            Some(holder) => TurnState::HolderAssigned(*holder),
            None => TurnState::NoHolder,
        }
    }

    pub fn current_holder(&self, room: &str) -> Option<ConnectionId> {
        self.holders.get(room).copied()
    }

    /// Assigns the first member in roster order if nobody holds the turn.
    ///
    /// Returns the holder only when this call assigned one, which is the
    /// caller's cue to send a turn notification.
    pub fn ensure_holder(&mut self, room: &str, rotation: &[ConnectionId]) -> Option<ConnectionId> {
        if self.holders.contains_key(room) {
            return None;
        }
        let first = *rotation.first()?;
        self.holders.insert(room.to_string(), first);
        Some(first)
    }

    /// Hands the turn to whoever follows `acting` in the current rotation.
    ///
    /// An empty rotation moves the room back to `NoHolder` and returns None.
    pub fn advance(
        &mut self,
        room: &str,
        rotation: &[ConnectionId],
        acting: ConnectionId,
    ) -> Option<ConnectionId> {
        match successor(rotation, acting) {
            Some(next) => {
                self.holders.insert(room.to_string(), next);
                Some(next)
            }
            None => {
                self.holders.remove(room);
                None
            }
        }
    }

    pub fn clear(&mut self, room: &str) {
        self.holders.remove(room);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<ConnectionId> {
        raw.iter().map(|id| ConnectionId(*id)).collect()
    }

    #[test]
    fn test_initial_state() {
        let turns = TurnScheduler::new();
        assert_eq!(turns.state("r1"), TurnState::NoHolder);
        assert_eq!(turns.current_holder("r1"), None);
    }

    #[test]
    fn test_ensure_holder_assigns_first_in_order() {
        let mut turns = TurnScheduler::new();
        let rotation = ids(&[3, 1, 2]);

        assert_eq!(turns.ensure_holder("r1", &rotation), Some(ConnectionId(3)));
        assert_eq!(turns.state("r1"), TurnState::HolderAssigned(ConnectionId(3)));

        // Already assigned: no-op, no notification
        assert_eq!(turns.ensure_holder("r1", &ids(&[1, 2])), None);
        assert_eq!(turns.current_holder("r1"), Some(ConnectionId(3)));
    }

    #[test]
    fn test_ensure_holder_on_empty_room() {
        let mut turns = TurnScheduler::new();
        assert_eq!(turns.ensure_holder("r1", &[]), None);
        assert_eq!(turns.state("r1"), TurnState::NoHolder);
    }

    #[test]
    fn test_advance_cycles_once_per_lap() {
        let mut turns = TurnScheduler::new();
        let rotation = ids(&[10, 20, 30]);

        let mut holder = turns.ensure_holder("r1", &rotation).unwrap();
        let mut seen = vec![holder];
        for _ in 0..rotation.len() {
            holder = turns.advance("r1", &rotation, holder).unwrap();
            seen.push(holder);
        }

        assert_eq!(seen, ids(&[10, 20, 30, 10]));
    }

    #[test]
    fn test_advance_from_unknown_member_starts_at_front() {
        let mut turns = TurnScheduler::new();
        let rotation = ids(&[4, 5]);

        assert_eq!(
            turns.advance("r1", &rotation, ConnectionId(99)),
            Some(ConnectionId(4))
        );
    }

    #[test]
    fn test_advance_on_empty_rotation_clears() {
        let mut turns = TurnScheduler::new();
        turns.ensure_holder("r1", &ids(&[1]));

        assert_eq!(turns.advance("r1", &[], ConnectionId(1)), None);
        assert_eq!(turns.state("r1"), TurnState::NoHolder);
    }

    #[test]
    fn test_single_member_keeps_turn() {
        let mut turns = TurnScheduler::new();
        let rotation = ids(&[7]);

        turns.ensure_holder("r1", &rotation);
        assert_eq!(
            turns.advance("r1", &rotation, ConnectionId(7)),
            Some(ConnectionId(7))
        );
    }

    #[test]
    fn test_successor_wraps() {
        let rotation = ids(&[1, 2, 3]);
        assert_eq!(successor(&rotation, ConnectionId(1)), Some(ConnectionId(2)));
        assert_eq!(successor(&rotation, ConnectionId(3)), Some(ConnectionId(1)));
        assert_eq!(successor(&[], ConnectionId(1)), None);
    }

    #[test]
    fn test_clear() {
        let mut turns = TurnScheduler::new();
        turns.ensure_holder("r1", &ids(&[1]));
        turns.ensure_holder("r2", &ids(&[2]));

        turns.clear("r1");
        assert_eq!(turns.current_holder("r1"), None);
        assert_eq!(turns.current_holder("r2"), Some(ConnectionId(2)));
    }
}
