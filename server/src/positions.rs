//! Server-authoritative token positions
//!
//! Positions are keyed by room and then by the client-supplied participant id,
//! so a player who reconnects to a live room keeps their tile. Entries only go
//! away together with their room.

use shared::{BOARD_TILES, START_TILE};
use std::collections::{BTreeMap, HashMap};

/// Wraps any move result onto the board, including negative sums
pub fn normalize_tile(raw: i64) -> u8 {
    raw.rem_euclid(BOARD_TILES as i64) as u8
}

#[derive(Debug, Default)]
pub struct PositionLedger {
    rooms: HashMap<String, HashMap<String, u8>>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a participant on the start tile unless they already have a position
    pub fn ensure_initialized(&mut self, room: &str, participant_id: &str) {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .entry(participant_id.to_string())
            .or_insert(START_TILE);
    }

    /// Returns the current tile, or the start tile if never set
    pub fn get(&self, room: &str, participant_id: &str) -> u8 {
        self.rooms
            .get(room)
            .and_then(|positions| positions.get(participant_id))
            .copied()
            .unwrap_or(START_TILE)
    }

    /// Stores a normalized tile index and returns it
    pub fn set(&mut self, room: &str, participant_id: &str, raw_index: i64) -> u8 {
        let tile = normalize_tile(raw_index);
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(participant_id.to_string(), tile);
        tile
    }

    /// Copies the room's positions for an outbound state message
    pub fn snapshot(&self, room: &str) -> BTreeMap<String, u8> {
        self.rooms
            .get(room)
            .map(|positions| {
                positions
                    .iter()
                    .map(|(id, tile)| (id.clone(), *tile))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn remove_room(&mut self, room: &str) {
        self.rooms.remove(room);
    }

    pub fn has_room(&self, room: &str) -> bool {
        self.rooms.contains_key(room)
    }
}
