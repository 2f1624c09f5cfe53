use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const BOARD_TILES: u8 = 40;
pub const MAX_PLAYERS: usize = 10;
pub const DEFAULT_ROOM: &str = "default";
pub const START_TILE: u8 = 0;

/// Frames sent by a client over the persistent channel.
///
/// Every field is optional on the wire. Unknown `type` values decode to
/// [`ClientMessage::Unknown`] so the session layer can ignore them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Resume {
        #[serde(rename = "playerId", default)]
        player_id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        room: String,
    },
    Who {
        #[serde(default)]
        room: Option<String>,
    },
    SubscribeLogs,
    Roll,
    Ping,
    Leave,
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Decodes one text frame, returning `None` for anything malformed.
    pub fn decode(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Frames pushed from the server to every interested client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Players {
        list: Vec<Player>,
    },
    PlayerJoined {
        player: Player,
    },
    PlayerLeft {
        player: Player,
    },
    State {
        positions: BTreeMap<String, u8>,
    },
    Move {
        #[serde(rename = "playerId")]
        player_id: String,
        from: u8,
        to: u8,
        dice: [u8; 2],
    },
    Event {
        text: String,
    },
    YourTurn {
        #[serde(rename = "canRoll")]
        can_roll: bool,
    },
    ServerLog {
        text: String,
    },
}

impl ServerMessage {
    pub fn event(text: impl Into<String>) -> Self {
        ServerMessage::Event { text: text.into() }
    }

    pub fn server_log(text: impl Into<String>) -> Self {
        ServerMessage::ServerLog { text: text.into() }
    }
}

/// Public view of a room member as it appears in rosters.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub name: String,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Body of `POST /roll`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RollRequest {
    #[serde(rename = "playerId", default)]
    pub player_id: String,
    #[serde(default)]
    pub room: String,
    /// Only used for logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Successful `POST /roll` response.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RollResponse {
    pub ok: bool,
    pub dice: [u8; 2],
    pub total: u8,
}

/// One row of the `/debug/players` listing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerInfo {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub name: String,
    #[serde(rename = "roomId")]
    pub room_id: String,
    pub pos: u8,
}

/// Truncates an opaque player id for log lines.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(6) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_resume() {
        let msg = ClientMessage::decode(
            r#"{"type":"resume","playerId":"p-1","name":"Alice","room":"r1"}"#,
        );

        assert_eq!(
            msg,
            Some(ClientMessage::Resume {
                player_id: "p-1".to_string(),
                name: "Alice".to_string(),
                room: "r1".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_resume_missing_fields() {
        let msg = ClientMessage::decode(r#"{"type":"resume"}"#).unwrap();

        match msg {
            ClientMessage::Resume {
                player_id,
                name,
                room,
            } => {
                assert!(player_id.is_empty());
                assert!(name.is_empty());
                assert!(room.is_empty());
            }
            _ => panic!("Wrong message type after decode"),
        }
    }

    #[test]
    fn test_decode_unit_messages_ignore_extra_fields() {
        assert_eq!(
            ClientMessage::decode(r#"{"type":"roll","room":"r1"}"#),
            Some(ClientMessage::Roll)
        );
        assert_eq!(
            ClientMessage::decode(r#"{"type":"leave","playerId":"p","room":"r1"}"#),
            Some(ClientMessage::Leave)
        );
        assert_eq!(
            ClientMessage::decode(r#"{"type":"ping","t":12345}"#),
            Some(ClientMessage::Ping)
        );
    }

    #[test]
    fn test_decode_who_with_and_without_room() {
        assert_eq!(
            ClientMessage::decode(r#"{"type":"who"}"#),
            Some(ClientMessage::Who { room: None })
        );
        assert_eq!(
            ClientMessage::decode(r#"{"type":"who","room":"lobby"}"#),
            Some(ClientMessage::Who {
                room: Some("lobby".to_string())
            })
        );
    }

    #[test]
    fn test_decode_unknown_type() {
        assert_eq!(
            ClientMessage::decode(r#"{"type":"sync","room":"r1"}"#),
            Some(ClientMessage::Unknown)
        );
    }

    #[test]
    fn test_decode_malformed() {
        assert_eq!(ClientMessage::decode("not json"), None);
        assert_eq!(ClientMessage::decode("42"), None);
        assert_eq!(ClientMessage::decode(r#"{"name":"no type"}"#), None);
    }

    #[test]
    fn test_server_message_field_names() {
        let msg = ServerMessage::Move {
            player_id: "p-1".to_string(),
            from: 38,
            to: 5,
            dice: [3, 4],
        };
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(
            value,
            json!({"type": "move", "playerId": "p-1", "from": 38, "to": 5, "dice": [3, 4]})
        );

        let value = serde_json::to_value(ServerMessage::YourTurn { can_roll: true }).unwrap();
        assert_eq!(value, json!({"type": "yourTurn", "canRoll": true}));

        let value = serde_json::to_value(ServerMessage::PlayerJoined {
            player: Player::new("p-2", "Bob"),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"type": "playerJoined", "player": {"id": "p-2", "name": "Bob"}})
        );

        let value = serde_json::to_value(ServerMessage::server_log("hello")).unwrap();
        assert_eq!(value, json!({"type": "serverLog", "text": "hello"}));
    }

    #[test]
    fn test_state_positions_serialize_as_object() {
        let mut positions = BTreeMap::new();
        positions.insert("a".to_string(), 0);
        positions.insert("b".to_string(), 17);

        let value = serde_json::to_value(ServerMessage::State { positions }).unwrap();
        assert_eq!(
            value,
            json!({"type": "state", "positions": {"a": 0, "b": 17}})
        );
    }

    #[test]
    fn test_roll_request_defaults() {
        let req: RollRequest = serde_json::from_str(r#"{"room":"r1"}"#).unwrap();
        assert_eq!(req.room, "r1");
        assert!(req.player_id.is_empty());
        assert!(req.name.is_none());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("abcdef"), "abcdef");
        assert_eq!(short_id("abcdefgh"), "abcdef");
        assert_eq!(short_id(""), "");
    }
}
