//! Error taxonomy for the coordination engine
//!
//! Every variant is local and recoverable: the engine reports it to the caller
//! and leaves shared state untouched. The HTTP layer maps each variant onto a
//! status code so `/roll` callers see the same failures as socket callers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("room {room} is full ({capacity} players max)")]
    RoomFull { room: String, capacity: usize },

    #[error("player {player_id} not connected in room {room}")]
    NotConnected { room: String, player_id: String },

    #[error("not {player_id}'s turn in room {room}")]
    NotYourTurn { room: String, player_id: String },

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl CoordinatorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoordinatorError::RoomFull { .. } => StatusCode::CONFLICT,
            CoordinatorError::NotConnected { .. } => StatusCode::NOT_FOUND,
            CoordinatorError::NotYourTurn { .. } => StatusCode::FORBIDDEN,
            CoordinatorError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Plain-text body sent back to HTTP callers.
    pub fn public_message(&self) -> String {
        match self {
            CoordinatorError::RoomFull { capacity, .. } => {
                format!("Room is full ({} players max).", capacity)
            }
            CoordinatorError::NotConnected { .. } => "player not connected in room".to_string(),
            CoordinatorError::NotYourTurn { .. } => "not your turn".to_string(),
            CoordinatorError::BadRequest(reason) => reason.clone(),
        }
    }
}

impl IntoResponse for CoordinatorError {
    fn into_response(self) -> Response {
        (self.status_code(), self.public_message()).into_response()
    }
}
