//! HTTP and WebSocket surface of the game server
//!
//! Routes:
//! - `GET /ws` upgrades to the persistent event channel
//! - `POST /roll` runs a turn for a participant named in the body
//! - `GET /debug/players` lists members and positions, optionally per room
//!
//! Every WebSocket gets one reader loop (this task) and one writer task that
//! owns the socket's sink. The reader feeds frames to a [`Session`] and also
//! watches the writer, so a failed write ends the connection too. However the
//! loop ends, the session's disconnect path runs exactly once.

use crate::connection::{ConnectionHandle, Outbound};
use crate::coordinator::{Actor, Coordinator};
use crate::error::CoordinatorError;
use crate::session::{Flow, Session};
use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;
use shared::{RollRequest, RollResponse};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

/// Builds the application router around a coordinator
pub fn router(coordinator: Coordinator) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/roll", post(roll_handler))
        .route("/debug/players", get(debug_players_handler))
        .layer(cors)
        .with_state(coordinator)
}

/// Serves the router on an already bound listener until the server stops
pub async fn serve(listener: TcpListener, coordinator: Coordinator) -> std::io::Result<()> {
    info!(
        "Server listening on {} (ws: /ws, roll: /roll)",
        listener.local_addr()?
    );
    axum::serve(listener, router(coordinator)).await
}

async fn ws_handler(ws: WebSocketUpgrade, State(coordinator): State<Coordinator>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator))
}

async fn handle_socket(socket: WebSocket, coordinator: Coordinator) {
    let (sink, stream) = socket.split();
    let (handle, outbound_rx) = ConnectionHandle::new();
    debug!("Connection {} opened", handle.id());

    let writer = tokio::spawn(run_writer(sink, outbound_rx));
    run_reader(stream, Session::new(coordinator, handle), writer).await;
}

/// Feeds inbound frames to a session until the connection ends.
///
/// The connection ends on a close frame, a read error, a session asking to
/// close, or the writer task stopping after a failed write. Every one of those
/// runs the same leave path.
pub async fn run_reader<St, E>(mut stream: St, mut session: Session, mut writer: JoinHandle<()>)
where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    let id = session.handle().id();
    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if session.handle_text(&text).await == Flow::Close {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Read error on {}: {}", id, e);
                    break;
                }
            },
            _ = &mut writer => {
                debug!("Writer for {} stopped", id);
                break;
            }
        }
    }

    session.disconnect().await;
    session.handle().close();
    debug!("Connection {} closed", id);
}

/// Drains a connection's outbound queue into its socket.
///
/// Stops at the first write error or after writing a close frame.
pub async fn run_writer<S>(mut sink: S, mut outbound_rx: mpsc::UnboundedReceiver<Outbound>)
where
    S: Sink<Message> + Unpin,
{
    while let Some(outbound) = outbound_rx.recv().await {
        match outbound {
            Outbound::Text(payload) => {
                if sink.send(Message::Text(payload.to_string())).await.is_err() {
                    break;
                }
            }
            Outbound::Close => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }
    let _ = sink.close().await;
}

async fn roll_handler(
    State(coordinator): State<Coordinator>,
    body: Bytes,
) -> Result<Json<RollResponse>, CoordinatorError> {
    let request: RollRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("decode error: {}", e);
        CoordinatorError::BadRequest("bad json".to_string())
    })?;

    info!(
        "HTTP /roll {} ({}) in {}",
        request.player_id,
        request.name.as_deref().unwrap_or("-"),
        request.room
    );

    if request.room.is_empty() || request.player_id.is_empty() {
        return Err(CoordinatorError::BadRequest(
            "missing room or playerId".to_string(),
        ));
    }

    let outcome = coordinator
        .roll(&request.room, Actor::Participant(&request.player_id))
        .await?;

    Ok(Json(RollResponse {
        ok: true,
        dice: outcome.dice.faces(),
        total: outcome.dice.total(),
    }))
}

#[derive(Debug, Deserialize)]
struct DebugQuery {
    room: Option<String>,
}

async fn debug_players_handler(
    State(coordinator): State<Coordinator>,
    Query(query): Query<DebugQuery>,
) -> Response {
    match query.room.filter(|room| !room.is_empty()) {
        Some(room) => {
            let players = coordinator.room_players(&room).await;
            Json(json!({ "room": room, "players": players })).into_response()
        }
        None => Json(coordinator.all_players().await).into_response(),
    }
}
