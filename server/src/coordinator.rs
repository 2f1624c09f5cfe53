//! Room, position and turn coordination behind a single lock
//!
//! The coordinator is the only owner of the room registry, the position
//! ledger and the turn scheduler. They reference each other (passing a turn
//! reads the roster, emptying a room drops its positions and turn), so all
//! three sit behind one mutex and every operation below is one critical
//! section.
//!
//! ## Outbound traffic
//! Messages produced by a transition are collected into an [`Outbox`] and
//! enqueued onto the recipients' connection queues before the lock is
//! released. Enqueueing never waits on a socket; the transport write happens
//! later in each connection's writer task. This keeps every room's broadcasts
//! in the same order as the mutations that produced them.
//!
//! Turn notifications are the exception: they are spawned as detached tasks
//! that re-read the holder when they run, so callers of a transition never
//! wait on them.

use crate::connection::{ConnectionHandle, ConnectionId};
use crate::dice::Dice;
use crate::error::CoordinatorError;
use crate::fanout::{self, Outbox};
use crate::positions::PositionLedger;
use crate::registry::{Member, Participant, RoomRegistry};
use crate::turns::{TurnScheduler, TurnState};
use log::{debug, info};
use shared::{short_id, Player, PlayerInfo, ServerMessage};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Who is asking to roll
#[derive(Debug, Clone, Copy)]
pub enum Actor<'a> {
    /// A persistent connection acting for itself
    Connection(&'a ConnectionHandle),
    /// A request/response caller naming a participant id
    Participant(&'a str),
}

/// Result of a successful roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollOutcome {
    pub dice: Dice,
    pub from: u8,
    pub to: u8,
    pub next_holder: Option<ConnectionId>,
}

struct State {
    registry: RoomRegistry,
    positions: PositionLedger,
    turns: TurnScheduler,
}

impl State {
    fn log_to_room(&self, outbox: &mut Outbox, room: &str, text: String) {
        info!("[{}] {}", room, text);
        outbox.broadcast(
            self.registry.handles(room),
            &ServerMessage::server_log(text),
        );
    }

    fn broadcast_roster(&self, outbox: &mut Outbox, room: &str) {
        outbox.broadcast(
            self.registry.handles(room),
            &ServerMessage::Players {
                list: self.registry.roster(room),
            },
        );
    }
}

#[derive(Clone)]
pub struct Coordinator {
    state: Arc<Mutex<State>>,
}

impl Coordinator {
    pub fn new(max_players: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                registry: RoomRegistry::new(max_players),
                positions: PositionLedger::new(),
                turns: TurnScheduler::new(),
            })),
        }
    }

    /// Admits a connection into `participant.room` and announces it.
    ///
    /// On success the room receives, in order: a server log line, the
    /// roster, a `playerJoined` delta and a position snapshot. If the room had
    /// no turn holder the first member in roster order gets the turn.
    pub async fn join(
        &self,
        handle: &ConnectionHandle,
        participant: Participant,
    ) -> Result<(), CoordinatorError> {
        let room = participant.room.clone();
        let mut state = self.state.lock().await;

        if !state.registry.join(handle.clone(), participant.clone()) {
            info!(
                "[{}] rejected {} ({}): room full",
                room,
                participant.name,
                short_id(&participant.id)
            );
            return Err(CoordinatorError::RoomFull {
                room,
                capacity: state.registry.max_players(),
            });
        }

        let mut outbox = Outbox::new();
        state.log_to_room(
            &mut outbox,
            &room,
            format!(
                "{} connected ({})",
                participant.name,
                short_id(&participant.id)
            ),
        );

        state.positions.ensure_initialized(&room, &participant.id);

        state.broadcast_roster(&mut outbox, &room);
        outbox.broadcast(
            state.registry.handles(&room),
            &ServerMessage::PlayerJoined {
                player: participant.player(),
            },
        );
        outbox.broadcast(
            state.registry.handles(&room),
            &ServerMessage::State {
                positions: state.positions.snapshot(&room),
            },
        );

        let rotation = state.registry.rotation(&room);
        let assigned = state.turns.ensure_holder(&room, &rotation);

        outbox.flush();
        drop(state);

        if assigned.is_some() {
            self.spawn_turn_notification(room);
        }
        Ok(())
    }

    /// Removes a connection from a room; the one path for both `leave` and
    /// dropped connections.
    ///
    /// Returns false if the connection was not a member. When the departing
    /// connection held the turn, the turn passes to whoever followed it in
    /// roster order. The last member leaving drops the room's positions and
    /// turn state with it.
    pub async fn leave(&self, handle: &ConnectionHandle, room: &str) -> bool {
        let mut state = self.state.lock().await;

        if !state.registry.contains(room, handle.id()) {
            return false;
        }

        let was_holder = state.turns.current_holder(room) == Some(handle.id());
        if was_holder {
            // Rotate while the departing member is still in the roster so the
            // turn goes to its successor rather than the front of the order.
            let rotation = state.registry.rotation(room);
            state.turns.advance(room, &rotation, handle.id());
        }

        let member = match state.registry.leave(room, handle.id()) {
            Some(member) => member,
            None => return false,
        };

        if !state.registry.has_room(room) {
            state.positions.remove_room(room);
            state.turns.clear(room);
            info!(
                "[{}] {} disconnected ({}); room closed",
                room,
                member.participant.name,
                short_id(&member.participant.id)
            );
            return true;
        }

        let mut outbox = Outbox::new();
        state.log_to_room(
            &mut outbox,
            room,
            format!(
                "{} disconnected ({})",
                member.participant.name,
                short_id(&member.participant.id)
            ),
        );
        state.broadcast_roster(&mut outbox, room);
        outbox.broadcast(
            state.registry.handles(room),
            &ServerMessage::PlayerLeft {
                player: member.participant.player(),
            },
        );

        let rotation = state.registry.rotation(room);
        let assigned = state.turns.ensure_holder(room, &rotation);

        outbox.flush();
        drop(state);

        if was_holder || assigned.is_some() {
            self.spawn_turn_notification(room.to_string());
        }
        true
    }

    /// Rolls two random dice for `actor` and moves its token
    pub async fn roll(&self, room: &str, actor: Actor<'_>) -> Result<RollOutcome, CoordinatorError> {
        let dice = Dice::roll(&mut rand::thread_rng());
        self.roll_with(room, actor, dice).await
    }

    /// Executes a turn with the given dice as one atomic step.
    ///
    /// Fails without mutating anything when the actor is not in the room or
    /// does not hold the turn; in the latter case the actor's connection is
    /// told directly.
    pub async fn roll_with(
        &self,
        room: &str,
        actor: Actor<'_>,
        dice: Dice,
    ) -> Result<RollOutcome, CoordinatorError> {
        let mut state = self.state.lock().await;

        let member: Member = match actor {
            Actor::Connection(handle) => state.registry.member(room, handle.id()),
            Actor::Participant(participant_id) => state.registry.resolve(room, participant_id),
        }
        .cloned()
        .ok_or_else(|| CoordinatorError::NotConnected {
            room: room.to_string(),
            player_id: match actor {
                Actor::Connection(handle) => handle.id().to_string(),
                Actor::Participant(participant_id) => participant_id.to_string(),
            },
        })?;

        if state.turns.current_holder(room) != Some(member.handle.id()) {
            member.handle.send(&ServerMessage::event("Not your turn."));
            return Err(CoordinatorError::NotYourTurn {
                room: room.to_string(),
                player_id: member.participant.id,
            });
        }

        let participant = &member.participant;
        let from = state.positions.get(room, &participant.id);
        let to = state
            .positions
            .set(room, &participant.id, from as i64 + dice.total() as i64);
        let [first, second] = dice.faces();

        info!(
            "[{}] {} rolled {} ({} + {}): {} -> {}",
            room,
            participant.name,
            dice.total(),
            first,
            second,
            from,
            to
        );

        let mut outbox = Outbox::new();
        let members = state.registry.handles(room);
        outbox.broadcast(
            members.clone(),
            &ServerMessage::event(format!(
                "{} rolled {} ({} + {})",
                participant.name,
                dice.total(),
                first,
                second
            )),
        );
        outbox.broadcast(
            members,
            &ServerMessage::Move {
                player_id: participant.id.clone(),
                from,
                to,
                dice: dice.faces(),
            },
        );

        let rotation = state.registry.rotation(room);
        let next_holder = state.turns.advance(room, &rotation, member.handle.id());

        outbox.flush();
        drop(state);

        self.spawn_turn_notification(room.to_string());

        Ok(RollOutcome {
            dice,
            from,
            to,
            next_holder,
        })
    }

    /// Sends one message to every current member of a room.
    ///
    /// The membership is copied under the lock and delivery happens after it
    /// is released. Returns the number of members that accepted the frame.
    pub async fn broadcast(&self, room: &str, message: &ServerMessage) -> usize {
        let payload = match fanout::encode(message) {
            Some(payload) => payload,
            None => return 0,
        };
        let members = {
            let state = self.state.lock().await;
            state.registry.handles(room)
        };
        fanout::deliver(&members, &payload)
    }

    /// Logs a line and mirrors it to every room as a `serverLog` message
    pub async fn broadcast_server_log(&self, text: &str) {
        info!("{}", text);
        let rooms = {
            let state = self.state.lock().await;
            state.registry.room_ids()
        };
        let message = ServerMessage::server_log(text);
        for room in rooms {
            self.broadcast(&room, &message).await;
        }
    }

    /// Tells the room whose turn it is and invites the holder to roll
    pub async fn notify_turn(&self, room: &str) {
        let state = self.state.lock().await;

        let holder = match state.turns.current_holder(room) {
            Some(holder) => holder,
            None => return,
        };
        let member = match state.registry.member(room, holder) {
            Some(member) => member,
            None => return,
        };

        debug!("[{}] turn passes to {}", room, member.participant.name);

        let mut outbox = Outbox::new();
        outbox.broadcast(
            state.registry.handles(room),
            &ServerMessage::event(format!("It's {}'s turn.", member.participant.name)),
        );
        outbox.send(&member.handle, &ServerMessage::YourTurn { can_roll: true });
        outbox.flush();
    }

    fn spawn_turn_notification(&self, room: String) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.notify_turn(&room).await;
        });
    }

    pub async fn roster(&self, room: &str) -> Vec<Player> {
        self.state.lock().await.registry.roster(room)
    }

    pub async fn resolve(&self, room: &str, participant_id: &str) -> Option<ConnectionHandle> {
        let state = self.state.lock().await;
        state
            .registry
            .resolve(room, participant_id)
            .map(|member| member.handle.clone())
    }

    pub async fn current_holder(&self, room: &str) -> Option<ConnectionId> {
        self.state.lock().await.turns.current_holder(room)
    }

    pub async fn turn_state(&self, room: &str) -> TurnState {
        self.state.lock().await.turns.state(room)
    }

    pub async fn member_count(&self, room: &str) -> usize {
        self.state.lock().await.registry.len(room)
    }

    pub async fn has_room(&self, room: &str) -> bool {
        self.state.lock().await.registry.has_room(room)
    }

    /// True if any per-room structure still has an entry for `room`
    pub async fn has_room_state(&self, room: &str) -> bool {
        let state = self.state.lock().await;
        state.registry.has_room(room)
            || state.positions.has_room(room)
            || state.turns.current_holder(room).is_some()
    }

    pub async fn position(&self, room: &str, participant_id: &str) -> u8 {
        self.state.lock().await.positions.get(room, participant_id)
    }

    pub async fn positions(&self, room: &str) -> BTreeMap<String, u8> {
        self.state.lock().await.positions.snapshot(room)
    }

    /// Members of one room with their tiles, in roster order
    pub async fn room_players(&self, room: &str) -> Vec<PlayerInfo> {
        let state = self.state.lock().await;
        Self::player_infos(&state, room)
    }

    /// Every room's members with their tiles
    pub async fn all_players(&self) -> BTreeMap<String, Vec<PlayerInfo>> {
        let state = self.state.lock().await;
        state
            .registry
            .room_ids()
            .into_iter()
            .map(|room| {
                let players = Self::player_infos(&state, &room);
                (room, players)
            })
            .collect()
    }

    fn player_infos(state: &State, room: &str) -> Vec<PlayerInfo> {
        state
            .registry
            .ordered_members(room)
            .into_iter()
            .map(|member| PlayerInfo {
                player_id: member.participant.id.clone(),
                name: member.participant.name.clone(),
                room_id: room.to_string(),
                pos: state.positions.get(room, &member.participant.id),
            })
            .collect()
    }
}
