//! # Board Game Session Server
//!
//! This library provides the authoritative server for a multiplayer board game
//! played in named rooms. Clients hold a persistent WebSocket to the server,
//! which owns every token position, decides whose turn it is, and pushes each
//! state change to everyone in the room.
//!
//! ## Core Responsibilities
//!
//! ### Room Membership
//! Connections join rooms by name. Rooms are created on first join, capped at
//! a configurable number of players and dropped together with all of their
//! state when the last member leaves.
//!
//! ### Turn Order
//! Exactly one member of a non-empty room holds the turn. Rotation follows a
//! deterministic roster order (display name, then player id), recomputed
//! from live membership on every advance, so it never depends on join order
//! and never points at someone who already left.
//!
//! ### Authoritative Positions
//! The server rolls the dice and moves tokens around the 40-tile board.
//! Clients only ever render what the server broadcasts.
//!
//! ## Architecture Design
//!
//! ### One Lock, Short Critical Sections
//! Registry, position ledger and turn scheduler live behind a single mutex in
//! the [`coordinator::Coordinator`]. Each operation mutates state and queues
//! its outbound messages inside one critical section; no socket write ever
//! happens under the lock.
//!
//! ### Per-Connection Writer Tasks
//! Every connection has its own outbound queue drained by a dedicated writer
//! task. A slow or broken client only backs up its own queue.
//!
//! ### Fire-and-Forget Turn Notifications
//! Announcing a new turn holder runs as a detached task, so the caller that
//! moved the turn never waits on delivery.
//!
//! ## Module Organization
//!
//! - `connection` - handle for one live duplex channel
//! - `positions` - per-room tile ledger
//! - `registry` - room membership, capacity and roster order
//! - `turns` - turn holder state machine
//! - `fanout` - serialize-once broadcast and ordered outboxes
//! - `coordinator` - the locked state store tying the above together
//! - `session` - inbound frame decoding and dispatch
//! - `network` - axum routes for `/ws`, `/roll` and `/debug/players`
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::coordinator::Coordinator;
//! use server::network;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let coordinator = Coordinator::new(10);
//!
//!     network::serve(listener, coordinator).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod coordinator;
pub mod dice;
pub mod error;
pub mod fanout;
pub mod network;
pub mod positions;
pub mod registry;
pub mod session;
pub mod turns;
