//! # Snake Arena Server Library
//!
//! This library provides the authoritative server for a shared-grid snake
//! game. It owns the canonical state of every snake and apple, advances it on
//! a fixed tick, and sends the complete state to every connected client after
//! each step.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Clients only ever send intent (a direction, a nickname). Movement, apple
//! consumption, scoring, deaths and respawns are all decided here, and the
//! result of each tick is the only state clients ever see.
//!
//! ### Connection Lifecycle
//! Handles the complete lifecycle of a WebSocket connection:
//! - Handshake, with the client's address taken from proxy headers if present
//! - Spawning a one-cell snake on a free cell and an immediate broadcast
//! - Applying inbound messages to the connection's own snake only
//! - Removal from the arena when the socket closes or fails
//!
//! ### State Broadcasting
//! After every tick each client receives the full arena plus the position of
//! its own head. A client that cannot keep up loses frames; it never slows
//! the tick or the other clients down.
//!
//! ## Architecture Design
//!
//! ### One Lock, Short Critical Sections
//! All game state lives in a single `GameState` behind the engine's mutex.
//! Connection tasks lock it briefly to join, leave or steer; the tick task
//! locks it to step the simulation and queue the resulting frames. Queuing
//! never waits, so frames are handed out under the lock and every client
//! receives them in the order the state changed.
//!
//! ### Two-Phase Tick
//! Every snake moves (and eats) first, in join order. Deaths are then decided
//! against everyone's moved bodies, so a head-on collision kills both snakes
//! regardless of who moved first.
//!
//! ### Non-Blocking Fan-Out
//! Each connection has a bounded frame queue drained by its own writer task.
//! The broadcaster only ever calls `try_send`; a full or closed queue is
//! logged and skipped. Writers give up on a socket whose write stalls past a
//! fixed timeout.
//!
//! ## Module Organization
//!
//! ### Player Module (`player`)
//! Snake body, direction, score, nickname and the outbound connection handle.
//!
//! ### Registry Module (`registry`)
//! Join-ordered membership with detached snapshots for broadcasting.
//!
//! ### Resolver Module (`resolver`)
//! Pure placement and collision rules: free-cell search, apple lookup, death
//! causes.
//!
//! ### Game Module (`game`)
//! The arena itself and the tick step.
//!
//! ### Broadcast Module (`broadcast`)
//! Snapshot building, per-recipient encoding and fault-tolerant fan-out.
//!
//! ### Input Module (`input`)
//! Decoding and validation of client messages.
//!
//! ### Engine Module (`engine`)
//! The lock around the arena, the four lifecycle hooks, and the tick loop.
//!
//! ### Network Module (`network`)
//! TCP listener, WebSocket handshake and per-connection reader/writer tasks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::engine::{spawn_tick_loop, Engine};
//! use server::network::Server;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Arc::new(Engine::new(64));
//!     spawn_tick_loop(Arc::clone(&engine), shared::TICK_INTERVAL);
//!
//!     let server = Server::bind("127.0.0.1:8000", engine).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod engine;
pub mod game;
pub mod input;
pub mod network;
pub mod player;
pub mod registry;
pub mod resolver;
