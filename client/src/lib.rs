//! # Snake Arena Bot Client
//!
//! A headless client for the snake arena server. Each bot opens a WebSocket,
//! announces a nickname, and then reacts to every state frame the server
//! broadcasts by steering its snake. Bots are used to populate an arena and
//! to exercise the server under load without a browser.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Reads the bot's own snake out of a frame and picks the next direction:
//! greedy toward the nearest apple, never into a wall or an occupied cell
//! when a safe move exists.
//!
//! ### Network Module (`network`)
//! Connection handling and the receive/steer loop, with per-session
//! statistics.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{run_bot, BotConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), client::network::BotError> {
//!     let stats = run_bot(BotConfig {
//!         server_url: "ws://127.0.0.1:8000/".to_string(),
//!         nickname: "bot".to_string(),
//!         max_frames: Some(600),
//!     })
//!     .await?;
//!     println!("best score {}", stats.best_score);
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod network;
