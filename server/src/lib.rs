//! # Word Race Server Library
//!
//! This library provides the server of a multiplayer typing game. Players
//! connect, pick a display name, meet in a lobby, declare or join games, then
//! race to type the words of each round. The fastest complete rounds enter
//! all-time leaderboards kept per game category.
//!
//! ## Core Responsibilities
//!
//! ### Session Protocol
//! Every connection runs a small state machine (`OPENED`, `LOBBY`,
//! `CREATED`, `JOINED`, `PLAYING`). Inbound text lines are validated against
//! the current state; invalid ones are logged and dropped without closing the
//! connection.
//!
//! ### Game Orchestration
//! Declared and running games live in the play service, which broadcasts
//! the games list to the lobby, moves joined players along when their game
//! starts or disappears, and runs the rounds.
//!
//! ### Leaderboards
//! At the end of each round, players who caught every word are ranked by
//! words per minute in the leaderboard of the game category. Leaderboards are
//! snapshotted to disk periodically and at shutdown.
//!
//! ## Architecture Design
//!
//! ### One Task per Connection
//! Each TCP connection is served by its own tokio task which owns the
//! session state. Other parts of the server reach a session through its
//! outbound event channel, so the state is only ever written by its task.
//!
//! ### Synchronous Core
//! The game logic is synchronous and guarded by `parking_lot` locks that are
//! never held across an await point. Locks are always taken in the same
//! order: games, then clients.
//!
//! ## Module Organization
//!
//! - `client_manager`: connected clients, display names and outbound routing
//! - `config`: runtime settings
//! - `dictionary`: per-language word lists
//! - `game`: game model, rounds and claims
//! - `leaderboard`: ranking engine and its snapshot
//! - `network`: TCP listener and connection tasks
//! - `persistence`: snapshot stores
//! - `play`: lobby and game orchestration
//! - `score`: per-player round and game statistics
//! - `session`: protocol state machine
//! - `stats`: usage counters
//! - `word_selector`: prefix-free random word selection
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::dictionary::Dictionary;
//! use server::leaderboard::Leaderboard;
//! use server::network::Server;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::with_address("127.0.0.1:8080");
//!     let dictionary = Arc::new(Dictionary::load(&config.dictionaries_dir)?);
//!     let leaderboard = Arc::new(Leaderboard::new(config.scores_length));
//!
//!     let server = Server::bind(&config, dictionary, leaderboard).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod dictionary;
pub mod game;
pub mod leaderboard;
pub mod network;
pub mod persistence;
pub mod play;
pub mod score;
pub mod session;
pub mod stats;
pub mod utils;
pub mod word_selector;
