//! Game rules and room lifecycle for Spinrank.
//!
//! A room holds one [`GameSession`]: the roster, whose turn it is to spin,
//! the round counter, the five prompts in play and the votes collected so
//! far. Each room runs as an isolated Tokio task (actor model), so all
//! commands for one room are applied strictly one after another.
//!
//! # Key types
//!
//! - [`GameSession`] — the pure per-room state machine
//! - [`Command`] — the inputs that drive it
//! - [`RoomManager`] — creates rooms under fresh codes, routes players,
//!   deletes rooms once empty
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`PromptPool`] — the static list prompts are drawn from
//! - [`RoomConfig`] — round limits, code length, wheel enforcement

mod config;
mod error;
mod manager;
mod prompts;
mod room;
mod scoring;
mod session;
mod wheel;

pub use config::{Phase, RoomConfig};
pub use error::GameError;
pub use manager::RoomManager;
pub use prompts::{PROMPTS_PER_ROUND, PromptPool};
pub use room::{PlayerSender, RoomHandle, RoomInfo};
pub use scoring::{Ranking, score_round};
pub use session::{Command, GameSession, Player};
pub use wheel::{WHEEL_SEGMENTS, WheelSegment, is_wheel_value, wheel_label};
