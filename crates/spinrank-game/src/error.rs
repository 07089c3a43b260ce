//! Error types for the game layer.

use spinrank_protocol::{PlayerId, RoomCode};

/// Errors that can occur while creating, joining or playing a room.
///
/// None of these are fatal: each is reported to the connection that
/// caused it and leaves every room's state as it was.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No room is registered under this code.
    #[error("game not found: {0}")]
    RoomNotFound(RoomCode),

    /// `createGame` asked for a round count outside the allowed range.
    #[error("rounds must be between {min} and {max}, got {requested}")]
    InvalidRounds { requested: u32, min: u32, max: u32 },

    /// A vote that is not exactly five ranks in `1..=5`.
    #[error("invalid vote shape: {0}")]
    InvalidVoteShape(String),

    /// The reported multiplier is not on the wheel (only checked when
    /// wheel enforcement is switched on).
    #[error("multiplier {0} is not a wheel value")]
    IllegalMultiplier(u32),

    /// The player acted on a room they are not part of.
    #[error("player {0} is not in game {1}")]
    NotInRoom(PlayerId, RoomCode),

    /// The player is already seated in a different room.
    #[error("player {0} is already in game {1}")]
    AlreadyInRoom(PlayerId, RoomCode),

    /// A vote arrived when no round is waiting for votes (before the first
    /// round, or after the current one was scored).
    #[error("no round is open for votes in game {0}")]
    NoOpenRound(RoomCode),

    /// The prompt list can't fill a round.
    #[error("need at least {needed} distinct prompts, found {found}")]
    PromptPoolTooSmall { found: usize, needed: usize },

    /// Reading the prompt file failed.
    #[error("failed to read prompt file: {0}")]
    PromptFile(#[source] std::io::Error),

    /// The room's actor is gone (shut down, or it panicked).
    #[error("game {0} is unavailable")]
    RoomUnavailable(RoomCode),
}

impl GameError {
    /// HTTP-style status code sent to the client in `error{code, message}`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RoomNotFound(_) => 404,
            Self::InvalidRounds { .. }
            | Self::InvalidVoteShape(_)
            | Self::IllegalMultiplier(_) => 400,
            Self::NotInRoom(..) => 403,
            Self::AlreadyInRoom(..) | Self::NoOpenRound(_) => 409,
            Self::PromptPoolTooSmall { .. } | Self::PromptFile(_) | Self::RoomUnavailable(_) => 500,
        }
    }
}
