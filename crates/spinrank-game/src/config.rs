//! Room configuration and the session phase.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::GameError;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room the registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Length of generated room codes.
    pub code_length: usize,

    /// Smallest per-player round count a creator may pick.
    pub min_rounds: u32,

    /// Largest per-player round count a creator may pick.
    pub max_rounds: u32,

    /// Round count used when `createGame` doesn't say.
    pub default_rounds: u32,

    /// Reject multipliers that are not on the wheel.
    ///
    /// Off by default: the wheel is spun in the browser and the server
    /// takes the reported value on trust.
    pub enforce_wheel_values: bool,

    /// Capacity of each room actor's command mailbox.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            min_rounds: 2,
            max_rounds: 20,
            default_rounds: 5,
            enforce_wheel_values: false,
            channel_size: 64,
        }
    }
}

impl RoomConfig {
    /// Picks the round count for a new room from what the creator asked for.
    ///
    /// # Errors
    /// [`GameError::InvalidRounds`] if the request is outside
    /// `min_rounds..=max_rounds`.
    pub fn resolve_rounds(&self, requested: Option<u32>) -> Result<u32, GameError> {
        let rounds = requested.unwrap_or(self.default_rounds);
        if (self.min_rounds..=self.max_rounds).contains(&rounds) {
            Ok(rounds)
        } else {
            Err(GameError::InvalidRounds {
                requested: rounds,
                min: self.min_rounds,
                max: self.max_rounds,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a session is in its round cycle.
///
/// ```text
/// Waiting → Spinning → Playing → Waiting → … → GameOver
/// ```
///
/// Only `GameOver` gates anything; the other phases are advisory and are
/// reported to clients for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Lobby, or between rounds.
    Waiting,
    /// Prompts dealt; the spinner is spinning the wheel.
    Spinning,
    /// Wheel stopped; players are ranking prompts.
    Playing,
    /// Round budget spent. Terminal.
    GameOver,
}

impl Phase {
    /// Returns `true` once the game has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Spinning => write!(f, "Spinning"),
            Self::Playing => write!(f, "Playing"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}
