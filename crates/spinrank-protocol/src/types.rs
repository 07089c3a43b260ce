//! Core protocol types for Spinrank's wire format.
//!
//! Every type here is serialized to JSON and read by browser code, so the
//! serde attributes are part of the contract: action and event names are
//! `camelCase` under a `"type"` tag, and so are their fields.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use spinrank_transport::ConnectionId;

use crate::MultiplierInput;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player, identified by the connection they are playing on.
///
/// Serialized as a plain number. When used as a JSON map key (as in
/// `scoresByPlayerId`) serde_json writes it as a numeric string, so
/// deserializing accepts both forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlayerIdVisitor;

        impl Visitor<'_> for PlayerIdVisitor {
            type Value = PlayerId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a player id as a number or numeric string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<PlayerId, E> {
                Ok(PlayerId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<PlayerId, E> {
                u64::try_from(v)
                    .map(PlayerId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PlayerId, E> {
                v.parse()
                    .map(PlayerId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(PlayerIdVisitor)
    }
}

impl From<ConnectionId> for PlayerId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The short code players type to find a room, e.g. `"K7Q2ZD"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps a code as typed by a player: surrounding whitespace is dropped
    /// and letters are upper-cased, so `" k7q2zd"` finds room `K7Q2ZD`.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Roster views
// ---------------------------------------------------------------------------

/// One roster entry as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub score: u64,
}

/// The player announced in `gameOver`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub id: PlayerId,
    pub name: String,
    pub score: u64,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
///
/// ```json
/// { "type": "submitVotes", "code": "K7Q2ZD", "votes": [2,1,3,5,4], "wheelMultiplier": 4 }
/// ```
///
/// Room codes are carried as typed; the server normalizes them with
/// [`RoomCode::normalize`]. `votes` stays a list of plain integers here so a
/// vote with the wrong length or out-of-range ranks still decodes and can
/// be answered with a precise error instead of a generic decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientAction {
    /// Open a new room and join it as its first player (and first spinner).
    CreateGame { name: String, rounds: Option<u32> },

    /// Join an existing room.
    JoinGame { code: String, name: String },

    /// Start the next round, or end the game if the round budget is spent.
    StartGame { code: String },

    /// The spinner's wheel stopped on `multiplier`.
    SpinComplete {
        code: String,
        multiplier: Option<MultiplierInput>,
    },

    /// This player's private ranking of the round's five prompts.
    SubmitVotes {
        code: String,
        votes: Vec<i64>,
        wheel_multiplier: Option<MultiplierInput>,
    },

    /// Keep-alive; answered with [`ServerEvent::HeartbeatAck`].
    Heartbeat { client_time: u64 },
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the server tells clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// First frame on every connection: the identity used in every roster
    /// and score map.
    Welcome { player_id: PlayerId },

    /// To the creator only.
    GameCreated { code: RoomCode },

    /// Roster after someone joined, in join order.
    PlayerJoined {
        players: Vec<PlayerView>,
        current_spinner_id: Option<PlayerId>,
    },

    RoundStarted {
        prompts: Vec<String>,
        current_spinner_id: Option<PlayerId>,
        /// 1-based number of the round just started.
        round: u32,
        /// Round budget at the moment the round started.
        total_rounds: u32,
    },

    /// The wheel result. `current_spinner_id` has already moved on to the
    /// next player; `previous_spinner_id` is who actually spun.
    SpinningComplete {
        multiplier: u32,
        current_spinner_id: Option<PlayerId>,
        previous_spinner_id: Option<PlayerId>,
    },

    /// Broadcast once per round, when the last vote arrives.
    RoundResults {
        scores_by_player_id: BTreeMap<PlayerId, u64>,
        round_points_by_player_id: BTreeMap<PlayerId, u64>,
        multiplier: u32,
        votes_by_player_id: BTreeMap<PlayerId, [u8; 5]>,
    },

    /// `None` when nobody scored a single point.
    GameOver { winner: Option<Winner> },

    PlayerLeft {
        players: Vec<PlayerView>,
        current_spinner_id: Option<PlayerId>,
    },

    HeartbeatAck { client_time: u64, server_time: u64 },

    /// To the originating connection only. `code` follows HTTP conventions
    /// (400 bad input, 403 not a member, 404 unknown room, 409 conflict,
    /// 500 internal).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The wrapper around every frame, in both directions.
///
/// Server frames carry a per-connection `seq` starting at 0 and a
/// `timestamp` in milliseconds since the connection opened. Clients may
/// leave both out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<P> {
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub timestamp: u64,
    pub payload: P,
}
