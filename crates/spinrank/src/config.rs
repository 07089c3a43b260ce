//! Server configuration.

use std::time::Duration;

use spinrank_game::RoomConfig;
use spinrank_transport::OriginPolicy;

/// Default for [`ServerConfig::handshake_timeout`].
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `"0.0.0.0:3001"`.
    pub bind_addr: String,

    /// Which browser origins may open a socket.
    pub origins: OriginPolicy,

    /// Settings applied to every room.
    pub room: RoomConfig,

    /// How long a new peer has to complete the WebSocket upgrade.
    pub handshake_timeout: Duration,

    /// Close connections that send nothing for this long. `None` keeps
    /// idle connections open forever.
    pub idle_timeout: Option<Duration>,

    /// Seed for room codes and prompt dealing. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            origins: OriginPolicy::Any,
            room: RoomConfig::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            idle_timeout: None,
            seed: None,
        }
    }
}
