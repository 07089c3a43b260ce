//! `SpinrankServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → rooms.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use spinrank_game::{PromptPool, RoomConfig, RoomManager};
use spinrank_protocol::{Codec, JsonCodec};
use spinrank_transport::{Incoming, OriginPolicy, Transport, TransportError, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{ServerConfig, SpinrankError};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The room
/// registry is behind a `Mutex`; each room's game state lives in its own
/// actor task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) codec: C,
    pub(crate) handshake_timeout: Duration,
    pub(crate) idle_timeout: Option<Duration>,
}

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,ignore
/// let server = SpinrankServer::builder()
///     .bind("0.0.0.0:3001")
///     .prompts(PromptPool::from_file("scenarios.txt")?)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct SpinrankServerBuilder {
    config: ServerConfig,
    prompts: PromptPool,
}

impl SpinrankServerBuilder {
    /// Creates a new builder with default settings and the built-in
    /// prompts.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            prompts: PromptPool::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn origins(mut self, origins: OriginPolicy) -> Self {
        self.config.origins = origins;
        self
    }

    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    /// Drops peers that have not finished the WebSocket upgrade after
    /// `timeout`.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = Some(timeout);
        self
    }

    /// Makes room codes and prompt deals reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn prompts(mut self, prompts: PromptPool) -> Self {
        self.prompts = prompts;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<SpinrankServer<JsonCodec>, SpinrankError> {
        let ServerConfig {
            bind_addr,
            origins,
            room,
            handshake_timeout,
            idle_timeout,
            seed,
        } = self.config;

        let transport = WebSocketTransport::bind(&bind_addr, origins).await?;

        let prompts = Arc::new(self.prompts);
        let rooms = match seed {
            Some(seed) => RoomManager::with_seed(room, prompts, seed),
            None => RoomManager::new(room, prompts),
        };

        let state = Arc::new(ServerState {
            rooms: Mutex::new(rooms),
            codec: JsonCodec,
            handshake_timeout,
            idle_timeout,
        });

        Ok(SpinrankServer { transport, state })
    }
}

impl Default for SpinrankServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SpinrankServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SpinrankServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> SpinrankServerBuilder {
        SpinrankServerBuilder::new()
    }
}

impl<C: Codec> SpinrankServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning a task per peer that completes the
    /// WebSocket upgrade and then handles the connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), SpinrankError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Spinrank server running");

        loop {
            let pending = match self.transport.accept().await {
                Ok(pending) => pending,
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                    continue;
                }
            };
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let addr = pending.peer_addr();
                let conn = match pending.upgrade(state.handshake_timeout).await {
                    Ok(conn) => conn,
                    Err(TransportError::OriginRejected(origin)) => {
                        tracing::warn!(%addr, %origin, "connection from disallowed origin refused");
                        return;
                    }
                    Err(e) => {
                        tracing::debug!(%addr, error = %e, "handshake failed");
                        return;
                    }
                };
                if let Err(e) = handle_connection(conn, state).await {
                    tracing::debug!(error = %e, "connection ended with error");
                }
            });
        }
    }
}
