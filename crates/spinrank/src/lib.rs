//! # Spinrank
//!
//! Real-time party game server. Players join a room by its short code,
//! take turns spinning a multiplier wheel, privately rank five prompts and
//! score on how well their rankings agree.
//!
//! This crate ties the layers together: the WebSocket transport, the JSON
//! wire protocol and the per-room game actors.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spinrank::prelude::*;
//!
//! # async fn run() -> Result<(), SpinrankError> {
//! let server = SpinrankServer::builder()
//!     .bind("0.0.0.0:3001")
//!     .origins(OriginPolicy::allow(["http://localhost:5173"]))
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_HANDSHAKE_TIMEOUT, ServerConfig};
pub use error::SpinrankError;
pub use server::{SpinrankServer, SpinrankServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{
        DEFAULT_HANDSHAKE_TIMEOUT, ServerConfig, SpinrankError, SpinrankServer,
        SpinrankServerBuilder,
    };
    pub use spinrank_game::{GameError, PromptPool, RoomConfig};
    pub use spinrank_protocol::{
        ClientAction, Codec, Envelope, JsonCodec, PlayerId, RoomCode, ServerEvent,
    };
    pub use spinrank_transport::OriginPolicy;
}
