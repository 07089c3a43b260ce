//! Unified error type for the server.

use spinrank_game::GameError;
use spinrank_protocol::ProtocolError;
use spinrank_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so `?`
/// converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SpinrankError {
    /// Binding, accepting, sending or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room or game rule refused the request.
    #[error(transparent)]
    Game(#[from] GameError),
}
