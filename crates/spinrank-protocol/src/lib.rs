//! Wire protocol for Spinrank.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`Envelope`], [`ClientAction`], [`ServerEvent`], ids and
//!   roster views) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! It knows nothing about rooms or scoring; the game crate gives these
//! messages their meaning.
//!
//! ```text
//! Transport (frames) → Protocol (Envelope<ClientAction>) → Game (commands)
//! ```

mod codec;
mod error;
mod multiplier;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use multiplier::MultiplierInput;
pub use types::{ClientAction, Envelope, PlayerId, PlayerView, RoomCode, ServerEvent, Winner};
