//! Per-connection handler: identity, action routing and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Start a writer task that numbers and encodes outbound events
//!   2. Send `welcome{playerId}`
//!   3. Loop: decode envelopes → dispatch to the registry or a room
//!   4. On exit, leave the room (via a drop guard)
//!
//! Every failure while handling an action is answered with an
//! `error{code, message}` to this connection only.

use std::sync::Arc;
use std::time::Instant;

use spinrank_game::{Command, GameError, PlayerSender};
use spinrank_protocol::{
    ClientAction, Codec, Envelope, MultiplierInput, PlayerId, RoomCode, ServerEvent,
};
use spinrank_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::SpinrankError;
use crate::server::ServerState;

/// Drop guard that takes the player out of their room when the handler
/// exits, even if it panics. `Drop` is synchronous, so the async leave
/// runs as a fire-and-forget task.
struct RoomGuard<C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for RoomGuard<C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut rooms = state.rooms.lock().await;
            match rooms.leave_room(player_id).await {
                Ok(Some(room)) => tracing::debug!(%player_id, %room, "left room on disconnect"),
                Ok(None) => {}
                Err(e) => tracing::warn!(%player_id, error = %e, "leave on disconnect failed"),
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), SpinrankError> {
    let conn = Arc::new(conn);
    let player_id = PlayerId::from(conn.id());
    tracing::info!(%player_id, "player connected");

    let start = Instant::now();
    let (events, outbound) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(Arc::clone(&conn), Arc::clone(&state), outbound, start));
    let _ = events.send(ServerEvent::Welcome { player_id });

    let _guard = RoomGuard {
        player_id,
        state: Arc::clone(&state),
    };

    loop {
        let frame = match state.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(frame) => frame,
                Err(_) => {
                    tracing::info!(%player_id, "connection idle, closing");
                    break;
                }
            },
            None => conn.recv().await,
        };

        let data = match frame {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let envelope: Envelope<ClientAction> = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                let _ = events.send(ServerEvent::Error {
                    code: 400,
                    message: format!("invalid message: {e}"),
                });
                continue;
            }
        };

        if let Err(e) = dispatch(&state, player_id, envelope.payload, &events, start).await {
            tracing::debug!(%player_id, error = %e, code = e.status_code(), "action rejected");
            let _ = events.send(ServerEvent::Error {
                code: e.status_code(),
                message: e.to_string(),
            });
        }
    }

    writer.abort();
    let _ = conn.close().await;
    // _guard drops here → leave_room fires.
    Ok(())
}

/// Routes one client action.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    action: ClientAction,
    events: &PlayerSender,
    start: Instant,
) -> Result<(), GameError> {
    match action {
        ClientAction::CreateGame { name, rounds } => {
            let mut rooms = state.rooms.lock().await;
            if let Some(current) = rooms.player_room(player_id) {
                return Err(GameError::AlreadyInRoom(player_id, current.clone()));
            }
            let code = rooms.create_room(rounds)?;
            let _ = events.send(ServerEvent::GameCreated { code: code.clone() });
            if let Err(e) = rooms.join_room(player_id, &code, name, events.clone()).await {
                let _ = rooms.destroy_room(&code).await;
                return Err(e);
            }
        }

        ClientAction::JoinGame { code, name } => {
            let code = RoomCode::normalize(&code);
            let mut rooms = state.rooms.lock().await;
            rooms.join_room(player_id, &code, name, events.clone()).await?;
        }

        ClientAction::StartGame { code } => {
            apply(state, &code, player_id, Command::StartGame).await?;
        }

        ClientAction::SpinComplete { code, multiplier } => {
            let multiplier = MultiplierInput::coerce(multiplier.as_ref());
            apply(state, &code, player_id, Command::SpinComplete { multiplier }).await?;
        }

        ClientAction::SubmitVotes {
            code,
            votes,
            wheel_multiplier,
        } => {
            let multiplier = MultiplierInput::coerce(wheel_multiplier.as_ref());
            apply(state, &code, player_id, Command::SubmitVotes { votes, multiplier }).await?;
        }

        ClientAction::Heartbeat { client_time } => {
            let _ = events.send(ServerEvent::HeartbeatAck {
                client_time,
                server_time: start.elapsed().as_millis() as u64,
            });
        }
    }
    Ok(())
}

/// Sends a gameplay command to the named room without holding the
/// registry lock while the room works.
async fn apply<C: Codec>(
    state: &ServerState<C>,
    code: &str,
    player_id: PlayerId,
    command: Command,
) -> Result<(), GameError> {
    let code = RoomCode::normalize(code);
    let room = state.rooms.lock().await.handle(&code)?;
    room.apply(player_id, command).await
}

/// Drains this connection's event queue onto the socket, wrapping each
/// event in an envelope with the next sequence number.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut outbound: mpsc::UnboundedReceiver<ServerEvent>,
    start: Instant,
) {
    let mut seq: u64 = 0;

    while let Some(payload) = outbound.recv().await {
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: start.elapsed().as_millis() as u64,
            payload,
        };
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
