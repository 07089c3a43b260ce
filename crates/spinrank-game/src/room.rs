//! Room actor: an isolated Tokio task that owns one [`GameSession`].
//!
//! Each room runs in its own task and talks to the outside world only
//! through an mpsc channel, so commands for one room are applied strictly
//! in arrival order. Two players' last votes can never both trigger
//! scoring, and a fault in one room can't reach another.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use spinrank_protocol::{PlayerId, RoomCode, ServerEvent};
use tokio::sync::{mpsc, oneshot};

use crate::{Command, GameError, GameSession, Phase, PromptPool};

/// Channel sender for delivering events to a player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in each variant is the reply channel: the caller
/// sends a command and waits for the answer on it.
pub(crate) enum RoomCommand {
    /// Seat a player, or reset their seat if already present.
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), GameError>>,
    },

    /// Remove a player. Replies with the number of players left.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<usize>,
    },

    /// A gameplay command from a seated player.
    Apply {
        player_id: PlayerId,
        command: Command,
        reply: oneshot::Sender<Result<(), GameError>>,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    /// A copy of the full session.
    Snapshot {
        reply: oneshot::Sender<GameSession>,
    },

    Shutdown,
}

/// A summary of room state (not the session itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub phase: Phase,
    pub player_count: usize,
    pub rounds_completed: u32,
    pub total_rounds: u32,
}

/// Handle to a running room actor.
///
/// Cheap to clone; the `RoomManager` holds one per room and hands out
/// copies so callers can await the actor without holding the registry lock.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Seats a player and registers where their events go.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), GameError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            name,
            sender,
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())?
    }

    /// Removes a player and returns how many remain.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, GameError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Leave { player_id, reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Applies a gameplay command and waits until its events are queued
    /// for delivery.
    pub async fn apply(&self, player_id: PlayerId, command: Command) -> Result<(), GameError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Apply {
            player_id,
            command,
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())?
    }

    pub async fn get_info(&self) -> Result<RoomInfo, GameError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    pub async fn snapshot(&self) -> Result<GameSession, GameError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, command: RoomCommand) -> Result<(), GameError> {
        self.sender.send(command).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> GameError {
        GameError::RoomUnavailable(self.code.clone())
    }
}

/// The actor state. Runs inside a Tokio task.
struct RoomActor {
    session: GameSession,
    senders: HashMap<PlayerId, PlayerSender>,
    prompts: Arc<PromptPool>,
    rng: StdRng,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        let code = self.session.code().clone();
        tracing::info!(room = %code, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    player_id,
                    name,
                    sender,
                    reply,
                } => {
                    let _ = reply.send(self.handle_join(player_id, name, sender));
                }
                RoomCommand::Leave { player_id, reply } => {
                    let _ = reply.send(self.handle_leave(player_id));
                }
                RoomCommand::Apply {
                    player_id,
                    command,
                    reply,
                } => {
                    let _ = reply.send(self.handle_apply(player_id, command));
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.session.clone());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room = %code, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room = %code, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), GameError> {
        // Register first so the joiner sees their own playerJoined.
        self.senders.insert(player_id, sender);
        let command = if self.session.is_empty() {
            Command::CreateGame { name }
        } else {
            Command::JoinGame { name }
        };
        let events = self.apply(player_id, command)?;
        tracing::info!(
            room = %self.session.code(),
            %player_id,
            players = self.session.player_count(),
            "player joined"
        );
        self.dispatch(events);
        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> usize {
        self.senders.remove(&player_id);
        match self.apply(player_id, Command::Disconnect) {
            Ok(events) => {
                if !events.is_empty() {
                    tracing::info!(
                        room = %self.session.code(),
                        %player_id,
                        players = self.session.player_count(),
                        "player left"
                    );
                }
                self.dispatch(events);
            }
            Err(e) => {
                tracing::warn!(room = %self.session.code(), %player_id, error = %e, "leave failed")
            }
        }
        self.session.player_count()
    }

    fn handle_apply(&mut self, player_id: PlayerId, command: Command) -> Result<(), GameError> {
        match self.apply(player_id, command) {
            Ok(events) => {
                self.dispatch(events);
                Ok(())
            }
            Err(e) => {
                let room = self.session.code();
                tracing::debug!(%room, %player_id, error = %e, "command rejected");
                Err(e)
            }
        }
    }

    fn apply(
        &mut self,
        player_id: PlayerId,
        command: Command,
    ) -> Result<Vec<ServerEvent>, GameError> {
        self.session.apply(player_id, command, &self.prompts, &mut self.rng)
    }

    /// Broadcasts events to every seated player. A player whose
    /// connection is gone is skipped.
    fn dispatch(&self, events: Vec<ServerEvent>) {
        for event in events {
            for sender in self.senders.values() {
                let _ = sender.send(event.clone());
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.session.code().clone(),
            phase: self.session.phase(),
            player_count: self.session.player_count(),
            rounds_completed: self.session.rounds_completed(),
            total_rounds: self.session.total_rounds(),
        }
    }
}

/// Spawns a room actor for `session` and returns a handle to it.
///
/// `channel_size` bounds the mailbox; senders wait when it is full.
pub(crate) fn spawn_room(
    session: GameSession,
    prompts: Arc<PromptPool>,
    rng: StdRng,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let code = session.code().clone();

    let actor = RoomActor {
        session,
        senders: HashMap::new(),
        prompts,
        rng,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
