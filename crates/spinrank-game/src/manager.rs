//! Room manager: creates rooms under fresh codes, routes players to them,
//! and deletes each room once its last player leaves.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spinrank_protocol::{PlayerId, RoomCode};

use crate::room::spawn_room;
use crate::{GameError, GameSession, PlayerSender, PromptPool, RoomConfig, RoomHandle, RoomInfo};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Tracks every live room and which room each player is in.
///
/// Owned by the server state behind a mutex. Gameplay commands only need
/// [`RoomManager::handle`]; the lock is held across an actor round-trip
/// only for membership changes.
pub struct RoomManager {
    /// Active rooms, keyed by code.
    rooms: HashMap<RoomCode, RoomHandle>,

    /// A player is in at most ONE room at a time.
    player_rooms: HashMap<PlayerId, RoomCode>,

    config: RoomConfig,
    prompts: Arc<PromptPool>,

    /// Draws room codes and seeds each room's own RNG.
    rng: StdRng,
}

impl RoomManager {
    /// Creates an empty manager seeded from the OS.
    pub fn new(config: RoomConfig, prompts: Arc<PromptPool>) -> Self {
        Self::with_rng(config, prompts, StdRng::from_rng(&mut rand::rng()))
    }

    /// Creates an empty manager whose codes and prompt deals are
    /// reproducible.
    pub fn with_seed(config: RoomConfig, prompts: Arc<PromptPool>, seed: u64) -> Self {
        Self::with_rng(config, prompts, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RoomConfig, prompts: Arc<PromptPool>, rng: StdRng) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            config,
            prompts,
            rng,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Spawns an empty room and returns its code.
    ///
    /// # Errors
    /// [`GameError::InvalidRounds`] if `rounds` is out of range.
    pub fn create_room(&mut self, rounds: Option<u32>) -> Result<RoomCode, GameError> {
        let rounds = self.config.resolve_rounds(rounds)?;
        let code = self.unused_code();

        let session = GameSession::new(code.clone(), rounds)
            .with_wheel_enforcement(self.config.enforce_wheel_values);
        let rng = StdRng::seed_from_u64(self.rng.random());
        let handle = spawn_room(session, Arc::clone(&self.prompts), rng, self.config.channel_size);

        self.rooms.insert(code.clone(), handle);
        tracing::info!(room = %code, rounds, "room created");
        Ok(code)
    }

    /// Seats a player in a room, or resets their seat if they are already
    /// in it.
    ///
    /// # Errors
    /// - [`GameError::AlreadyInRoom`] if they sit in a different room
    /// - [`GameError::RoomNotFound`] for an unknown code
    pub async fn join_room(
        &mut self,
        player_id: PlayerId,
        code: &RoomCode,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), GameError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            if current != code {
                return Err(GameError::AlreadyInRoom(player_id, current.clone()));
            }
        }

        let handle = self.handle(code)?;
        handle.join(player_id, name, sender).await?;
        self.player_rooms.insert(player_id, code.clone());
        Ok(())
    }

    /// Removes a player from their room and deletes the room if that left
    /// it empty. Returns the room they were in, if any.
    pub async fn leave_room(&mut self, player_id: PlayerId) -> Result<Option<RoomCode>, GameError> {
        let Some(code) = self.player_rooms.remove(&player_id) else {
            return Ok(None);
        };
        let Some(handle) = self.rooms.get(&code).cloned() else {
            return Ok(Some(code));
        };

        match handle.leave(player_id).await {
            Ok(0) => self.destroy_room(&code).await?,
            Ok(_) => {}
            Err(e) => {
                // The actor is gone, so nobody is left to notify.
                tracing::warn!(room = %code, %player_id, error = %e, "room unavailable on leave");
                self.destroy_room(&code).await?;
            }
        }
        Ok(Some(code))
    }

    /// Deletes the room if nobody is seated. Returns `true` if it was
    /// deleted.
    ///
    /// # Errors
    /// [`GameError::RoomNotFound`] for an unknown code.
    pub async fn remove_if_empty(&mut self, code: &RoomCode) -> Result<bool, GameError> {
        let handle = self.handle(code)?;
        let empty = match handle.get_info().await {
            Ok(info) => info.player_count == 0,
            Err(GameError::RoomUnavailable(_)) => true,
            Err(e) => return Err(e),
        };
        if empty {
            self.destroy_room(code).await?;
        }
        Ok(empty)
    }

    /// Shuts a room down and forgets everyone in it.
    pub async fn destroy_room(&mut self, code: &RoomCode) -> Result<(), GameError> {
        let handle = self
            .rooms
            .remove(code)
            .ok_or_else(|| GameError::RoomNotFound(code.clone()))?;
        let _ = handle.shutdown().await;
        self.player_rooms.retain(|_, c| c != code);
        tracing::info!(room = %code, "room destroyed");
        Ok(())
    }

    /// Looks up a room. The handle is a cheap clone, so callers can drop
    /// the manager lock before awaiting it.
    pub fn handle(&self, code: &RoomCode) -> Result<RoomHandle, GameError> {
        self.rooms
            .get(code)
            .cloned()
            .ok_or_else(|| GameError::RoomNotFound(code.clone()))
    }

    pub async fn get_room_info(&self, code: &RoomCode) -> Result<RoomInfo, GameError> {
        self.handle(code)?.get_info().await
    }

    /// Returns the room a player is in, if any.
    pub fn player_room(&self, player_id: PlayerId) -> Option<&RoomCode> {
        self.player_rooms.get(&player_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }

    /// Draws codes until one is not in use.
    fn unused_code(&mut self) -> RoomCode {
        loop {
            let code = generate_code(&mut self.rng, self.config.code_length);
            if !self.rooms.contains_key(&code) {
                return code;
            }
            tracing::debug!(room = %code, "room code collision, retrying");
        }
    }
}

fn generate_code<R: Rng + ?Sized>(rng: &mut R, length: usize) -> RoomCode {
    let raw: String = (0..length)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect();
    RoomCode::normalize(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> RoomManager {
        RoomManager::with_seed(RoomConfig::default(), Arc::new(PromptPool::default()), 1)
    }

    #[test]
    fn test_generate_code_alphabet_and_length() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let code = generate_code(&mut rng, 6);
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn test_create_room_retries_on_collision() {
        // One-character codes: every one of the 36 must get used.
        let config = RoomConfig {
            code_length: 1,
            ..RoomConfig::default()
        };
        let mut mgr = RoomManager::with_seed(config, Arc::new(PromptPool::default()), 7);
        for _ in 0..CODE_ALPHABET.len() {
            mgr.create_room(None).unwrap();
        }
        assert_eq!(mgr.room_count(), CODE_ALPHABET.len());
    }

    #[tokio::test]
    async fn test_create_room_invalid_rounds() {
        let mut mgr = manager();
        assert!(matches!(mgr.create_room(Some(0)), Err(GameError::InvalidRounds { .. })));
        assert_eq!(mgr.room_count(), 0);
    }

    #[tokio::test]
    async fn test_same_seed_same_codes() {
        let mut a = manager();
        let mut b = manager();
        assert_eq!(a.create_room(None).unwrap(), b.create_room(None).unwrap());
    }

    #[tokio::test]
    async fn test_join_room_unknown_code() {
        let mut mgr = manager();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let code = RoomCode::normalize("NOPE00");
        let result = mgr.join_room(PlayerId(1), &code, "a".into(), tx).await;
        assert!(matches!(result, Err(GameError::RoomNotFound(_))));
    }
}
