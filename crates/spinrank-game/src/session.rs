//! The per-room game state machine.
//!
//! [`GameSession`] owns everything one room knows: the roster in join
//! order, whose turn it is to spin, the round counter, the prompts in play
//! and the votes collected so far. It performs no I/O. Callers feed it
//! [`Command`]s through [`GameSession::apply`] and broadcast whatever
//! events it returns, which keeps the room actor a thin adapter and lets
//! every rule be tested without a runtime.
//!
//! Randomness (prompt dealing) is injected, so a seeded RNG reproduces a
//! whole game.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use spinrank_protocol::{PlayerId, PlayerView, RoomCode, ServerEvent, Winner};

use crate::{GameError, Phase, PromptPool, Ranking, is_wheel_value, score_round, wheel_label};

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub score: u64,
}

/// An input to the state machine, already decoded and validated for shape
/// by the transport layer. The acting player is passed alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The room's creator takes the first seat.
    CreateGame { name: String },
    JoinGame { name: String },
    StartGame,
    /// The spinner's wheel stopped. `multiplier` is already coerced.
    SpinComplete { multiplier: u32 },
    SubmitVotes { votes: Vec<i64>, multiplier: u32 },
    Disconnect,
}

/// State of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    code: RoomCode,
    players: HashMap<PlayerId, Player>,
    /// Join order. Spinner rotation and tie-breaks follow this.
    turn_order: Vec<PlayerId>,
    current_spinner: Option<PlayerId>,
    rounds_configured: u32,
    rounds_completed: u32,
    current_prompts: Vec<String>,
    votes: HashMap<PlayerId, Ranking>,
    phase: Phase,
    /// Set when a round is dealt, cleared once it has been scored.
    round_open: bool,
    /// Most recent wheel value reported this round.
    last_multiplier: u32,
    enforce_wheel_values: bool,
}

impl GameSession {
    /// Creates an empty session. `rounds_configured` is per player.
    pub fn new(code: RoomCode, rounds_configured: u32) -> Self {
        Self {
            code,
            players: HashMap::new(),
            turn_order: Vec::new(),
            current_spinner: None,
            rounds_configured,
            rounds_completed: 0,
            current_prompts: Vec::new(),
            votes: HashMap::new(),
            phase: Phase::Waiting,
            round_open: false,
            last_multiplier: 1,
            enforce_wheel_values: false,
        }
    }

    /// Rejects multipliers that are not on the wheel.
    pub fn with_wheel_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_wheel_values = enforce;
        self
    }

    // -----------------------------------------------------------------
    // Command dispatch
    // -----------------------------------------------------------------

    /// Applies one command from `sender` and returns the events to
    /// broadcast to the room, in order.
    ///
    /// On error the session is left exactly as it was.
    ///
    /// # Errors
    /// - [`GameError::NotInRoom`] if `sender` is not seated and the
    ///   command needs a seat
    /// - [`GameError::IllegalMultiplier`] when wheel enforcement is on
    /// - [`GameError::InvalidVoteShape`] / [`GameError::NoOpenRound`] from
    ///   [`GameSession::submit_vote`]
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        sender: PlayerId,
        command: Command,
        prompts: &PromptPool,
        rng: &mut R,
    ) -> Result<Vec<ServerEvent>, GameError> {
        let events = match command {
            Command::CreateGame { name } | Command::JoinGame { name } => {
                vec![self.add_player(sender, name)]
            }
            Command::StartGame => {
                self.require_member(sender)?;
                vec![self.start_round(prompts, rng)]
            }
            Command::SpinComplete { multiplier } => {
                self.require_member(sender)?;
                self.check_multiplier(multiplier)?;
                vec![self.finish_spinning(multiplier)]
            }
            Command::SubmitVotes { votes, multiplier } => {
                self.require_member(sender)?;
                self.check_multiplier(multiplier)?;
                let ranking = Ranking::try_from(votes.as_slice())?;
                self.submit_vote(sender, ranking, multiplier)?
                    .into_iter()
                    .collect()
            }
            Command::Disconnect => match self.remove_player(sender) {
                // The leaver may have been the last vote outstanding.
                Some(left) => std::iter::once(left)
                    .chain(self.close_round_if_complete())
                    .collect(),
                None => Vec::new(),
            },
        };
        Ok(events)
    }

    fn require_member(&self, player: PlayerId) -> Result<(), GameError> {
        if self.players.contains_key(&player) {
            Ok(())
        } else {
            Err(GameError::NotInRoom(player, self.code.clone()))
        }
    }

    fn check_multiplier(&self, multiplier: u32) -> Result<(), GameError> {
        if self.enforce_wheel_values && !is_wheel_value(multiplier) {
            return Err(GameError::IllegalMultiplier(multiplier));
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------

    /// Seats a player, or resets an existing seat (score back to 0, turn
    /// position kept). The first player seated in the lobby becomes the
    /// spinner.
    pub fn add_player(&mut self, id: PlayerId, name: String) -> ServerEvent {
        if self.players.insert(id, Player { name, score: 0 }).is_none() {
            self.turn_order.push(id);
        }
        if self.current_spinner.is_none() && self.phase == Phase::Waiting {
            self.current_spinner = Some(id);
        }
        ServerEvent::PlayerJoined {
            players: self.roster(),
            current_spinner_id: self.current_spinner,
        }
    }

    /// Deals the next round, or ends the game once the round budget is
    /// spent. A finished game answers every later call with `gameOver`
    /// again.
    pub fn start_round<R: Rng + ?Sized>(
        &mut self,
        prompts: &PromptPool,
        rng: &mut R,
    ) -> ServerEvent {
        if self.phase.is_terminal() || self.rounds_completed >= self.total_rounds() {
            self.phase = Phase::GameOver;
            self.round_open = false;
            tracing::info!(room = %self.code, rounds = self.rounds_completed, "game over");
            return ServerEvent::GameOver { winner: self.winner() };
        }

        self.current_prompts = prompts.sample(rng);
        self.votes.clear();
        self.phase = Phase::Spinning;
        self.rounds_completed += 1;
        self.round_open = true;
        self.last_multiplier = 1;
        tracing::info!(
            room = %self.code,
            round = self.rounds_completed,
            total = self.total_rounds(),
            "round started"
        );

        ServerEvent::RoundStarted {
            prompts: self.current_prompts.clone(),
            current_spinner_id: self.current_spinner,
            round: self.rounds_completed,
            total_rounds: self.total_rounds(),
        }
    }

    /// Records the wheel result and passes the turn to the next player in
    /// join order.
    pub fn finish_spinning(&mut self, multiplier: u32) -> ServerEvent {
        let previous = self.current_spinner;
        self.current_spinner = self.next_in_turn(previous);
        self.phase = Phase::Playing;
        self.last_multiplier = multiplier;
        tracing::debug!(
            room = %self.code,
            multiplier,
            segment = wheel_label(multiplier).unwrap_or("off-wheel"),
            "wheel stopped"
        );
        ServerEvent::SpinningComplete {
            multiplier,
            current_spinner_id: self.current_spinner,
            previous_spinner_id: previous,
        }
    }

    /// Stores `player`'s ranking, replacing any earlier one this round.
    /// When everyone seated has voted the round is scored and the results
    /// returned.
    ///
    /// # Errors
    /// [`GameError::NotInRoom`] for an unseated player,
    /// [`GameError::NoOpenRound`] if no round is waiting for votes.
    pub fn submit_vote(
        &mut self,
        player: PlayerId,
        ranking: Ranking,
        multiplier: u32,
    ) -> Result<Option<ServerEvent>, GameError> {
        self.require_member(player)?;
        if !self.round_open {
            return Err(GameError::NoOpenRound(self.code.clone()));
        }

        self.votes.insert(player, ranking);
        self.last_multiplier = multiplier;
        tracing::debug!(
            room = %self.code,
            %player,
            votes = self.votes.len(),
            players = self.players.len(),
            "vote recorded"
        );

        Ok(self.close_round_if_complete())
    }

    /// Scores the open round once every seated player has voted, using
    /// the last multiplier reported.
    fn close_round_if_complete(&mut self) -> Option<ServerEvent> {
        let complete = self.round_open
            && !self.players.is_empty()
            && self.votes.len() == self.players.len();
        complete.then(|| self.calculate_scores(self.last_multiplier))
    }

    /// Scores the round against the current spinner and closes it.
    pub fn calculate_scores(&mut self, multiplier: u32) -> ServerEvent {
        let round_points =
            score_round(&self.turn_order, self.current_spinner, &self.votes, multiplier);
        for (id, points) in &round_points {
            if let Some(player) = self.players.get_mut(id) {
                player.score += points;
            }
        }

        self.round_open = false;
        self.phase = Phase::Waiting;
        tracing::info!(
            room = %self.code,
            round = self.rounds_completed,
            multiplier,
            "round scored"
        );

        ServerEvent::RoundResults {
            scores_by_player_id: round_points
                .keys()
                .filter_map(|id| self.players.get(id).map(|p| (*id, p.score)))
                .collect(),
            round_points_by_player_id: round_points,
            multiplier,
            votes_by_player_id: self.votes.iter().map(|(id, r)| (*id, r.ranks())).collect(),
        }
    }

    /// Removes a player and their pending vote. Returns `None` if they
    /// were not seated.
    ///
    /// If they held the spin, it passes to whoever followed them in turn
    /// order. A round this leaves fully voted is closed by
    /// [`GameSession::apply`], not here.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<ServerEvent> {
        self.players.remove(&id)?;
        self.votes.remove(&id);
        let position = self.turn_order.iter().position(|p| *p == id);
        self.turn_order.retain(|p| *p != id);

        if self.current_spinner == Some(id) {
            self.current_spinner = match position {
                Some(i) if !self.turn_order.is_empty() => {
                    Some(self.turn_order[i % self.turn_order.len()])
                }
                _ => None,
            };
        }

        Some(ServerEvent::PlayerLeft {
            players: self.roster(),
            current_spinner_id: self.current_spinner,
        })
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_spinner(&self) -> Option<PlayerId> {
        self.current_spinner
    }

    pub fn rounds_configured(&self) -> u32 {
        self.rounds_configured
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    /// The round budget: rounds per player times the players seated now.
    /// Recomputed on every call, so joins and leaves move the finish line.
    pub fn total_rounds(&self) -> u32 {
        self.rounds_configured
            .saturating_mul(u32::try_from(self.players.len()).unwrap_or(u32::MAX))
    }

    pub fn current_prompts(&self) -> &[String] {
        &self.current_prompts
    }

    pub fn is_round_open(&self) -> bool {
        self.round_open
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn has_voted(&self, id: PlayerId) -> bool {
        self.votes.contains_key(&id)
    }

    /// The roster in join order.
    pub fn roster(&self) -> Vec<PlayerView> {
        self.turn_order
            .iter()
            .filter_map(|id| {
                self.players.get(id).map(|p| PlayerView {
                    id: *id,
                    name: p.name.clone(),
                    score: p.score,
                })
            })
            .collect()
    }

    /// Highest score above zero; the earliest joiner wins a tie.
    pub fn winner(&self) -> Option<Winner> {
        let mut best: Option<Winner> = None;
        for view in self.roster() {
            let leading = best.as_ref().map_or(0, |w| w.score);
            if view.score > leading {
                best = Some(Winner {
                    id: view.id,
                    name: view.name,
                    score: view.score,
                });
            }
        }
        best
    }

    fn next_in_turn(&self, current: Option<PlayerId>) -> Option<PlayerId> {
        if self.turn_order.is_empty() {
            return None;
        }
        let next = current
            .and_then(|c| self.turn_order.iter().position(|p| *p == c))
            .map_or(0, |i| (i + 1) % self.turn_order.len());
        Some(self.turn_order[next])
    }
}
