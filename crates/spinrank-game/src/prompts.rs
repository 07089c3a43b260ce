//! The prompt pool rounds are dealt from.

use std::path::Path;

use rand::Rng;
use rand::seq::index;

use crate::GameError;

/// Number of prompts dealt each round.
pub const PROMPTS_PER_ROUND: usize = 5;

const DEFAULT_PROMPTS: [&str; 10] = [
    "Jump from a moving car",
    "Taken hostage",
    "Chased by a gorilla",
    "Scuba tank runs out of air at 50-feet below",
    "Swim in shark-infested waters",
    "Armed robber in the house",
    "Stuck in a sinking car",
    "Jump from a building into a dumpster",
    "Spend one week in prison",
    "Surrounded by dozens of snakes",
];

/// An immutable list of distinct, non-empty prompts.
///
/// Shared by every room behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPool {
    prompts: Vec<String>,
}

impl PromptPool {
    /// Builds a pool from a list of prompts.
    ///
    /// Entries are trimmed; blanks and repeats are dropped.
    ///
    /// # Errors
    /// [`GameError::PromptPoolTooSmall`] if fewer than
    /// [`PROMPTS_PER_ROUND`] distinct prompts remain.
    pub fn new<I, S>(prompts: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distinct: Vec<String> = Vec::new();
        for prompt in prompts {
            let prompt = prompt.as_ref().trim();
            if !prompt.is_empty() && !distinct.iter().any(|p| p == prompt) {
                distinct.push(prompt.to_owned());
            }
        }

        if distinct.len() < PROMPTS_PER_ROUND {
            return Err(GameError::PromptPoolTooSmall {
                found: distinct.len(),
                needed: PROMPTS_PER_ROUND,
            });
        }
        Ok(Self { prompts: distinct })
    }

    /// Reads a newline-separated prompt file.
    ///
    /// # Errors
    /// [`GameError::PromptFile`] if the file can't be read, otherwise as
    /// [`PromptPool::new`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let text = std::fs::read_to_string(path).map_err(GameError::PromptFile)?;
        Self::new(text.lines())
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn contains(&self, prompt: &str) -> bool {
        self.prompts.iter().any(|p| p == prompt)
    }

    /// Deals [`PROMPTS_PER_ROUND`] distinct prompts, uniformly without
    /// replacement.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        index::sample(rng, self.prompts.len(), PROMPTS_PER_ROUND)
            .into_iter()
            .map(|i| self.prompts[i].clone())
            .collect()
    }
}

impl Default for PromptPool {
    /// The ten built-in prompts.
    fn default() -> Self {
        Self {
            prompts: DEFAULT_PROMPTS.iter().map(|p| (*p).to_owned()).collect(),
        }
    }
}
