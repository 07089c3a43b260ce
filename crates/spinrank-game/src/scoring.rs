//! Round scoring.
//!
//! Each non-spinner earns one point per position where their ranking
//! agrees with another non-spinner's, summed over every other non-spinner,
//! then multiplied by the wheel value. The spinner earns the best
//! multiplied score of the round.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use spinrank_protocol::PlayerId;

use crate::{GameError, PROMPTS_PER_ROUND};

/// One player's ranking of the five prompts: `ranks[i]` is the rank given
/// to prompt `i`. Every rank is in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ranking([u8; PROMPTS_PER_ROUND]);

impl Ranking {
    pub fn ranks(&self) -> [u8; PROMPTS_PER_ROUND] {
        self.0
    }

    /// Number of positions where both rankings agree.
    pub fn matches(&self, other: &Ranking) -> u64 {
        self.0.iter().zip(other.0.iter()).filter(|(a, b)| a == b).count() as u64
    }
}

impl TryFrom<&[i64]> for Ranking {
    type Error = GameError;

    fn try_from(votes: &[i64]) -> Result<Self, Self::Error> {
        if votes.len() != PROMPTS_PER_ROUND {
            return Err(GameError::InvalidVoteShape(format!(
                "expected {PROMPTS_PER_ROUND} ranks, got {}",
                votes.len()
            )));
        }
        let mut ranks = [0u8; PROMPTS_PER_ROUND];
        for (slot, &vote) in ranks.iter_mut().zip(votes) {
            *slot = u8::try_from(vote)
                .ok()
                .filter(|r| (1..=PROMPTS_PER_ROUND as u8).contains(r))
                .ok_or_else(|| {
                    GameError::InvalidVoteShape(format!("rank {vote} is outside 1..=5"))
                })?;
        }
        Ok(Self(ranks))
    }
}

/// Computes this round's points for every player in `order`.
///
/// `spinner` is excluded from the pairwise comparison and instead receives
/// the highest multiplied score. A non-spinner with no recorded vote
/// matches nobody. With a single non-spinner nobody can match, so
/// everyone scores 0.
pub fn score_round(
    order: &[PlayerId],
    spinner: Option<PlayerId>,
    votes: &HashMap<PlayerId, Ranking>,
    multiplier: u32,
) -> BTreeMap<PlayerId, u64> {
    let voters: Vec<PlayerId> = order.iter().copied().filter(|id| Some(*id) != spinner).collect();

    let mut points = BTreeMap::new();
    let mut max_points = 0;
    for &id in &voters {
        let match_score: u64 = match votes.get(&id) {
            Some(mine) => voters
                .iter()
                .filter(|other| **other != id)
                .filter_map(|other| votes.get(other))
                .map(|theirs| mine.matches(theirs))
                .sum(),
            None => 0,
        };
        let round_points = match_score * u64::from(multiplier);
        max_points = max_points.max(round_points);
        points.insert(id, round_points);
    }

    if let Some(spinner) = spinner.filter(|s| order.contains(s)) {
        points.insert(spinner, max_points);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking(votes: [i64; 5]) -> Ranking {
        Ranking::try_from(&votes[..]).unwrap()
    }

    #[test]
    fn test_ranking_rejects_wrong_length() {
        assert!(matches!(
            Ranking::try_from(&[1, 2, 3][..]),
            Err(GameError::InvalidVoteShape(_))
        ));
        assert!(Ranking::try_from(&[1, 2, 3, 4, 5, 1][..]).is_err());
    }

    #[test]
    fn test_ranking_rejects_out_of_range() {
        assert!(Ranking::try_from(&[0, 2, 3, 4, 5][..]).is_err());
        assert!(Ranking::try_from(&[1, 2, 3, 4, 6][..]).is_err());
        assert!(Ranking::try_from(&[-1, 2, 3, 4, 5][..]).is_err());
    }

    #[test]
    fn test_ranking_allows_repeated_ranks() {
        assert_eq!(ranking([1, 1, 1, 1, 1]).ranks(), [1; 5]);
    }

    #[test]
    fn test_matches_counts_equal_positions() {
        assert_eq!(ranking([1, 2, 3, 4, 5]).matches(&ranking([1, 2, 3, 5, 4])), 3);
        assert_eq!(ranking([1, 2, 3, 4, 5]).matches(&ranking([5, 4, 3, 2, 1])), 1);
    }

    #[test]
    fn test_score_round_three_players_spinner_takes_max() {
        let (a, b, c) = (PlayerId(1), PlayerId(2), PlayerId(3));
        let votes = HashMap::from([
            (a, ranking([5, 4, 3, 2, 1])),
            (b, ranking([1, 2, 3, 4, 5])),
            (c, ranking([1, 2, 3, 5, 4])),
        ]);
        let points = score_round(&[a, b, c], Some(a), &votes, 2);
        assert_eq!(points[&b], 6);
        assert_eq!(points[&c], 6);
        assert_eq!(points[&a], 6);
    }

    #[test]
    fn test_score_round_two_players_all_zero() {
        let (a, b) = (PlayerId(1), PlayerId(2));
        let votes = HashMap::from([(a, ranking([1, 2, 3, 4, 5])), (b, ranking([1, 2, 3, 4, 5]))]);
        let points = score_round(&[a, b], Some(a), &votes, 8);
        assert_eq!(points[&a], 0);
        assert_eq!(points[&b], 0);
    }

    #[test]
    fn test_score_round_spinner_equals_max_of_voters() {
        let ids: Vec<PlayerId> = (1..=4).map(PlayerId).collect();
        let votes = HashMap::from([
            (ids[1], ranking([1, 2, 3, 4, 5])),
            (ids[2], ranking([1, 2, 3, 4, 5])),
            (ids[3], ranking([5, 4, 3, 2, 1])),
        ]);
        let points = score_round(&ids, Some(ids[0]), &votes, 3);
        // ids[1] vs ids[2]: 5 matches, vs ids[3]: 1 match.
        assert_eq!(points[&ids[1]], 18);
        assert_eq!(points[&ids[3]], 6);
        let max_voter = ids[1..].iter().map(|id| points[id]).max().unwrap();
        assert_eq!(points[&ids[0]], max_voter);
    }

    #[test]
    fn test_score_round_missing_vote_scores_zero() {
        let (a, b, c) = (PlayerId(1), PlayerId(2), PlayerId(3));
        let votes = HashMap::from([(b, ranking([1, 2, 3, 4, 5]))]);
        let points = score_round(&[a, b, c], Some(a), &votes, 1);
        assert_eq!(points[&b], 0);
        assert_eq!(points[&c], 0);
    }
}
