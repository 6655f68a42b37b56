//! Match instance and lifecycle state machine
//!
//! A match holds two balanced teams and a map vote tally. Its status moves
//! linearly, Voting -> MapSelected -> Completed, with no backward edges.
//! Only Voting accepts vote recording.

use crate::error::{MatchmakingError, Result};
use crate::game::vote::MapVoteTally;
use crate::types::{MatchId, MatchStatus, Player, PlayerId, VoteSnapshot};
use crate::utils::{current_timestamp, generate_match_id};
use chrono::{DateTime, Utc};

/// An in-progress match: two disjoint teams partitioning one queue batch
#[derive(Debug, Clone)]
pub struct Match {
    id: MatchId,
    team_a: Vec<Player>,
    team_b: Vec<Player>,
    status: MatchStatus,
    votes: MapVoteTally,
    selected_map: Option<String>,
    created_at: DateTime<Utc>,
}

impl Match {
    /// Build a new match in Voting state with an empty tally over `map_pool`
    pub(crate) fn new(team_a: Vec<Player>, team_b: Vec<Player>, map_pool: &[String]) -> Self {
        Self {
            id: generate_match_id(),
            team_a,
            team_b,
            status: MatchStatus::Voting,
            votes: MapVoteTally::new(map_pool),
            selected_map: None,
            created_at: current_timestamp(),
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn team_a(&self) -> &[Player] {
        &self.team_a
    }

    pub fn team_b(&self) -> &[Player] {
        &self.team_b
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Map chosen for this match, once voting has concluded
    pub fn selected_map(&self) -> Option<&str> {
        self.selected_map.as_deref()
    }

    /// Ids of every player on either team
    pub fn participant_ids(&self) -> Vec<PlayerId> {
        self.team_a
            .iter()
            .chain(self.team_b.iter())
            .map(|player| player.id.clone())
            .collect()
    }

    /// Whether the given player is on either team
    pub fn contains_player(&self, player_id: &str) -> bool {
        self.team_a
            .iter()
            .chain(self.team_b.iter())
            .any(|player| player.id == player_id)
    }

    /// Record a vote for `map_name` on behalf of `player_id`.
    ///
    /// Fails with `VotingClosed` unless the match is still in Voting;
    /// otherwise delegates to the tally (`UnknownMap`, `DuplicateEntry`).
    pub fn record_vote(&mut self, player_id: &str, map_name: &str) -> Result<VoteSnapshot> {
        if self.status != MatchStatus::Voting {
            return Err(MatchmakingError::VotingClosed {
                match_id: self.id.to_string(),
            }
            .into());
        }

        self.votes.record_vote(player_id, map_name)
    }

    /// Current tally without mutation
    pub fn vote_snapshot(&self) -> VoteSnapshot {
        self.votes.snapshot()
    }

    /// Read access to the tally
    pub fn votes(&self) -> &MapVoteTally {
        &self.votes
    }

    /// Close voting and pin the selected map (Voting -> MapSelected).
    ///
    /// The selection policy lives outside this core; this is the transition
    /// it fires. Fails with `UnknownMap` for a name outside the pool and
    /// with `InvalidTransition` from any state but Voting.
    pub fn mark_map_selected(&mut self, map_name: &str) -> Result<()> {
        if !self.votes.contains_map(map_name) {
            return Err(MatchmakingError::UnknownMap {
                map_name: map_name.to_string(),
            }
            .into());
        }

        if self.status != MatchStatus::Voting {
            return Err(MatchmakingError::InvalidTransition {
                match_id: self.id.to_string(),
                from: self.status.to_string(),
                to: MatchStatus::MapSelected.to_string(),
            }
            .into());
        }

        self.status = MatchStatus::MapSelected;
        self.selected_map = Some(map_name.to_string());
        Ok(())
    }

    /// Terminal transition to Completed, valid from Voting or MapSelected
    pub(crate) fn mark_completed(&mut self) -> Result<()> {
        if self.status == MatchStatus::Completed {
            return Err(MatchmakingError::InvalidTransition {
                match_id: self.id.to_string(),
                from: self.status.to_string(),
                to: MatchStatus::Completed.to_string(),
            }
            .into());
        }

        self.status = MatchStatus::Completed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::current_timestamp;

    fn test_pool() -> Vec<String> {
        ["dust2", "mirage", "inferno"]
            .iter()
            .map(|m| m.to_string())
            .collect()
    }

    fn player(id: &str, elo: i32) -> Player {
        Player {
            id: id.to_string(),
            username: id.to_string(),
            elo,
            joined_at: current_timestamp(),
        }
    }

    fn test_match() -> Match {
        Match::new(
            vec![player("a1", 1200), player("a2", 1000)],
            vec![player("b1", 1100), player("b2", 900)],
            &test_pool(),
        )
    }

    #[test]
    fn test_new_match_starts_voting() {
        let m = test_match();
        assert_eq!(m.status(), MatchStatus::Voting);
        assert_eq!(m.vote_snapshot().values().sum::<u32>(), 0);
        assert_eq!(m.selected_map(), None);
    }

    #[test]
    fn test_participants() {
        let m = test_match();
        assert_eq!(m.participant_ids(), vec!["a1", "a2", "b1", "b2"]);
        assert!(m.contains_player("b2"));
        assert!(!m.contains_player("zz"));
    }

    #[test]
    fn test_vote_while_voting() {
        let mut m = test_match();
        let snapshot = m.record_vote("a1", "dust2").unwrap();
        assert_eq!(snapshot["dust2"], 1);
    }

    #[test]
    fn test_vote_rejected_after_map_selected() {
        let mut m = test_match();
        m.record_vote("a1", "dust2").unwrap();
        m.mark_map_selected("dust2").unwrap();

        let err = m.record_vote("a2", "mirage").unwrap_err();
        let err = err.downcast_ref::<MatchmakingError>().unwrap();
        assert!(matches!(err, MatchmakingError::VotingClosed { .. }));
        assert_eq!(m.vote_snapshot()["mirage"], 0);
    }

    #[test]
    fn test_linear_state_machine() {
        let mut m = test_match();

        m.mark_map_selected("inferno").unwrap();
        assert_eq!(m.status(), MatchStatus::MapSelected);
        assert_eq!(m.selected_map(), Some("inferno"));

        // No backward edge
        assert!(m.mark_map_selected("dust2").is_err());

        m.mark_completed().unwrap();
        assert_eq!(m.status(), MatchStatus::Completed);

        // Completed is terminal
        assert!(m.mark_completed().is_err());
    }

    #[test]
    fn test_complete_straight_from_voting() {
        let mut m = test_match();
        m.mark_completed().unwrap();
        assert_eq!(m.status(), MatchStatus::Completed);
    }

    #[test]
    fn test_select_unknown_map_rejected() {
        let mut m = test_match();
        let err = m.mark_map_selected("aztec").unwrap_err();
        let err = err.downcast_ref::<MatchmakingError>().unwrap();
        assert!(matches!(err, MatchmakingError::UnknownMap { .. }));
        assert_eq!(m.status(), MatchStatus::Voting);
    }
}
