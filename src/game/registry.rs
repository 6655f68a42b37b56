//! Registry owning the set of in-progress matches
//!
//! The registry stores every active match, maintains the player-to-match
//! index used for vote routing, and archives completed match ids so a late
//! double-complete is distinguishable from an id that never existed.

use crate::error::{MatchmakingError, Result};
use crate::game::instance::Match;
use crate::types::{MatchId, Player, PlayerId, VoteSnapshot};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Owner of match lifecycle state and the playerId -> matchId index
#[derive(Debug, Clone, Default)]
pub struct MatchRegistry {
    matches: HashMap<MatchId, Match>,
    player_index: HashMap<PlayerId, MatchId>,
    completed: HashSet<MatchId>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new match in Voting state and index every participant.
    ///
    /// The teams are expected to be the balancer's output: disjoint and
    /// equally sized. Returns a reference to the stored match.
    pub fn create(
        &mut self,
        team_a: Vec<Player>,
        team_b: Vec<Player>,
        map_pool: &[String],
    ) -> Result<&Match> {
        let game = Match::new(team_a, team_b, map_pool);
        let match_id = game.id();

        for player_id in game.participant_ids() {
            self.player_index.insert(player_id, match_id);
        }
        self.matches.insert(match_id, game);

        debug!("Registered match {}", match_id);
        self.matches
            .get(&match_id)
            .ok_or_else(|| {
                MatchmakingError::InternalError {
                    message: format!("match {} vanished after insert", match_id),
                }
                .into()
            })
    }

    /// Look up a match by id
    pub fn get(&self, match_id: MatchId) -> Result<&Match> {
        self.matches
            .get(&match_id)
            .ok_or_else(|| not_found(match_id))
    }

    /// Id of the active match containing the given player, if any
    pub fn match_id_for_player(&self, player_id: &str) -> Option<MatchId> {
        self.player_index.get(player_id).copied()
    }

    /// The active match containing the given player
    pub fn match_for_player(&self, player_id: &str) -> Result<&Match> {
        let match_id = self.player_index.get(player_id).ok_or_else(|| {
            MatchmakingError::NoActiveMatch {
                player_id: player_id.to_string(),
            }
        })?;
        self.get(*match_id)
    }

    /// Record a vote in the player's active match.
    ///
    /// Returns the match id, the participant ids for broadcast fan-out, and
    /// the updated snapshot.
    pub fn record_vote(
        &mut self,
        player_id: &str,
        map_name: &str,
    ) -> Result<(MatchId, Vec<PlayerId>, VoteSnapshot)> {
        let match_id = self.match_id_for_player(player_id).ok_or_else(|| {
            MatchmakingError::NoActiveMatch {
                player_id: player_id.to_string(),
            }
        })?;

        let game = self
            .matches
            .get_mut(&match_id)
            .ok_or_else(|| not_found(match_id))?;
        let snapshot = game.record_vote(player_id, map_name)?;

        Ok((match_id, game.participant_ids(), snapshot))
    }

    /// Fire the Voting -> MapSelected transition for a match.
    ///
    /// The trigger policy (timeout, majority, unanimity) belongs to the
    /// surrounding system; the registry only performs the transition.
    pub fn select_map(&mut self, match_id: MatchId, map_name: &str) -> Result<()> {
        let game = self
            .matches
            .get_mut(&match_id)
            .ok_or_else(|| not_found(match_id))?;
        game.mark_map_selected(map_name)
    }

    /// Complete a match: transition to Completed, drop it from the active
    /// set, and clear its players from the index.
    ///
    /// Completing an id that was already completed fails with
    /// `InvalidTransition`; an id that never existed fails with `NotFound`.
    pub fn complete(&mut self, match_id: MatchId) -> Result<Match> {
        if self.completed.contains(&match_id) {
            return Err(MatchmakingError::InvalidTransition {
                match_id: match_id.to_string(),
                from: "Completed".to_string(),
                to: "Completed".to_string(),
            }
            .into());
        }

        let mut game = self
            .matches
            .remove(&match_id)
            .ok_or_else(|| not_found(match_id))?;
        game.mark_completed()?;

        for player_id in game.participant_ids() {
            self.player_index.remove(&player_id);
        }
        self.completed.insert(match_id);

        debug!("Completed match {}", match_id);
        Ok(game)
    }

    /// Number of active (non-Completed) matches
    pub fn active_count(&self) -> usize {
        self.matches.len()
    }

    /// Iterate active matches in no particular order
    pub fn active_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.values()
    }
}

fn not_found(match_id: MatchId) -> anyhow::Error {
    MatchmakingError::NotFound {
        match_id: match_id.to_string(),
    }
    .into()
}
