//! Per-match map vote tally
//!
//! Counts votes over the closed, configured map set. Snapshots are
//! zero-filled so every broadcast carries the same shape. Counts never
//! decrease: a player gets one counted vote per match, and a repeat vote is
//! rejected rather than moved.

use crate::error::{MatchmakingError, Result};
use crate::types::{PlayerId, VoteSnapshot};
use std::collections::HashSet;

/// Mapping from map name to accumulated vote count for one match
#[derive(Debug, Clone)]
pub struct MapVoteTally {
    counts: VoteSnapshot,
    voters: HashSet<PlayerId>,
}

impl MapVoteTally {
    /// Create a tally zero-filled over the configured map pool
    pub fn new(map_pool: &[String]) -> Self {
        Self {
            counts: map_pool.iter().map(|map| (map.clone(), 0)).collect(),
            voters: HashSet::new(),
        }
    }

    /// Record one vote and return the updated snapshot.
    ///
    /// Fails with `UnknownMap` for names outside the configured set and with
    /// `DuplicateEntry` if the player already has a counted vote; the tally
    /// is unchanged on either failure.
    pub fn record_vote(&mut self, player_id: &str, map_name: &str) -> Result<VoteSnapshot> {
        if !self.counts.contains_key(map_name) {
            return Err(MatchmakingError::UnknownMap {
                map_name: map_name.to_string(),
            }
            .into());
        }

        if self.voters.contains(player_id) {
            return Err(MatchmakingError::DuplicateEntry {
                player_id: player_id.to_string(),
            }
            .into());
        }

        if let Some(count) = self.counts.get_mut(map_name) {
            *count += 1;
        }
        self.voters.insert(player_id.to_string());

        Ok(self.snapshot())
    }

    /// Current tally without mutation, zero-filled for unvoted maps
    pub fn snapshot(&self) -> VoteSnapshot {
        self.counts.clone()
    }

    /// Whether a map name is part of the configured pool
    pub fn contains_map(&self, map_name: &str) -> bool {
        self.counts.contains_key(map_name)
    }

    /// Whether a player already has a counted vote
    pub fn has_voted(&self, player_id: &str) -> bool {
        self.voters.contains(player_id)
    }

    /// Total number of counted votes
    pub fn total_votes(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Map with the most votes so far, if any vote has been cast.
    /// Ties resolve to the lexicographically first map name.
    pub fn leading_map(&self) -> Option<&str> {
        let mut best: Option<(&str, u32)> = None;
        for (map, &count) in &self.counts {
            if count > 0 && best.map_or(true, |(_, leader)| count > leader) {
                best = Some((map.as_str(), count));
            }
        }
        best.map(|(map, _)| map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool() -> Vec<String> {
        ["dust2", "mirage", "inferno", "overpass", "nuke"]
            .iter()
            .map(|m| m.to_string())
            .collect()
    }

    #[test]
    fn test_snapshot_zero_filled() {
        let tally = MapVoteTally::new(&test_pool());
        let snapshot = tally.snapshot();

        assert_eq!(snapshot.len(), 5);
        assert!(snapshot.values().all(|&count| count == 0));
    }

    #[test]
    fn test_record_vote_increments() {
        let mut tally = MapVoteTally::new(&test_pool());

        let snapshot = tally.record_vote("p1", "dust2").unwrap();
        assert_eq!(snapshot["dust2"], 1);

        let snapshot = tally.record_vote("p2", "mirage").unwrap();
        assert_eq!(snapshot["dust2"], 1);
        assert_eq!(snapshot["mirage"], 1);
        assert_eq!(snapshot["inferno"], 0);
        assert_eq!(snapshot["overpass"], 0);
        assert_eq!(snapshot["nuke"], 0);
        assert_eq!(tally.total_votes(), 2);
    }

    #[test]
    fn test_unknown_map_leaves_tally_unchanged() {
        let mut tally = MapVoteTally::new(&test_pool());
        tally.record_vote("p1", "dust2").unwrap();

        let err = tally.record_vote("p2", "aztec").unwrap_err();
        let err = err.downcast_ref::<MatchmakingError>().unwrap();
        assert!(matches!(err, MatchmakingError::UnknownMap { .. }));

        assert_eq!(tally.total_votes(), 1);
        assert!(!tally.has_voted("p2"));
    }

    #[test]
    fn test_one_counted_vote_per_player() {
        let mut tally = MapVoteTally::new(&test_pool());
        tally.record_vote("p1", "dust2").unwrap();

        let err = tally.record_vote("p1", "mirage").unwrap_err();
        let err = err.downcast_ref::<MatchmakingError>().unwrap();
        assert!(matches!(err, MatchmakingError::DuplicateEntry { .. }));

        let snapshot = tally.snapshot();
        assert_eq!(snapshot["dust2"], 1);
        assert_eq!(snapshot["mirage"], 0);
    }

    #[test]
    fn test_leading_map() {
        let mut tally = MapVoteTally::new(&test_pool());
        assert_eq!(tally.leading_map(), None);

        tally.record_vote("p1", "nuke").unwrap();
        tally.record_vote("p2", "nuke").unwrap();
        tally.record_vote("p3", "dust2").unwrap();
        assert_eq!(tally.leading_map(), Some("nuke"));
    }
}
