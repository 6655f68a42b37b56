//! Team balancing for a fixed-size batch of players
//!
//! A batch is sorted descending by elo and split by index parity: even sorted
//! indices form team A, odd indices team B. This bounds the skill gap within
//! each adjacent pair and spreads top-rated players across both teams without
//! an optimal-partition search. The sort is stable, so equal elos keep their
//! original queue order and the whole operation is deterministic.

use crate::error::{MatchmakingError, Result};
use crate::types::Player;

/// Split a batch into two balanced teams of equal size.
///
/// Fails with `InvalidBatchSize` if the batch length is odd or does not
/// match `expected_size`. The operation is pure: it consumes the batch and
/// touches no shared state.
pub fn balance(mut batch: Vec<Player>, expected_size: usize) -> Result<(Vec<Player>, Vec<Player>)> {
    if batch.len() != expected_size || batch.len() % 2 != 0 {
        return Err(MatchmakingError::InvalidBatchSize {
            expected: expected_size,
            actual: batch.len(),
        }
        .into());
    }

    // Stable: ties keep original queue order
    batch.sort_by(|a, b| b.elo.cmp(&a.elo));

    let mut team_a = Vec::with_capacity(batch.len() / 2);
    let mut team_b = Vec::with_capacity(batch.len() / 2);
    for (index, player) in batch.into_iter().enumerate() {
        if index % 2 == 0 {
            team_a.push(player);
        } else {
            team_b.push(player);
        }
    }

    Ok((team_a, team_b))
}

/// Sum of a team's elo ratings
pub fn team_elo_sum(team: &[Player]) -> i64 {
    team.iter().map(|player| i64::from(player.elo)).sum()
}
