//! FIFO waiting list of players seeking a match
//!
//! Insertion order is preserved and a given player id appears at most once.
//! The queue itself is not synchronized; the engine owns it exclusively and
//! serializes access (see the engine module).

use crate::error::{MatchmakingError, Result};
use crate::types::Player;
use std::collections::VecDeque;

/// Ordered waiting list of players, FIFO, no duplicate ids
#[derive(Debug, Clone, Default)]
pub struct PlayerQueue {
    entries: VecDeque<Player>,
}

impl PlayerQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a player and return their 1-based queue position.
    ///
    /// Fails with `DuplicateEntry` if the player's id is already queued;
    /// the queue is left unchanged in that case.
    pub fn enqueue(&mut self, player: Player) -> Result<usize> {
        if self.contains(&player.id) {
            return Err(MatchmakingError::DuplicateEntry {
                player_id: player.id,
            }
            .into());
        }

        self.entries.push_back(player);
        Ok(self.entries.len())
    }

    /// Atomically remove and return the first `n` players in FIFO order.
    ///
    /// Fails with `InsufficientPlayers` if fewer than `n` players are
    /// queued; the remainder stays queued in its original order.
    pub fn dequeue_batch(&mut self, n: usize) -> Result<Vec<Player>> {
        if self.entries.len() < n {
            return Err(MatchmakingError::InsufficientPlayers {
                requested: n,
                available: self.entries.len(),
            }
            .into());
        }

        Ok(self.entries.drain(..n).collect())
    }

    /// Remove the entry with the given id, returning it if present.
    ///
    /// Absent ids are a no-op, which covers late or duplicate disconnects.
    pub fn remove(&mut self, player_id: &str) -> Option<Player> {
        let mut removed = None;
        self.entries.retain(|player| {
            if player.id == player_id {
                removed = Some(player.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Current queue length
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a player id is currently queued
    pub fn contains(&self, player_id: &str) -> bool {
        self.entries.iter().any(|player| player.id == player_id)
    }

    /// Iterate queued players in FIFO order
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.entries.iter()
    }
}
