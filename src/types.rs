//! Common types used throughout the matchmaking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Connection-scoped identifier for players
pub type PlayerId = String;

/// Unique identifier for matches
pub type MatchId = Uuid;

/// Vote counts per map name, zero-filled over the configured map pool.
///
/// A `BTreeMap` keeps the serialized broadcast shape stable across snapshots.
pub type VoteSnapshot = BTreeMap<String, u32>;

/// A player waiting in the queue or assigned to a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    /// Client-supplied display name; may be empty and is never trusted
    pub username: String,
    /// Integer skill rating used as a sort key for team balancing
    pub elo: i32,
    pub joined_at: DateTime<Utc>,
}

/// Lifecycle state of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Map voting is open
    Voting,
    /// A map has been selected; votes are no longer accepted
    MapSelected,
    /// Match is over (terminal state)
    Completed,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Voting => write!(f, "Voting"),
            MatchStatus::MapSelected => write!(f, "MapSelected"),
            MatchStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// Inbound join payload as delivered by the transport.
///
/// Clients are noisy: elo may arrive as a number, a numeric string, garbage,
/// or not at all. Everything malformed normalizes to `None` here and the
/// engine substitutes the configured default, so the core never sees raw
/// untyped input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_elo")]
    pub elo: Option<i32>,
}

impl JoinRequest {
    /// Build a request with an explicit elo (test and simulator convenience)
    pub fn with_elo(username: &str, elo: i32) -> Self {
        Self {
            username: Some(username.to_string()),
            elo: Some(elo),
        }
    }
}

fn lenient_elo<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|n| i32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }))
}

/// Acknowledgment sent to a player after a successful queue join
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueJoined {
    /// 1-based position in the queue at join time
    pub position: usize,
    pub timestamp: DateTime<Utc>,
}

/// The two balanced teams of a match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAssignment {
    pub team1: Vec<Player>,
    pub team2: Vec<Player>,
}

/// Event broadcast to all participants when a match is created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCreated {
    pub match_id: MatchId,
    pub teams: TeamAssignment,
    pub available_maps: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Vote tally broadcast to the participants of a match.
///
/// Serializes as a flat `{"dust2": 1, ...}` object, zero-filled for unvoted
/// maps, so clients always receive the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapVotesUpdate {
    pub votes: VoteSnapshot,
}
