//! Error types for the matchmaking service
//!
//! This module defines all error types using anyhow for consistent error
//! handling throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    #[error("duplicate entry for player {player_id}")]
    DuplicateEntry { player_id: String },

    #[error("queue holds {available} players but {requested} were requested")]
    InsufficientPlayers { requested: usize, available: usize },

    #[error("invalid batch size: got {actual} players, expected {expected}")]
    InvalidBatchSize { expected: usize, actual: usize },

    #[error("match not found: {match_id}")]
    NotFound { match_id: String },

    #[error("player {player_id} has no active match")]
    NoActiveMatch { player_id: String },

    #[error("unknown map: {map_name}")]
    UnknownMap { map_name: String },

    #[error("voting is closed for match {match_id}")]
    VotingClosed { match_id: String },

    #[error("invalid transition for match {match_id}: {from} -> {to}")]
    InvalidTransition {
        match_id: String,
        from: String,
        to: String,
    },

    #[error("configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("internal service error: {message}")]
    InternalError { message: String },
}
