//! Ready Room - Matchmaking service for team games
//!
//! This crate matches queued players into fixed-size games, balances them
//! into two elo-based teams, and runs a per-match map vote.

pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod metrics;
pub mod notify;
pub mod queue;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use engine::{EngineStats, MatchmakingEngine};
pub use notify::{LoggingNotifier, Notifier, RecordedNotification, RecordingNotifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
