//! Matchmaking engine orchestration

pub mod matchmaker;

pub use matchmaker::{EngineStats, MatchmakingEngine};
