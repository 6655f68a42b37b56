//! Metrics for the ready-room matchmaking service

pub mod collector;

pub use collector::{MatchMetrics, MetricsCollector, QueueMetrics};
