//! Health check model for the ready-room service

use crate::engine::{EngineStats, MatchmakingEngine};
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Engine statistics
    pub stats: EngineStats,
}

impl HealthReport {
    /// Inspect the engine and build a health report.
    ///
    /// Unhealthy when engine state is unreadable (poisoned lock); degraded
    /// when the queue backlog exceeds ten unfilled batches.
    pub fn check(engine: &MatchmakingEngine, service_name: &str) -> Self {
        let (status, stats) = match engine.stats() {
            Ok(stats) => {
                let backlog_limit = engine.settings().batch_size * 10;
                let status = if stats.players_waiting > backlog_limit {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Healthy
                };
                (status, stats)
            }
            Err(e) => {
                error!("Health check failed to read engine stats: {}", e);
                (HealthStatus::Unhealthy, EngineStats::default())
            }
        };

        Self {
            status,
            service: service_name.to_string(),
            version: crate::VERSION.to_string(),
            timestamp: current_timestamp(),
            stats,
        }
    }
}
