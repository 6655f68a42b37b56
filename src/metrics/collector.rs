//! Metrics collection using Prometheus
//!
//! Counters and gauges for the matchmaking hot path, grouped by concern and
//! registered against a single registry that the query surface exposes at
//! /metrics.

use anyhow::Result;
use prometheus::{IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Main metrics collector for the matchmaking service
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,
    queue_metrics: QueueMetrics,
    match_metrics: MatchMetrics,
}

/// Queue-related metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Total players that joined the queue
    pub players_queued_total: IntCounter,

    /// Total players removed by disconnect while queued
    pub players_removed_total: IntCounter,

    /// Total join attempts rejected (duplicate id, already in a match)
    pub joins_rejected_total: IntCounter,

    /// Players currently waiting in the queue
    pub queue_depth: IntGauge,
}

/// Match- and vote-related metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Total matches created
    pub matches_created_total: IntCounter,

    /// Total matches completed
    pub matches_completed_total: IntCounter,

    /// Matches currently active
    pub active_matches: IntGauge,

    /// Total counted map votes
    pub votes_recorded_total: IntCounter,

    /// Total vote attempts rejected (unknown map, closed voting, repeats)
    pub votes_rejected_total: IntCounter,
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let players_queued_total = IntCounter::new(
            "readyroom_players_queued_total",
            "Total players that joined the queue",
        )?;
        let players_removed_total = IntCounter::new(
            "readyroom_players_removed_total",
            "Total players removed from the queue by disconnect",
        )?;
        let joins_rejected_total = IntCounter::new(
            "readyroom_joins_rejected_total",
            "Total rejected join attempts",
        )?;
        let queue_depth = IntGauge::new(
            "readyroom_queue_depth",
            "Players currently waiting in the queue",
        )?;

        registry.register(Box::new(players_queued_total.clone()))?;
        registry.register(Box::new(players_removed_total.clone()))?;
        registry.register(Box::new(joins_rejected_total.clone()))?;
        registry.register(Box::new(queue_depth.clone()))?;

        Ok(Self {
            players_queued_total,
            players_removed_total,
            joins_rejected_total,
            queue_depth,
        })
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_created_total = IntCounter::new(
            "readyroom_matches_created_total",
            "Total matches created",
        )?;
        let matches_completed_total = IntCounter::new(
            "readyroom_matches_completed_total",
            "Total matches completed",
        )?;
        let active_matches = IntGauge::new(
            "readyroom_active_matches",
            "Matches currently active",
        )?;
        let votes_recorded_total = IntCounter::new(
            "readyroom_votes_recorded_total",
            "Total counted map votes",
        )?;
        let votes_rejected_total = IntCounter::new(
            "readyroom_votes_rejected_total",
            "Total rejected vote attempts",
        )?;

        registry.register(Box::new(matches_created_total.clone()))?;
        registry.register(Box::new(matches_completed_total.clone()))?;
        registry.register(Box::new(active_matches.clone()))?;
        registry.register(Box::new(votes_recorded_total.clone()))?;
        registry.register(Box::new(votes_rejected_total.clone()))?;

        Ok(Self {
            matches_created_total,
            matches_completed_total,
            active_matches,
            votes_recorded_total,
            votes_rejected_total,
        })
    }
}

impl MetricsCollector {
    /// Create a collector with a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let queue_metrics = QueueMetrics::new(&registry)?;
        let match_metrics = MatchMetrics::new(&registry)?;

        Ok(Self {
            registry: Arc::new(registry),
            queue_metrics,
            match_metrics,
        })
    }

    /// Underlying Prometheus registry, for the /metrics endpoint
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Queue metrics group
    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    /// Match metrics group
    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_registers_metrics() {
        let collector = MetricsCollector::new().unwrap();

        collector.queue().players_queued_total.inc();
        collector.queue().queue_depth.set(3);
        collector.matches().matches_created_total.inc();

        let families = collector.registry().gather();
        assert!(!families.is_empty());

        let names: Vec<String> = families
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"readyroom_players_queued_total".to_string()));
        assert!(names.contains(&"readyroom_queue_depth".to_string()));
        assert!(names.contains(&"readyroom_matches_created_total".to_string()));
    }

    #[test]
    fn test_collectors_use_independent_registries() {
        let first = MetricsCollector::new().unwrap();
        let second = MetricsCollector::new().unwrap();

        first.queue().players_queued_total.inc();
        assert_eq!(second.queue().players_queued_total.get(), 0);
    }
}
