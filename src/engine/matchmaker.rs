//! The matchmaking engine
//!
//! Owns the player queue and the match registry exclusively and processes
//! inbound events (join, vote, disconnect) to completion, one at a time per
//! structure. Queue, registry, and the player index live behind a single
//! RwLock: the full body of every handler runs under one write guard, so two
//! concurrent joins can never both observe "queue is full" and extract
//! overlapping batches. Outbound notifications are built inside the critical
//! section and delivered after the guard is released; delivery failures are
//! logged and never propagated to the event's originator.

use crate::config::MatchmakingSettings;
use crate::error::{MatchmakingError, Result};
use crate::game::{balancer, MatchRegistry};
use crate::metrics::MetricsCollector;
use crate::notify::{MessageUtils, Notifier};
use crate::queue::PlayerQueue;
use crate::types::{
    JoinRequest, MapVotesUpdate, MatchCreated, MatchId, Player, PlayerId, QueueJoined,
    TeamAssignment, VoteSnapshot,
};
use crate::utils::{ceil_div, current_timestamp};
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Statistics about engine operations
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct EngineStats {
    /// Total players that joined the queue
    pub players_queued: u64,
    /// Total matches created
    pub matches_created: u64,
    /// Total matches completed
    pub matches_completed: u64,
    /// Total counted map votes
    pub votes_recorded: u64,
    /// Total disconnect events processed
    pub disconnects: u64,
    /// Players currently waiting in the queue
    pub players_waiting: usize,
    /// Matches currently active
    pub active_matches: usize,
}

/// Mutable engine state, guarded as one unit (see module docs)
struct EngineState {
    queue: PlayerQueue,
    registry: MatchRegistry,
}

/// The matchmaking engine
#[derive(Clone)]
pub struct MatchmakingEngine {
    state: Arc<RwLock<EngineState>>,
    settings: MatchmakingSettings,
    notifier: Arc<dyn Notifier>,
    stats: Arc<RwLock<EngineStats>>,
    metrics: Arc<MetricsCollector>,
}

impl std::fmt::Debug for MatchmakingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchmakingEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl MatchmakingEngine {
    /// Create a new engine with its own metrics collector.
    ///
    /// Fails with `ConfigurationError` on an unusable batch size or an
    /// empty map pool.
    pub fn new(settings: MatchmakingSettings, notifier: Arc<dyn Notifier>) -> Result<Self> {
        if settings.batch_size < 2 || settings.batch_size % 2 != 0 {
            return Err(MatchmakingError::ConfigurationError {
                message: format!(
                    "batch size must be even and at least 2, got {}",
                    settings.batch_size
                ),
            }
            .into());
        }
        if settings.available_maps.is_empty() {
            return Err(MatchmakingError::ConfigurationError {
                message: "available map list cannot be empty".to_string(),
            }
            .into());
        }

        let metrics = Arc::new(MetricsCollector::new()?);
        Ok(Self::with_metrics(settings, notifier, metrics))
    }

    /// Create a new engine with a shared metrics collector
    pub fn with_metrics(
        settings: MatchmakingSettings,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(EngineState {
                queue: PlayerQueue::new(),
                registry: MatchRegistry::new(),
            })),
            settings,
            notifier,
            stats: Arc::new(RwLock::new(EngineStats::default())),
            metrics,
        }
    }

    /// Handle a queue join event.
    ///
    /// Elo defaults to the configured value when the payload carried none;
    /// username defaults to empty. Returns the 1-based queue position. When
    /// the join fills one or more batches, each batch is balanced and
    /// registered before the handler returns, and a matchCreated broadcast
    /// goes out per match.
    pub async fn handle_join(&self, connection_id: &str, request: JoinRequest) -> Result<usize> {
        MessageUtils::validate_connection_id(connection_id)?;

        let player = Player {
            id: connection_id.to_string(),
            username: request.username.unwrap_or_default(),
            elo: request.elo.unwrap_or(self.settings.default_elo),
            joined_at: current_timestamp(),
        };

        info!(
            "Processing join - connection: '{}', username: '{}', elo: {}",
            player.id, player.username, player.elo
        );

        let (position, created) = {
            let mut state = self.lock_state()?;

            // A connection still in an active match may not queue again
            if state.registry.match_id_for_player(connection_id).is_some() {
                self.metrics.queue().joins_rejected_total.inc();
                return Err(MatchmakingError::DuplicateEntry {
                    player_id: connection_id.to_string(),
                }
                .into());
            }

            let position = match state.queue.enqueue(player) {
                Ok(position) => position,
                Err(e) => {
                    self.metrics.queue().joins_rejected_total.inc();
                    return Err(e);
                }
            };

            // A burst of joins can make more than one batch available
            let mut created = Vec::new();
            while state.queue.len() >= self.settings.batch_size {
                let batch = state.queue.dequeue_batch(self.settings.batch_size)?;
                let (team_a, team_b) = balancer::balance(batch, self.settings.batch_size)?;
                let game =
                    state
                        .registry
                        .create(team_a, team_b, &self.settings.available_maps)?;

                created.push((
                    game.participant_ids(),
                    MatchCreated {
                        match_id: game.id(),
                        teams: TeamAssignment {
                            team1: game.team_a().to_vec(),
                            team2: game.team_b().to_vec(),
                        },
                        available_maps: self.settings.available_maps.clone(),
                        timestamp: current_timestamp(),
                    },
                ));
            }

            self.metrics.queue().queue_depth.set(state.queue.len() as i64);
            self.metrics
                .matches()
                .active_matches
                .set(state.registry.active_count() as i64);

            (position, created)
        };

        self.metrics.queue().players_queued_total.inc();
        {
            let mut stats = self.lock_stats()?;
            stats.players_queued += 1;
            stats.matches_created += created.len() as u64;
        }

        // Deliveries happen outside the critical section
        self.deliver_queue_joined(connection_id, position).await;
        for (recipients, event) in created {
            self.metrics.matches().matches_created_total.inc();
            info!(
                "Match {} created with {} players",
                event.match_id,
                recipients.len()
            );
            self.deliver_match_created(&recipients, event).await;
        }

        Ok(position)
    }

    /// Handle a map vote event.
    ///
    /// Resolves the connection's active match, records the vote there, and
    /// broadcasts the updated tally to that match's participants only.
    pub async fn handle_vote(&self, connection_id: &str, map_name: &str) -> Result<VoteSnapshot> {
        MessageUtils::validate_connection_id(connection_id)?;

        debug!(
            "Processing vote - connection: '{}', map: '{}'",
            connection_id, map_name
        );

        let (match_id, recipients, snapshot) = {
            let mut state = self.lock_state()?;
            match state.registry.record_vote(connection_id, map_name) {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.metrics.matches().votes_rejected_total.inc();
                    return Err(e);
                }
            }
        };

        self.metrics.matches().votes_recorded_total.inc();
        {
            let mut stats = self.lock_stats()?;
            stats.votes_recorded += 1;
        }

        info!(
            "Vote recorded - match: {}, map: '{}', total votes: {}",
            match_id,
            map_name,
            snapshot.values().sum::<u32>()
        );

        self.deliver_votes_update(
            &recipients,
            MapVotesUpdate {
                votes: snapshot.clone(),
            },
        )
        .await;

        Ok(snapshot)
    }

    /// Handle a disconnect event.
    ///
    /// Removes the connection from the queue if it was waiting; a no-op for
    /// unknown ids, which covers late or duplicate disconnects. A player in
    /// an active match stays on their team and the match continues.
    pub async fn handle_disconnect(&self, connection_id: &str) -> Result<()> {
        let removed = {
            let mut state = self.lock_state()?;
            let removed = state.queue.remove(connection_id);
            self.metrics.queue().queue_depth.set(state.queue.len() as i64);
            removed
        };

        {
            let mut stats = self.lock_stats()?;
            stats.disconnects += 1;
        }

        match removed {
            Some(player) => {
                self.metrics.queue().players_removed_total.inc();
                info!(
                    "Removed disconnected player '{}' from the queue",
                    player.id
                );
            }
            None => {
                debug!(
                    "Disconnect for '{}' with nothing queued; an active match keeps its roster",
                    connection_id
                );
            }
        }

        Ok(())
    }

    /// Fire the Voting -> MapSelected transition for a match.
    ///
    /// The trigger policy lives outside the engine.
    pub async fn select_map(&self, match_id: MatchId, map_name: &str) -> Result<()> {
        let mut state = self.lock_state()?;
        state.registry.select_map(match_id, map_name)?;

        info!("Map '{}' selected for match {}", map_name, match_id);
        Ok(())
    }

    /// Complete a match and release its players from the index
    pub async fn complete_match(&self, match_id: MatchId) -> Result<()> {
        let active = {
            let mut state = self.lock_state()?;
            state.registry.complete(match_id)?;
            state.registry.active_count()
        };

        self.metrics.matches().matches_completed_total.inc();
        self.metrics.matches().active_matches.set(active as i64);
        {
            let mut stats = self.lock_stats()?;
            stats.matches_completed += 1;
        }

        info!("Match {} completed", match_id);
        Ok(())
    }

    /// Current queue length
    pub fn queue_len(&self) -> Result<usize> {
        Ok(self.lock_state_read()?.queue.len())
    }

    /// Derived wait-time estimate in seconds
    pub fn estimated_wait_seconds(&self) -> Result<u64> {
        let queued = self.queue_len()?;
        let batches = ceil_div(queued, self.settings.batch_size);
        Ok(batches as u64 * self.settings.wait_estimate_unit_seconds)
    }

    /// Snapshot of engine statistics
    pub fn stats(&self) -> Result<EngineStats> {
        let (waiting, active) = {
            let state = self.lock_state_read()?;
            (state.queue.len(), state.registry.active_count())
        };

        let mut stats = self.lock_stats()?.clone();
        stats.players_waiting = waiting;
        stats.active_matches = active;
        Ok(stats)
    }

    /// Matchmaking settings this engine runs with
    pub fn settings(&self) -> &MatchmakingSettings {
        &self.settings
    }

    fn lock_state(&self) -> Result<RwLockWriteGuard<'_, EngineState>> {
        self.state.write().map_err(|_| {
            MatchmakingError::InternalError {
                message: "Failed to acquire engine state lock".to_string(),
            }
            .into()
        })
    }

    fn lock_state_read(&self) -> Result<std::sync::RwLockReadGuard<'_, EngineState>> {
        self.state.read().map_err(|_| {
            MatchmakingError::InternalError {
                message: "Failed to acquire engine state lock".to_string(),
            }
            .into()
        })
    }

    fn lock_stats(&self) -> Result<RwLockWriteGuard<'_, EngineStats>> {
        self.stats.write().map_err(|_| {
            MatchmakingError::InternalError {
                message: "Failed to acquire stats lock".to_string(),
            }
            .into()
        })
    }

    async fn deliver_queue_joined(&self, recipient: &str, position: usize) {
        let event = QueueJoined {
            position,
            timestamp: current_timestamp(),
        };
        if let Err(e) = self.notifier.queue_joined(recipient, event).await {
            warn!("Failed to deliver queueJoined to '{}': {}", recipient, e);
        }
    }

    async fn deliver_match_created(&self, recipients: &[PlayerId], event: MatchCreated) {
        let match_id = event.match_id;
        if let Err(e) = self.notifier.match_created(recipients, event).await {
            warn!(
                "Failed to deliver matchCreated for match {}: {}",
                match_id, e
            );
        }
    }

    async fn deliver_votes_update(&self, recipients: &[PlayerId], event: MapVotesUpdate) {
        if let Err(e) = self.notifier.map_votes_update(recipients, event).await {
            warn!(
                "Failed to deliver mapVotesUpdate to {} recipients: {}",
                recipients.len(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::types::MatchStatus;

    fn test_settings(batch_size: usize) -> MatchmakingSettings {
        MatchmakingSettings {
            batch_size,
            ..MatchmakingSettings::default()
        }
    }

    fn create_test_engine(batch_size: usize) -> (MatchmakingEngine, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = MatchmakingEngine::new(test_settings(batch_size), notifier.clone()).unwrap();
        (engine, notifier)
    }

    async fn join(engine: &MatchmakingEngine, id: &str, elo: i32) -> Result<usize> {
        engine
            .handle_join(id, JoinRequest::with_elo(&format!("user_{}", id), elo))
            .await
    }

    #[tokio::test]
    async fn test_joins_below_batch_create_no_match() {
        let (engine, notifier) = create_test_engine(4);

        for i in 1..=3 {
            let position = join(&engine, &format!("p{}", i), 1000).await.unwrap();
            assert_eq!(position, i);
        }

        assert_eq!(engine.queue_len().unwrap(), 3);
        assert_eq!(notifier.count_of("queueJoined"), 3);
        assert_eq!(notifier.count_of("matchCreated"), 0);
    }

    #[tokio::test]
    async fn test_batch_threshold_creates_exactly_one_match() {
        let (engine, notifier) = create_test_engine(4);

        for i in 1..=4 {
            join(&engine, &format!("p{}", i), 1000 + i as i32).await.unwrap();
        }

        assert_eq!(engine.queue_len().unwrap(), 0);
        assert_eq!(notifier.count_of("matchCreated"), 1);

        let stats = engine.stats().unwrap();
        assert_eq!(stats.matches_created, 1);
        assert_eq!(stats.active_matches, 1);
        assert_eq!(stats.players_waiting, 0);
    }

    #[tokio::test]
    async fn test_duplicate_join_rejected_without_mutation() {
        let (engine, _notifier) = create_test_engine(4);

        join(&engine, "p1", 1000).await.unwrap();
        let err = join(&engine, "p1", 1200).await.unwrap_err();
        let err = err.downcast_ref::<MatchmakingError>().unwrap();
        assert!(matches!(err, MatchmakingError::DuplicateEntry { .. }));
        assert_eq!(engine.queue_len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejoin_while_matched_rejected() {
        let (engine, _notifier) = create_test_engine(4);

        for i in 1..=4 {
            join(&engine, &format!("p{}", i), 1000).await.unwrap();
        }

        // p1 is now in an active match, not in the queue
        let err = join(&engine, "p1", 1000).await.unwrap_err();
        let err = err.downcast_ref::<MatchmakingError>().unwrap();
        assert!(matches!(err, MatchmakingError::DuplicateEntry { .. }));
    }

    #[tokio::test]
    async fn test_missing_elo_defaults() {
        let (engine, notifier) = create_test_engine(2);

        engine
            .handle_join("p1", JoinRequest::default())
            .await
            .unwrap();
        engine
            .handle_join("p2", JoinRequest::default())
            .await
            .unwrap();

        let recorded = notifier.recorded();
        let event = recorded
            .iter()
            .find_map(|n| match n {
                crate::notify::notifier::RecordedNotification::MatchCreated { event, .. } => {
                    Some(event.clone())
                }
                _ => None,
            })
            .unwrap();

        assert!(event
            .teams
            .team1
            .iter()
            .chain(event.teams.team2.iter())
            .all(|p| p.elo == 1000 && p.username.is_empty()));
    }

    #[tokio::test]
    async fn test_vote_flow_broadcasts_to_participants() {
        let (engine, notifier) = create_test_engine(4);

        for i in 1..=4 {
            join(&engine, &format!("p{}", i), 1000).await.unwrap();
        }

        let snapshot = engine.handle_vote("p1", "dust2").await.unwrap();
        assert_eq!(snapshot["dust2"], 1);

        let recorded = notifier.recorded();
        let (recipients, event) = recorded
            .iter()
            .find_map(|n| match n {
                crate::notify::notifier::RecordedNotification::MapVotesUpdate {
                    recipients,
                    event,
                } => Some((recipients.clone(), event.clone())),
                _ => None,
            })
            .unwrap();

        assert_eq!(recipients.len(), 4);
        assert_eq!(event.votes["dust2"], 1);
        // Zero-filled over the whole pool
        assert_eq!(event.votes.len(), 5);
    }

    #[tokio::test]
    async fn test_vote_without_match_rejected() {
        let (engine, _notifier) = create_test_engine(4);

        join(&engine, "p1", 1000).await.unwrap();
        let err = engine.handle_vote("p1", "dust2").await.unwrap_err();
        let err = err.downcast_ref::<MatchmakingError>().unwrap();
        assert!(matches!(err, MatchmakingError::NoActiveMatch { .. }));
    }

    #[tokio::test]
    async fn test_vote_unknown_map_rejected() {
        let (engine, _notifier) = create_test_engine(2);

        join(&engine, "p1", 1000).await.unwrap();
        join(&engine, "p2", 1000).await.unwrap();

        let err = engine.handle_vote("p1", "aztec").await.unwrap_err();
        let err = err.downcast_ref::<MatchmakingError>().unwrap();
        assert!(matches!(err, MatchmakingError::UnknownMap { .. }));

        // Tally unchanged; a proper vote still works
        let snapshot = engine.handle_vote("p1", "dust2").await.unwrap();
        assert_eq!(snapshot.values().sum::<u32>(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_removes_queued_player_only() {
        let (engine, _notifier) = create_test_engine(4);

        join(&engine, "p1", 1000).await.unwrap();
        join(&engine, "p2", 1000).await.unwrap();

        engine.handle_disconnect("p1").await.unwrap();
        assert_eq!(engine.queue_len().unwrap(), 1);

        // Repeat disconnect is a no-op
        engine.handle_disconnect("p1").await.unwrap();
        assert_eq!(engine.queue_len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_keeps_matched_player_on_team() {
        let (engine, notifier) = create_test_engine(4);

        for i in 1..=4 {
            join(&engine, &format!("p{}", i), 1000).await.unwrap();
        }

        engine.handle_disconnect("p1").await.unwrap();

        // p2 votes and the broadcast still reaches all four participants
        engine.handle_vote("p2", "mirage").await.unwrap();
        let recorded = notifier.recorded();
        let recipients = recorded
            .iter()
            .find_map(|n| match n {
                crate::notify::notifier::RecordedNotification::MapVotesUpdate {
                    recipients, ..
                } => Some(recipients.clone()),
                _ => None,
            })
            .unwrap();
        assert!(recipients.contains(&"p1".to_string()));
    }

    #[tokio::test]
    async fn test_select_map_closes_voting() {
        let (engine, notifier) = create_test_engine(2);

        join(&engine, "p1", 1000).await.unwrap();
        join(&engine, "p2", 1000).await.unwrap();

        let recorded = notifier.recorded();
        let match_id = recorded
            .iter()
            .find_map(|n| match n {
                crate::notify::notifier::RecordedNotification::MatchCreated { event, .. } => {
                    Some(event.match_id)
                }
                _ => None,
            })
            .unwrap();

        engine.select_map(match_id, "nuke").await.unwrap();

        let err = engine.handle_vote("p1", "dust2").await.unwrap_err();
        let err = err.downcast_ref::<MatchmakingError>().unwrap();
        assert!(matches!(err, MatchmakingError::VotingClosed { .. }));
    }

    #[tokio::test]
    async fn test_complete_match_frees_players_to_requeue() {
        let (engine, notifier) = create_test_engine(2);

        join(&engine, "p1", 1000).await.unwrap();
        join(&engine, "p2", 1000).await.unwrap();

        let recorded = notifier.recorded();
        let match_id = recorded
            .iter()
            .find_map(|n| match n {
                crate::notify::notifier::RecordedNotification::MatchCreated { event, .. } => {
                    Some(event.match_id)
                }
                _ => None,
            })
            .unwrap();

        engine.complete_match(match_id).await.unwrap();

        let stats = engine.stats().unwrap();
        assert_eq!(stats.active_matches, 0);
        assert_eq!(stats.matches_completed, 1);

        // Players can queue again once their match is done
        assert_eq!(join(&engine, "p1", 1000).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_wait_estimate() {
        let (engine, _notifier) = create_test_engine(4);
        assert_eq!(engine.estimated_wait_seconds().unwrap(), 0);

        join(&engine, "p1", 1000).await.unwrap();
        assert_eq!(engine.estimated_wait_seconds().unwrap(), 120);
    }

    #[tokio::test]
    async fn test_odd_batch_size_rejected_at_construction() {
        let err = MatchmakingEngine::new(test_settings(5), Arc::new(RecordingNotifier::new()))
            .unwrap_err();
        let err = err.downcast_ref::<MatchmakingError>().unwrap();
        assert!(matches!(err, MatchmakingError::ConfigurationError { .. }));
    }

    #[tokio::test]
    async fn test_empty_connection_id_rejected() {
        let (engine, _notifier) = create_test_engine(4);
        assert!(engine
            .handle_join("", JoinRequest::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_match_status_starts_voting() {
        let (engine, notifier) = create_test_engine(2);

        join(&engine, "p1", 1000).await.unwrap();
        join(&engine, "p2", 1000).await.unwrap();

        let recorded = notifier.recorded();
        let match_id = recorded
            .iter()
            .find_map(|n| match n {
                crate::notify::notifier::RecordedNotification::MatchCreated { event, .. } => {
                    Some(event.match_id)
                }
                _ => None,
            })
            .unwrap();

        let state = engine.lock_state_read().unwrap();
        assert_eq!(
            state.registry.get(match_id).unwrap().status(),
            MatchStatus::Voting
        );
    }
}
