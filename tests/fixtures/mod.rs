//! Shared fixtures for the integration tests

use ready_room::config::MatchmakingSettings;
use ready_room::types::{JoinRequest, MapVotesUpdate, MatchCreated, PlayerId};
use ready_room::{MatchmakingEngine, RecordedNotification, RecordingNotifier};
use std::sync::Arc;

/// Matchmaking settings with the default five-map pool and the given batch
pub fn test_settings(batch_size: usize) -> MatchmakingSettings {
    MatchmakingSettings {
        batch_size,
        ..MatchmakingSettings::default()
    }
}

/// Engine wired to a recording notifier
pub fn create_test_engine(batch_size: usize) -> (Arc<MatchmakingEngine>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = MatchmakingEngine::new(test_settings(batch_size), notifier.clone())
        .expect("engine construction");
    (Arc::new(engine), notifier)
}

/// Join `count` players named `<prefix>1..=<prefix>count` with the given elos.
///
/// Elos cycle if shorter than `count`.
pub async fn join_many(engine: &MatchmakingEngine, prefix: &str, count: usize, elos: &[i32]) {
    for i in 0..count {
        let id = format!("{}{}", prefix, i + 1);
        let elo = elos[i % elos.len()];
        engine
            .handle_join(&id, JoinRequest::with_elo(&format!("user_{}", id), elo))
            .await
            .expect("join");
    }
}

/// All captured matchCreated events with their recipient lists
pub fn match_created_events(
    notifier: &RecordingNotifier,
) -> Vec<(Vec<PlayerId>, MatchCreated)> {
    notifier
        .recorded()
        .into_iter()
        .filter_map(|notification| match notification {
            RecordedNotification::MatchCreated { recipients, event } => Some((recipients, event)),
            _ => None,
        })
        .collect()
}

/// All captured mapVotesUpdate events with their recipient lists
pub fn votes_update_events(
    notifier: &RecordingNotifier,
) -> Vec<(Vec<PlayerId>, MapVotesUpdate)> {
    notifier
        .recorded()
        .into_iter()
        .filter_map(|notification| match notification {
            RecordedNotification::MapVotesUpdate { recipients, event } => {
                Some((recipients, event))
            }
            _ => None,
        })
        .collect()
}
