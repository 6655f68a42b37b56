//! Notifier trait and the bundled implementations

use crate::error::Result;
use crate::types::{MapVotesUpdate, MatchCreated, PlayerId, QueueJoined};
use async_trait::async_trait;
use tracing::debug;

/// Trait for delivering matchmaking notifications to clients.
///
/// Deliveries are fire-and-forget from the engine's perspective: the engine
/// logs a failed send and moves on, it never blocks an event handler on
/// delivery acknowledgment.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Acknowledge a successful queue join to one connection
    async fn queue_joined(&self, recipient: &str, event: QueueJoined) -> Result<()>;

    /// Announce a new match to its participants
    async fn match_created(&self, recipients: &[PlayerId], event: MatchCreated) -> Result<()>;

    /// Push an updated vote tally to a match's participants
    async fn map_votes_update(&self, recipients: &[PlayerId], event: MapVotesUpdate)
        -> Result<()>;
}

/// Default notifier that logs every event instead of delivering it.
///
/// Used when the service runs without a transport attached (standalone
/// binary, simulator).
#[derive(Debug, Default)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn queue_joined(&self, recipient: &str, event: QueueJoined) -> Result<()> {
        debug!(
            "queueJoined -> {}: position {}",
            recipient, event.position
        );
        Ok(())
    }

    async fn match_created(&self, recipients: &[PlayerId], event: MatchCreated) -> Result<()> {
        debug!(
            "matchCreated -> {} recipients: match {}",
            recipients.len(),
            event.match_id
        );
        Ok(())
    }

    async fn map_votes_update(
        &self,
        recipients: &[PlayerId],
        event: MapVotesUpdate,
    ) -> Result<()> {
        debug!(
            "mapVotesUpdate -> {} recipients: {:?}",
            recipients.len(),
            event.votes
        );
        Ok(())
    }
}

/// A notification captured by [`RecordingNotifier`]
#[derive(Debug, Clone)]
pub enum RecordedNotification {
    QueueJoined {
        recipient: PlayerId,
        event: QueueJoined,
    },
    MatchCreated {
        recipients: Vec<PlayerId>,
        event: MatchCreated,
    },
    MapVotesUpdate {
        recipients: Vec<PlayerId>,
        event: MapVotesUpdate,
    },
}

impl RecordedNotification {
    /// Short event name, matching the wire type tag
    pub fn event_name(&self) -> &'static str {
        match self {
            RecordedNotification::QueueJoined { .. } => "queueJoined",
            RecordedNotification::MatchCreated { .. } => "matchCreated",
            RecordedNotification::MapVotesUpdate { .. } => "mapVotesUpdate",
        }
    }
}

/// Recording notifier for tests and benchmarks
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    recorded: std::sync::Mutex<Vec<RecordedNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured notifications, in delivery order
    pub fn recorded(&self) -> Vec<RecordedNotification> {
        self.recorded
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of captured notifications of the given event name
    pub fn count_of(&self, event_name: &str) -> usize {
        self.recorded()
            .iter()
            .filter(|event| event.event_name() == event_name)
            .count()
    }

    /// Clear captured notifications
    pub fn clear(&self) {
        if let Ok(mut events) = self.recorded.lock() {
            events.clear();
        }
    }

    fn push(&self, notification: RecordedNotification) {
        if let Ok(mut events) = self.recorded.lock() {
            events.push(notification);
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn queue_joined(&self, recipient: &str, event: QueueJoined) -> Result<()> {
        self.push(RecordedNotification::QueueJoined {
            recipient: recipient.to_string(),
            event,
        });
        Ok(())
    }

    async fn match_created(&self, recipients: &[PlayerId], event: MatchCreated) -> Result<()> {
        self.push(RecordedNotification::MatchCreated {
            recipients: recipients.to_vec(),
            event,
        });
        Ok(())
    }

    async fn map_votes_update(
        &self,
        recipients: &[PlayerId],
        event: MapVotesUpdate,
    ) -> Result<()> {
        self.push(RecordedNotification::MapVotesUpdate {
            recipients: recipients.to_vec(),
            event,
        });
        Ok(())
    }
}
