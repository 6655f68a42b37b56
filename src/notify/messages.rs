//! Wire message definitions and serialization
//!
//! Typed payloads for the transport boundary: inbound join/vote payloads are
//! decoded and normalized here, outbound notifications are encoded with
//! their wire type tag. A transport adapter can use these helpers to stay
//! byte-compatible with the client protocol without touching the core.

use crate::error::{MatchmakingError, Result};
use crate::types::{JoinRequest, MapVotesUpdate, MatchCreated, QueueJoined};
use serde::{Deserialize, Serialize};

/// Union of all outbound notifications, tagged with the wire event name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    QueueJoined(QueueJoined),
    MatchCreated(MatchCreated),
    MapVotesUpdate(MapVotesUpdate),
}

impl Notification {
    /// Wire event name for this notification
    pub fn event_name(&self) -> &'static str {
        match self {
            Notification::QueueJoined(_) => "queueJoined",
            Notification::MatchCreated(_) => "matchCreated",
            Notification::MapVotesUpdate(_) => "mapVotesUpdate",
        }
    }
}

/// Message serialization and validation utilities
pub struct MessageUtils;

impl MessageUtils {
    /// Decode an inbound join payload, normalizing malformed fields.
    ///
    /// A payload that is not a JSON object at all is rejected; malformed
    /// individual fields (bad elo, missing username) normalize to `None`
    /// for the engine to default.
    pub fn decode_join_request(bytes: &[u8]) -> Result<JoinRequest> {
        serde_json::from_slice(bytes).map_err(|e| {
            MatchmakingError::InternalError {
                message: format!("Failed to decode join request: {}", e),
            }
            .into()
        })
    }

    /// Encode an outbound notification to JSON bytes
    pub fn encode_notification(notification: &Notification) -> Result<Vec<u8>> {
        serde_json::to_vec(notification).map_err(|e| {
            MatchmakingError::InternalError {
                message: format!("Failed to encode notification: {}", e),
            }
            .into()
        })
    }

    /// Validate a connection id before it enters the core
    pub fn validate_connection_id(connection_id: &str) -> Result<()> {
        if connection_id.is_empty() {
            return Err(MatchmakingError::InternalError {
                message: "Connection id cannot be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
