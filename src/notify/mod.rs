//! Outbound notification seam
//!
//! The engine pushes acknowledgments and broadcasts through the [`Notifier`]
//! trait; the network transport that owns client connections implements it.

pub mod messages;
pub mod notifier;

pub use messages::{MessageUtils, Notification};
pub use notifier::{LoggingNotifier, Notifier, RecordedNotification, RecordingNotifier};
