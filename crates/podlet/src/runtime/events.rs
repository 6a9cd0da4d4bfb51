//! Container event recording.
//!
//! Events are attributed to an [`ObjectReference`] and handed to an
//! [`EventRecorder`]. [`EventBus`] is the in-process recorder: it fans
//! events out to any number of subscribers over a broadcast channel.

use chrono::{DateTime, Utc};
use podlet_api::ObjectReference;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Container created.
pub const CREATED_CONTAINER: &str = "Created";
/// Container started.
pub const STARTED_CONTAINER: &str = "Started";
/// Container could not be created.
pub const FAILED_TO_CREATE_CONTAINER: &str = "Failed";
/// Container could not be started.
pub const FAILED_TO_START_CONTAINER: &str = "Failed";
/// Container is being killed.
pub const KILLING_CONTAINER: &str = "Killing";
/// Post-start hook failed.
pub const FAILED_POST_START_HOOK: &str = "FailedPostStartHook";
/// Pre-stop hook failed.
pub const FAILED_PRE_STOP_HOOK: &str = "FailedPreStopHook";

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Expected lifecycle progress.
    Normal,
    /// Something went wrong.
    Warning,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Warning => write!(f, "Warning"),
        }
    }
}

/// Sink for container events.
pub trait EventRecorder: Send + Sync {
    /// Record one event against `reference`.
    fn event(&self, reference: &ObjectReference, event_type: EventType, reason: &str, message: &str);
}

/// An event as published on the [`EventBus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// The object the event is about.
    pub reference: ObjectReference,
    /// Severity.
    pub event_type: EventType,
    /// Machine-readable reason.
    pub reason: String,
    /// Human-readable message.
    pub message: String,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Broadcast-backed event recorder.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RecordedEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self { sender }
    }
}

impl EventBus {
    /// Create a new event bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RecordedEvent> {
        self.sender.subscribe()
    }
}

impl EventRecorder for EventBus {
    fn event(&self, reference: &ObjectReference, event_type: EventType, reason: &str, message: &str) {
        tracing::debug!(
            object = %reference.name,
            field_path = %reference.field_path,
            %event_type,
            reason,
            event_message = message,
            "Recording event"
        );
        // Ignore SendError (no subscribers)
        let _ = self.sender.send(RecordedEvent {
            reference: reference.clone(),
            event_type,
            reason: reason.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }
}
