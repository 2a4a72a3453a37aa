//! # Event Bus System
//!
//! Broadcasts upload lifecycle events using `tokio::sync::broadcast`, so a host
//! can drive toasts, analytics, or debugging panels without hooking into the
//! widget itself.
//!
//! ## Overview
//!
//! - **Event Types**: [`UploadEvent`], one variant per observable transition
//! - **EventBus**: central broadcast channel, shareable between widgets
//! - **Subscriptions**: every subscriber receives every event emitted after it subscribed
//!
//! Several widgets can share one bus; each event carries the `widget` id of the
//! instance that produced it.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, UploadEvent};
//!
//! let bus = EventBus::new(32);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(UploadEvent::ValueEmitted {
//!     widget: "gallery".to_string(),
//!     urls: vec!["https://cdn/a.png".to_string()],
//! })
//! .ok();
//!
//! assert!(rx.try_recv().is_ok());
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n` events.
//!   Non-fatal; keep receiving.
//! - **`RecvError::Closed`**: the bus was dropped. Treat as shutdown.
//!
//! Emitting with no subscribers returns `Err`; widgets ignore that case.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// A file the validation gate turned away.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RejectedFile {
    pub name: String,
    /// Human-readable reason, as shown to the user
    pub message: String,
}

/// Events emitted by upload widgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum UploadEvent {
    /// One or more files of a selection failed validation.
    FilesRejected {
        widget: String,
        files: Vec<RejectedFile>,
    },
    /// A batch was accepted and its local previews are visible.
    BatchStarted {
        widget: String,
        batch_id: String,
        entry_ids: Vec<String>,
    },
    /// A batch uploaded and its entries were promoted.
    BatchCommitted {
        widget: String,
        batch_id: String,
        /// Entries promoted in place
        committed: usize,
        /// Entries the user removed while the upload was running
        dropped: usize,
    },
    /// A batch failed and its entries were rolled back.
    BatchFailed {
        widget: String,
        batch_id: String,
        message: String,
        rolled_back: usize,
    },
    /// A response arrived for a batch whose entries were all removed meanwhile.
    ResponseDropped { widget: String, batch_id: String },
    /// The widget emitted a new committed URL list to its owner.
    ValueEmitted { widget: String, urls: Vec<String> },
    /// The store was rebuilt from an external canonical value.
    Rebuilt { widget: String, entries: usize },
}

impl UploadEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &'static str {
        match self {
            UploadEvent::FilesRejected { .. } => "Files rejected",
            UploadEvent::BatchStarted { .. } => "Upload started",
            UploadEvent::BatchCommitted { .. } => "Upload completed",
            UploadEvent::BatchFailed { .. } => "Upload failed",
            UploadEvent::ResponseDropped { .. } => "Stale upload response dropped",
            UploadEvent::ValueEmitted { .. } => "Value emitted",
            UploadEvent::Rebuilt { .. } => "Previews rebuilt from value",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            UploadEvent::BatchFailed { .. } => EventSeverity::Error,
            UploadEvent::FilesRejected { .. } => EventSeverity::Warning,
            UploadEvent::BatchCommitted { .. } => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Id of the widget that produced the event.
    pub fn widget(&self) -> &str {
        match self {
            UploadEvent::FilesRejected { widget, .. }
            | UploadEvent::BatchStarted { widget, .. }
            | UploadEvent::BatchCommitted { widget, .. }
            | UploadEvent::BatchFailed { widget, .. }
            | UploadEvent::ResponseDropped { widget, .. }
            | UploadEvent::ValueEmitted { widget, .. }
            | UploadEvent::Rebuilt { widget, .. } => widget,
        }
    }
}

impl fmt::Display for UploadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.widget(), self.description())
    }
}

/// Central broadcast channel for upload events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<UploadEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: UploadEvent) -> Result<usize, SendError<UploadEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<UploadEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_emitted(widget: &str) -> UploadEvent {
        UploadEvent::ValueEmitted {
            widget: widget.to_string(),
            urls: vec!["https://cdn/a.png".to_string()],
        }
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(value_emitted("w")).is_err());
    }

    #[tokio::test]
    async fn test_event_emission_with_subscribers() {
        let bus = EventBus::new(10);
        let mut sub = bus.subscribe();

        let event = value_emitted("profile");
        assert_eq!(bus.emit(event.clone()).unwrap(), 1);
        assert_eq!(sub.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for _ in 0..4 {
            bus.emit(value_emitted("w")).unwrap();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(2))));
        assert!(sub.recv().await.is_ok());
    }

    #[test]
    fn test_event_severity() {
        let failed = UploadEvent::BatchFailed {
            widget: "w".to_string(),
            batch_id: "b".to_string(),
            message: "boom".to_string(),
            rolled_back: 2,
        };
        assert_eq!(failed.severity(), EventSeverity::Error);
        assert_eq!(value_emitted("w").severity(), EventSeverity::Debug);
        assert!(EventSeverity::Error > EventSeverity::Warning);
    }

    #[test]
    fn test_event_serialization() {
        let event = UploadEvent::Rebuilt {
            widget: "gallery".to_string(),
            entries: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "Rebuilt");
        assert_eq!(json["entries"], 3);

        let back: UploadEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(value_emitted("gallery").to_string(), "[gallery] Value emitted");
    }
}
