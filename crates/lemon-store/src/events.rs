//! Diagnostic event bus.
//!
//! Components emit [`StoreEvent`]s here; observers (logging sinks, crash
//! reporters, tests) subscribe. Each subscriber has an independent buffer;
//! a slow subscriber loses the oldest events rather than blocking writers.

use std::time::{SystemTime, UNIX_EPOCH};

use lemon_types::events::{Event, StoreEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Filter for event subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Category filter: "menu", "session".
    pub categories: Option<Vec<String>>,
    /// Only pass events that report a failure.
    #[serde(default)]
    pub failures_only: bool,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, kind: StoreEvent) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(Event { kind, timestamp });
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if self.failures_only && !event.kind.is_failure() {
            return false;
        }

        if let Some(ref categories) = self.categories {
            let category = event.kind.category();
            if !categories.iter().any(|c| c == category) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(StoreEvent::SessionCommitted);

        let event = rx.try_recv().expect("receive event");
        assert_eq!(event.kind, StoreEvent::SessionCommitted);
        assert!(event.timestamp > 0);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::default();
        bus.emit(StoreEvent::SessionCleared);

        // Late subscribers only see later events.
        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_filter() {
        let filter = EventFilter {
            categories: Some(vec!["session".to_string()]),
            failures_only: true,
        };

        let malformed = Event {
            kind: StoreEvent::MalformedRecord {
                key: "userData".to_string(),
                error: "expected value".to_string(),
            },
            timestamp: 1000,
        };
        assert!(filter.matches(&malformed));

        let committed = Event {
            kind: StoreEvent::SessionCommitted,
            timestamp: 1000,
        };
        assert!(!filter.matches(&committed));

        let row_failed = Event {
            kind: StoreEvent::RowWriteFailed {
                id: 3,
                reason: "duplicate id".to_string(),
            },
            timestamp: 1000,
        };
        assert!(!filter.matches(&row_failed));
        assert!(EventFilter::default().matches(&row_failed));
    }
}
