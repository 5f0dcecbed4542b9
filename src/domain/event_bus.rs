//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every lifecycle
//! mutation publishes a [`DispatchEvent`] through the bus, and all
//! WebSocket connections subscribe to receive (optionally filtered) events.

use std::fmt::Debug;

use tokio::sync::broadcast;

use super::DispatchEvent;

/// Destination for lifecycle events.
///
/// The dispatch service publishes only through this trait; [`EventBus`] is
/// the production implementation.
pub trait EventSink: Send + Sync + Debug {
    /// Publishes an event, returning how many observers received it.
    fn publish(&self, event: DispatchEvent) -> usize;
}

/// Broadcast bus for [`DispatchEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers. Observers that subscribe after an event miss it permanently.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DispatchEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Creates a new receiver that will receive all future events.
    ///
    /// Each WebSocket connection should call this once on connect.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for EventBus {
    /// If there are no active receivers, the event is silently dropped.
    fn publish(&self, event: DispatchEvent) -> usize {
        let kind = event.event_type_str();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::debug!(event = kind, delivered, "event published");
        delivered
    }
}
