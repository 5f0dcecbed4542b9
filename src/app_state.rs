//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::{EventBus, EventSink};
use crate::persistence::DispatchStore;
use crate::service::{BidPolicy, DispatchService, DriverService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Job and bid lifecycle.
    pub dispatch_service: Arc<DispatchService>,
    /// Driver accounts.
    pub driver_service: Arc<DriverService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires both services to `store`, publishing lifecycle events on
    /// `event_bus`.
    #[must_use]
    pub fn new(store: Arc<dyn DispatchStore>, event_bus: EventBus, policy: BidPolicy) -> Self {
        let sink: Arc<dyn EventSink> = Arc::new(event_bus.clone());
        Self {
            dispatch_service: Arc::new(DispatchService::new(Arc::clone(&store), sink, policy)),
            driver_service: Arc::new(DriverService::new(store, policy)),
            event_bus,
        }
    }
}
