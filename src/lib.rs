//! # dispatch-gateway
//!
//! REST API and WebSocket gateway for a vehicle delivery-job bidding
//! marketplace.
//!
//! Dealerships post delivery jobs, drivers bid on open jobs, and the
//! dealership accepts exactly one bid. Acceptance is atomic: the chosen
//! bid becomes `accepted`, every sibling bid becomes `rejected` and the job
//! becomes `assigned`, or nothing changes at all. Each state change is
//! pushed to WebSocket observers.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── DispatchService / DriverService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     └── DispatchStore (persistence/)
//!           ├── SqliteStore
//!           └── MemoryStore
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod server;
pub mod service;
pub mod ws;
