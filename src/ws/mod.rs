//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` pushes `newBid`, `bidAccepted` and
//! `jobStatusUpdate` events to live dashboards and driver clients, and
//! accepts subscription and lookup commands.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
