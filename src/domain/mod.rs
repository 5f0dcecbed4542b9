//! Domain layer: marketplace types, lifecycle rules and the event system.
//!
//! Jobs, bids and drivers, the pure rules of the bid lifecycle, and the
//! event bus used to broadcast state changes.

pub mod bid;
pub mod dispatch_event;
pub mod driver;
pub mod event_bus;
pub mod ids;
pub mod job;
pub mod lifecycle;
pub mod money;

pub use bid::{Bid, BidStatus, BidWithDriver, BidWithJob, NewBid};
pub use dispatch_event::DispatchEvent;
pub use driver::{Driver, NewDriver, VerificationStatus};
pub use event_bus::{EventBus, EventSink};
pub use ids::{BidId, DriverId, JobId};
pub use job::{Job, JobFilter, JobStatus, JobSummary, NewJob, RouteEstimate};
pub use lifecycle::Acceptance;
pub use money::Money;
