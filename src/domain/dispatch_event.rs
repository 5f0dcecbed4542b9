//! Domain events reflecting marketplace state changes.
//!
//! Every lifecycle mutation emits a [`DispatchEvent`] through an
//! [`super::EventSink`]. Events are a latency optimisation for live
//! dashboards and driver clients: they are not persisted or replayed, and
//! the stores remain the source of truth.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{BidId, DriverId, JobId, JobStatus, Money};

/// Domain event emitted after every lifecycle mutation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum DispatchEvent {
    /// A driver placed a bid on an open job.
    NewBid {
        /// Job that was bid on.
        job_id: JobId,
        /// The new bid.
        bid_id: BidId,
        /// Bidding driver.
        driver_id: DriverId,
        /// Offered price in dollars.
        #[schema(value_type = f64)]
        bid_amount: Money,
        /// Placement timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The dealership accepted a bid; all sibling bids were rejected.
    BidAccepted {
        /// Job that was assigned.
        job_id: JobId,
        /// Winning bid.
        bid_id: BidId,
        /// Winning driver.
        driver_id: DriverId,
        /// Number of sibling bids moved to `rejected`.
        rejected_bids: usize,
        /// Acceptance timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A job changed status (acceptance or manual override).
    JobStatusUpdate {
        /// Job whose status changed.
        job_id: JobId,
        /// Status before the change.
        previous_status: JobStatus,
        /// Status after the change.
        status: JobStatus,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl DispatchEvent {
    /// Returns the job ID associated with this event.
    #[must_use]
    pub fn job_id(&self) -> JobId {
        match self {
            Self::NewBid { job_id, .. }
            | Self::BidAccepted { job_id, .. }
            | Self::JobStatusUpdate { job_id, .. } => *job_id,
        }
    }

    /// Returns the event name as sent on the push channel.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::NewBid { .. } => "newBid",
            Self::BidAccepted { .. } => "bidAccepted",
            Self::JobStatusUpdate { .. } => "jobStatusUpdate",
        }
    }
}
