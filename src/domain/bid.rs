//! Driver bids on delivery jobs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BidId, DriverId, JobId, JobStatus, Money};

/// Status of a bid. Set once when the job's winner is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    /// Waiting for the dealership to choose.
    Pending,
    /// Chosen as the job's winner.
    Accepted,
    /// Another bid won the job.
    Rejected,
}

impl BidStatus {
    /// Returns the wire/storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown bid status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bid status: {0}")]
pub struct UnknownBidStatus(pub String);

impl FromStr for BidStatus {
    type Err = UnknownBidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownBidStatus(other.to_string())),
        }
    }
}

/// A driver's priced, timed offer to fulfil a job.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Bid {
    /// Unique bid identifier.
    pub id: BidId,
    /// Job being bid on.
    pub job_id: JobId,
    /// Bidding driver.
    pub driver_id: DriverId,
    /// Offered price in dollars.
    #[schema(value_type = f64)]
    pub bid_amount: Money,
    /// Driver's estimate to complete the delivery, in minutes.
    pub estimated_completion_minutes: i64,
    /// Optional note to the dealership.
    pub message: Option<String>,
    /// Current status.
    pub status: BidStatus,
    /// Placement timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last status change.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new bid. Built by the dispatch service.
#[derive(Debug, Clone)]
pub struct NewBid {
    /// Job being bid on.
    pub job_id: JobId,
    /// Bidding driver.
    pub driver_id: DriverId,
    /// Offered price.
    pub bid_amount: Money,
    /// Estimated completion time in minutes.
    pub estimated_completion_minutes: i64,
    /// Optional note.
    pub message: Option<String>,
}

impl Bid {
    /// Builds a `pending` bid from validated input.
    #[must_use]
    pub fn pending(new: NewBid) -> Self {
        let now = Utc::now();
        Self {
            id: BidId::new(),
            job_id: new.job_id,
            driver_id: new.driver_id,
            bid_amount: new.bid_amount,
            estimated_completion_minutes: new.estimated_completion_minutes,
            message: new.message,
            status: BidStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A bid joined with the bidding driver's profile, for the job's bid list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BidWithDriver {
    /// The bid itself.
    #[serde(flatten)]
    pub bid: Bid,
    /// Driver's display name.
    pub driver_name: String,
    /// Driver's running rating.
    pub driver_rating: f64,
    /// Deliveries the driver has completed.
    pub completed_deliveries: i64,
    /// Driver's vehicle type.
    pub vehicle_type: String,
}

/// A bid joined with its job's summary fields, for the driver's bid list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BidWithJob {
    /// The bid itself.
    #[serde(flatten)]
    pub bid: Bid,
    /// Vehicle being delivered.
    pub vehicle_info: String,
    /// Pickup address.
    pub pickup_address: String,
    /// Delivery address.
    pub delivery_address: String,
    /// Requested delivery date.
    pub delivery_date: NaiveDate,
    /// Requested delivery window.
    pub delivery_window: String,
    /// Current status of the job.
    pub job_status: JobStatus,
}

/// Sorts bids lowest amount first, earliest placement breaking ties.
pub fn sort_by_amount(bids: &mut [BidWithDriver]) {
    bids.sort_by(|a, b| {
        a.bid
            .bid_amount
            .cmp(&b.bid.bid_amount)
            .then(a.bid.created_at.cmp(&b.bid.created_at))
    });
}
