//! Delivery jobs and their status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BidId, JobId};

/// Lifecycle status of a delivery job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Posted and accepting bids.
    Open,
    /// A bid has been accepted.
    Assigned,
    /// The winning driver is on the road.
    InProgress,
    /// Delivered.
    Completed,
    /// Withdrawn by the dealership.
    Cancelled,
}

impl JobStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::Assigned,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Returns the wire/storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses that can only hold while the job has an accepted bid.
    #[must_use]
    pub const fn requires_winning_bid(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress | Self::Completed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown job status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job status: {0}")]
pub struct UnknownJobStatus(pub String);

impl FromStr for JobStatus {
    type Err = UnknownJobStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownJobStatus(s.to_string()))
    }
}

/// A delivery job posted by the dealership.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// Customer receiving the vehicle.
    pub customer_name: String,
    /// Optional customer contact number.
    pub customer_phone: Option<String>,
    /// Where the driver collects the vehicle.
    pub pickup_address: String,
    /// Where the vehicle is delivered.
    pub delivery_address: String,
    /// Vehicle description (e.g. `"2022 Honda Civic - Blue"`).
    pub vehicle_info: String,
    /// Estimated route distance in kilometres.
    pub distance_km: f64,
    /// Estimated driving time in minutes.
    pub estimated_minutes: i64,
    /// Requested delivery date.
    pub delivery_date: NaiveDate,
    /// Requested delivery window (e.g. `"9:00 AM - 12:00 PM"`).
    pub delivery_window: String,
    /// Free-text instructions for the driver.
    pub special_instructions: Option<String>,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// The accepted bid, once the job is assigned.
    pub winning_bid_id: Option<BidId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last status change.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new job. Built by the dispatch service.
#[derive(Debug, Clone)]
pub struct NewJob {
    /// Customer receiving the vehicle.
    pub customer_name: String,
    /// Optional customer contact number.
    pub customer_phone: Option<String>,
    /// Pickup address.
    pub pickup_address: String,
    /// Delivery address.
    pub delivery_address: String,
    /// Vehicle description.
    pub vehicle_info: String,
    /// Requested delivery date.
    pub delivery_date: NaiveDate,
    /// Requested delivery window.
    pub delivery_window: String,
    /// Free-text instructions.
    pub special_instructions: Option<String>,
}

impl Job {
    /// Builds a freshly posted, `open` job with a route estimate.
    #[must_use]
    pub fn open(new: NewJob) -> Self {
        let estimate = RouteEstimate::between(&new.pickup_address, &new.delivery_address);
        let now = Utc::now();
        Self {
            id: JobId::new(),
            customer_name: new.customer_name,
            customer_phone: new.customer_phone,
            pickup_address: new.pickup_address,
            delivery_address: new.delivery_address,
            vehicle_info: new.vehicle_info,
            distance_km: estimate.distance_km,
            estimated_minutes: estimate.minutes,
            delivery_date: new.delivery_date,
            delivery_window: new.delivery_window,
            special_instructions: new.special_instructions,
            status: JobStatus::Open,
            winning_bid_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Placeholder route estimate until a routing provider is wired in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEstimate {
    /// Distance in kilometres, between 10 and 59.
    pub distance_km: f64,
    /// Driving time in minutes (two minutes per kilometre).
    pub minutes: i64,
}

impl RouteEstimate {
    /// Derives a stable estimate from the two addresses.
    #[must_use]
    pub fn between(pickup: &str, delivery: &str) -> Self {
        // FNV-1a over both addresses keeps the estimate stable per route.
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in pickup.bytes().chain([0u8]).chain(delivery.bytes()) {
            hash ^= u64::from(byte.to_ascii_lowercase());
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        let km = 10 + (hash % 50);
        #[allow(clippy::cast_precision_loss)]
        let distance_km = km as f64;
        Self {
            distance_km,
            minutes: i64::try_from(km * 2).unwrap_or(i64::MAX),
        }
    }
}

/// Filters for job listings. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Only jobs in this status.
    pub status: Option<JobStatus>,
    /// Case-insensitive substring of the pickup or delivery address.
    pub location: Option<String>,
    /// Only jobs due on this date.
    pub delivery_date: Option<NaiveDate>,
}

impl JobFilter {
    /// Returns `true` if the job satisfies every filter.
    #[must_use]
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(status) = self.status
            && job.status != status
        {
            return false;
        }
        if let Some(date) = self.delivery_date
            && job.delivery_date != date
        {
            return false;
        }
        if let Some(location) = &self.location {
            let needle = location.to_lowercase();
            return job.pickup_address.to_lowercase().contains(&needle)
                || job.delivery_address.to_lowercase().contains(&needle);
        }
        true
    }
}

/// A job decorated with bid statistics for list endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobSummary {
    /// The job itself.
    #[serde(flatten)]
    pub job: Job,
    /// Number of bids placed on the job.
    pub bid_count: i64,
    /// Average bid amount in dollars, if any bids exist.
    pub average_bid: Option<f64>,
    /// Name of the driver holding the winning bid.
    pub winning_driver: Option<String>,
}
