//! Delivery-job DTOs: create, list, status override and bid acceptance.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::common_dto::{PaginationMeta, PaginationParams, parse_date, required};
use crate::domain::{Bid, BidId, BidWithDriver, Job, JobFilter, JobStatus, JobSummary, NewJob};
use crate::error::GatewayError;

/// Query string for `GET /delivery-jobs`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JobListQuery {
    /// Only jobs in this status (e.g. `open`).
    pub status: Option<String>,
    /// Case-insensitive substring of the pickup or delivery address.
    pub location: Option<String>,
    /// Only jobs due on this `YYYY-MM-DD` date.
    pub date: Option<String>,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "crate::api::dto::common_dto::default_page")]
    #[param(default = 1)]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "crate::api::dto::common_dto::default_per_page")]
    #[param(default = 20)]
    pub per_page: u32,
}

impl JobListQuery {
    /// Pagination part of the query.
    #[must_use]
    pub const fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }

    /// Filter part of the query. Blank values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for an unknown status or a
    /// malformed date.
    pub fn filter(&self) -> Result<JobFilter, GatewayError> {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let status = non_blank(&self.status)
            .map(|s| s.parse::<JobStatus>())
            .transpose()
            .map_err(|e| GatewayError::Validation(e.to_string()))?;
        let delivery_date = non_blank(&self.date)
            .map(|d| parse_date("date", &d))
            .transpose()?;
        Ok(JobFilter {
            status,
            location: non_blank(&self.location),
            delivery_date,
        })
    }
}

/// Request body for `POST /delivery-jobs`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateJobRequest {
    /// Customer receiving the vehicle.
    pub customer_name: Option<String>,
    /// Optional customer contact number.
    pub customer_phone: Option<String>,
    /// Pickup address.
    pub pickup_address: Option<String>,
    /// Delivery address.
    pub delivery_address: Option<String>,
    /// Vehicle description.
    pub vehicle_info: Option<String>,
    /// Requested delivery date, `YYYY-MM-DD`.
    pub delivery_date: Option<String>,
    /// Requested delivery window (e.g. `"9:00 AM - 12:00 PM"`).
    pub delivery_window: Option<String>,
    /// Free-text instructions for the driver.
    pub special_instructions: Option<String>,
}

impl TryFrom<CreateJobRequest> for NewJob {
    type Error = GatewayError;

    fn try_from(req: CreateJobRequest) -> Result<Self, Self::Error> {
        let delivery_date = required("delivery_date", req.delivery_date)?;
        Ok(Self {
            customer_name: required("customer_name", req.customer_name)?,
            customer_phone: req.customer_phone.filter(|p| !p.trim().is_empty()),
            pickup_address: required("pickup_address", req.pickup_address)?,
            delivery_address: required("delivery_address", req.delivery_address)?,
            vehicle_info: required("vehicle_info", req.vehicle_info)?,
            delivery_date: parse_date("delivery_date", &delivery_date)?,
            delivery_window: required("delivery_window", req.delivery_window)?,
            special_instructions: req.special_instructions.filter(|s| !s.trim().is_empty()),
        })
    }
}

/// Paginated list response for `GET /delivery-jobs`.
#[derive(Debug, Serialize, ToSchema)]
pub struct JobListResponse {
    /// Jobs on this page, newest first.
    pub data: Vec<JobSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for `GET /delivery-jobs/{id}/bids`.
#[derive(Debug, Serialize, ToSchema)]
pub struct JobBidsResponse {
    /// The job.
    pub job: Job,
    /// Its bids, cheapest first.
    pub bids: Vec<BidWithDriver>,
}

/// Request body for `POST /delivery-jobs/{id}/accept-bid`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct AcceptBidRequest {
    /// Bid to accept.
    #[serde(rename = "bidId", alias = "bid_id")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub bid_id: Option<Uuid>,
}

/// Response body for a successful acceptance.
#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptBidResponse {
    /// Human-readable confirmation.
    pub message: String,
    /// The job, now `assigned`.
    pub job: Job,
    /// The winning bid, now `accepted`.
    pub bid: Bid,
    /// Sibling bids moved to `rejected`.
    pub rejected_bids: Vec<BidId>,
}

/// Request body for `PUT /delivery-jobs/{id}/status`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateJobStatusRequest {
    /// Target status (e.g. `in_progress`).
    pub status: Option<String>,
}

impl UpdateJobStatusRequest {
    /// Parses the target status.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] if the status is missing or
    /// unknown.
    pub fn target(&self) -> Result<JobStatus, GatewayError> {
        required("status", self.status.as_deref())?
            .trim()
            .parse()
            .map_err(|e: crate::domain::job::UnknownJobStatus| {
                GatewayError::Validation(e.to_string())
            })
    }
}

/// One entry of the job-status catalogue.
#[derive(Debug, Serialize, ToSchema)]
pub struct JobStatusInfo {
    /// The status.
    pub status: JobStatus,
    /// What the status means.
    pub description: &'static str,
    /// Whether the status requires an accepted bid.
    pub requires_winning_bid: bool,
    /// Statuses a manual override may move a job to from here.
    pub override_targets: Vec<JobStatus>,
}
