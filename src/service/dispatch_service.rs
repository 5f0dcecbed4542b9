//! Dispatch service: job and bid lifecycle orchestration.

use std::sync::Arc;

use chrono::Utc;

use super::{BidPolicy, require_text};
use crate::domain::lifecycle::{self, Acceptance};
use crate::domain::{
    Bid, BidId, BidWithDriver, BidWithJob, DispatchEvent, DriverId, EventSink, Job, JobFilter,
    JobId, JobStatus, JobSummary, NewBid, NewJob,
};
use crate::error::GatewayError;
use crate::persistence::{BidStore, DispatchStore, DriverStore, JobStore};

/// Orchestration layer for delivery jobs and bids.
///
/// Stateless coordinator: owns the [`DispatchStore`] for state and an
/// [`EventSink`] for notifications. Every mutation follows the pattern:
/// validate → apply atomically in the store → emit events → return result.
/// Events are only emitted after the store reports success.
#[derive(Debug, Clone)]
pub struct DispatchService {
    store: Arc<dyn DispatchStore>,
    events: Arc<dyn EventSink>,
    policy: BidPolicy,
}

impl DispatchService {
    /// Creates a new `DispatchService`.
    #[must_use]
    pub fn new(store: Arc<dyn DispatchStore>, events: Arc<dyn EventSink>, policy: BidPolicy) -> Self {
        Self {
            store,
            events,
            policy,
        }
    }

    /// Returns the bidding policy in force.
    #[must_use]
    pub const fn policy(&self) -> BidPolicy {
        self.policy
    }

    /// Posts a new delivery job in `open` status.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] if a required field is blank,
    /// or a storage error.
    pub async fn create_job(&self, new: NewJob) -> Result<Job, GatewayError> {
        let new = NewJob {
            customer_name: require_text("customer_name", new.customer_name)?,
            pickup_address: require_text("pickup_address", new.pickup_address)?,
            delivery_address: require_text("delivery_address", new.delivery_address)?,
            vehicle_info: require_text("vehicle_info", new.vehicle_info)?,
            delivery_window: require_text("delivery_window", new.delivery_window)?,
            ..new
        };
        let job = Job::open(new);
        self.store.insert_job(&job).await?;
        tracing::info!(
            job_id = %job.id,
            distance_km = job.distance_km,
            delivery_date = %job.delivery_date,
            "delivery job created"
        );
        Ok(job)
    }

    /// Lists jobs matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobSummary>, GatewayError> {
        self.store.list_jobs(filter).await
    }

    /// Fetches a job.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::JobNotFound`] if the job does not exist.
    pub async fn get_job(&self, job_id: JobId) -> Result<Job, GatewayError> {
        self.store.get_job(job_id).await
    }

    /// Fetches a job together with its bids, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::JobNotFound`] if the job does not exist.
    pub async fn job_with_bids(
        &self,
        job_id: JobId,
    ) -> Result<(Job, Vec<BidWithDriver>), GatewayError> {
        let job = self.store.get_job(job_id).await?;
        let bids = self.store.list_bids_for_job(job_id).await?;
        Ok((job, bids))
    }

    /// Manually overrides a job's status.
    ///
    /// Setting the current status again is a no-op and emits nothing.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::JobNotFound`] if the job does not exist.
    /// - [`GatewayError::InvalidTransition`] if the override does not follow
    ///   the job lifecycle, or the job changed concurrently.
    pub async fn set_job_status(
        &self,
        job_id: JobId,
        target: JobStatus,
    ) -> Result<Job, GatewayError> {
        let job = self.store.get_job(job_id).await?;
        lifecycle::check_status_override(&job, target)?;
        if job.status == target {
            return Ok(job);
        }

        let previous_status = job.status;
        let updated = self
            .store
            .update_job_status(job_id, previous_status, target)
            .await?;

        self.events.publish(DispatchEvent::JobStatusUpdate {
            job_id,
            previous_status,
            status: target,
            timestamp: updated.updated_at,
        });
        tracing::info!(%job_id, from = %previous_status, to = %target, "job status overridden");
        Ok(updated)
    }

    /// Places a pending bid on an open job.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Validation`] for a non-positive amount or ETA.
    /// - [`GatewayError::DriverNotFound`] / [`GatewayError::JobNotFound`].
    /// - [`GatewayError::DriverNotVerified`] when the verification policy
    ///   is on and the driver is not approved.
    /// - [`GatewayError::DuplicateBid`] / [`GatewayError::JobNotOpen`].
    pub async fn place_bid(&self, new: NewBid) -> Result<Bid, GatewayError> {
        if !new.bid_amount.is_positive() {
            return Err(GatewayError::Validation(
                "bid_amount must be greater than zero".to_string(),
            ));
        }
        if new.estimated_completion_minutes <= 0 {
            return Err(GatewayError::Validation(
                "estimated_completion_time must be greater than zero".to_string(),
            ));
        }

        let driver = self.store.get_driver(new.driver_id).await?;
        if self.policy.require_verified_driver && !driver.is_verified() {
            return Err(GatewayError::DriverNotVerified(driver.id));
        }

        let bid = Bid::pending(NewBid {
            message: new.message.filter(|m| !m.trim().is_empty()),
            ..new
        });
        self.store.insert_bid(&bid).await?;

        self.events.publish(DispatchEvent::NewBid {
            job_id: bid.job_id,
            bid_id: bid.id,
            driver_id: bid.driver_id,
            bid_amount: bid.bid_amount,
            timestamp: bid.created_at,
        });
        tracing::info!(
            job_id = %bid.job_id,
            bid_id = %bid.id,
            driver_id = %bid.driver_id,
            amount = %bid.bid_amount,
            "bid placed"
        );
        Ok(bid)
    }

    /// Bids on a job, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::JobNotFound`] if the job does not exist.
    pub async fn list_bids_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<BidWithDriver>, GatewayError> {
        self.store.get_job(job_id).await?;
        self.store.list_bids_for_job(job_id).await
    }

    /// Bids placed by a driver, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DriverNotFound`] if the driver does not exist.
    pub async fn list_bids_for_driver(
        &self,
        driver_id: DriverId,
    ) -> Result<Vec<BidWithJob>, GatewayError> {
        self.store.get_driver(driver_id).await?;
        self.store.list_bids_for_driver(driver_id).await
    }

    /// Jobs the driver has won that are not finished yet.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DriverNotFound`] if the driver does not exist.
    pub async fn assigned_jobs(&self, driver_id: DriverId) -> Result<Vec<Job>, GatewayError> {
        self.store.get_driver(driver_id).await?;
        self.store.list_assigned_jobs(driver_id).await
    }

    /// Withdraws a pending or rejected bid.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BidNotFound`] if the bid does not exist, or
    /// [`GatewayError::InvalidTransition`] for the accepted bid.
    pub async fn cancel_bid(&self, bid_id: BidId) -> Result<Bid, GatewayError> {
        let bid = self.store.delete_bid(bid_id).await?;
        tracing::info!(%bid_id, job_id = %bid.job_id, "bid withdrawn");
        Ok(bid)
    }

    /// Accepts a bid: the job becomes `assigned`, the bid `accepted` and
    /// every other bid on the job `rejected`, all at once.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::JobNotFound`] / [`GatewayError::BidNotFound`].
    /// - [`GatewayError::InvalidTransition`] if the job is not open or the
    ///   bid is not a pending bid on it. Nothing changes in that case.
    pub async fn accept_bid(
        &self,
        job_id: JobId,
        bid_id: BidId,
    ) -> Result<Acceptance, GatewayError> {
        let acceptance = self.store.accept_bid(job_id, bid_id).await?;

        let timestamp = Utc::now();
        self.events.publish(DispatchEvent::BidAccepted {
            job_id,
            bid_id,
            driver_id: acceptance.bid.driver_id,
            rejected_bids: acceptance.rejected_bids.len(),
            timestamp,
        });
        self.events.publish(DispatchEvent::JobStatusUpdate {
            job_id,
            previous_status: JobStatus::Open,
            status: JobStatus::Assigned,
            timestamp,
        });
        tracing::info!(
            %job_id,
            %bid_id,
            driver_id = %acceptance.bid.driver_id,
            rejected = acceptance.rejected_bids.len(),
            "bid accepted"
        );
        Ok(acceptance)
    }
}
