//! Persistence layer: job, bid and driver storage.
//!
//! The storage contract is split into [`JobStore`], [`BidStore`] and
//! [`DriverStore`]; [`DispatchStore`] is the union the service layer holds.
//! Two backends implement it:
//!
//! - [`sqlite::SqliteStore`]: durable storage through `sqlx::SqlitePool`.
//! - [`memory::MemoryStore`]: process-local maps behind a single lock,
//!   used for tests and throwaway deployments.
//!
//! Every multi-row mutation (placing a bid, accepting a bid, a status
//! compare-and-set) is atomic inside the backend, so concurrent requests
//! can never observe or produce a half-applied transition.

pub mod memory;
pub mod models;
pub mod seed;
pub mod sqlite;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{GatewayConfig, StorageBackend};
use crate::domain::{
    Acceptance, Bid, BidId, BidWithDriver, BidWithJob, Driver, DriverId, Job, JobFilter, JobId,
    JobStatus, JobSummary, VerificationStatus,
};
use crate::error::GatewayError;

/// Storage for delivery jobs.
#[async_trait]
pub trait JobStore: Send + Sync + Debug {
    /// Persists a newly created job.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on backend failure.
    async fn insert_job(&self, job: &Job) -> Result<(), GatewayError>;

    /// Fetches a job by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::JobNotFound`] if the job does not exist.
    async fn get_job(&self, id: JobId) -> Result<Job, GatewayError>;

    /// Lists jobs matching `filter`, newest first, with bid statistics.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on backend failure.
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobSummary>, GatewayError>;

    /// Moves a job from `expected` to `next` if it is still in `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::JobNotFound`] if the job does not exist, or
    /// [`GatewayError::InvalidTransition`] if its status changed since it
    /// was read.
    async fn update_job_status(
        &self,
        id: JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<Job, GatewayError>;

    /// Jobs won by `driver_id` that are still `assigned` or `in_progress`,
    /// earliest delivery date first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on backend failure.
    async fn list_assigned_jobs(&self, driver_id: DriverId) -> Result<Vec<Job>, GatewayError>;
}

/// Storage for driver bids.
#[async_trait]
pub trait BidStore: Send + Sync + Debug {
    /// Inserts a pending bid, atomically checking that its job exists and
    /// is open and that the driver has no other bid on it.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::JobNotFound`] if the job does not exist.
    /// - [`GatewayError::JobNotOpen`] if the job is no longer open.
    /// - [`GatewayError::DuplicateBid`] if the driver already bid.
    /// - [`GatewayError::DriverNotFound`] if the driver does not exist.
    async fn insert_bid(&self, bid: &Bid) -> Result<(), GatewayError>;

    /// Fetches a bid by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BidNotFound`] if the bid does not exist.
    async fn get_bid(&self, id: BidId) -> Result<Bid, GatewayError>;

    /// All bids on a job with driver details, lowest amount first and
    /// ties broken by submission order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on backend failure.
    async fn list_bids_for_job(&self, job_id: JobId) -> Result<Vec<BidWithDriver>, GatewayError>;

    /// All bids placed by a driver with job details, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on backend failure.
    async fn list_bids_for_driver(
        &self,
        driver_id: DriverId,
    ) -> Result<Vec<BidWithJob>, GatewayError>;

    /// Withdraws a bid and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BidNotFound`] if the bid does not exist, or
    /// [`GatewayError::InvalidTransition`] if it is the accepted bid.
    async fn delete_bid(&self, id: BidId) -> Result<Bid, GatewayError>;

    /// Accepts `bid_id` as the winner of `job_id` in one atomic step: the
    /// bid becomes `accepted`, every sibling becomes `rejected`, and the
    /// job becomes `assigned` with the winning bid recorded.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::JobNotFound`] / [`GatewayError::BidNotFound`] for
    ///   unknown IDs.
    /// - [`GatewayError::InvalidTransition`] if the job is not open, the bid
    ///   is not pending, or the bid belongs to another job. No state
    ///   changes in that case.
    async fn accept_bid(&self, job_id: JobId, bid_id: BidId) -> Result<Acceptance, GatewayError>;
}

/// Storage for driver accounts.
#[async_trait]
pub trait DriverStore: Send + Sync + Debug {
    /// Persists a newly registered driver.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DuplicateDriver`] if the email or licence
    /// number is already registered.
    async fn insert_driver(&self, driver: &Driver) -> Result<(), GatewayError>;

    /// Fetches a driver by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DriverNotFound`] if the driver does not exist.
    async fn get_driver(&self, id: DriverId) -> Result<Driver, GatewayError>;

    /// Finds the driver registered with this email and licence number.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on backend failure.
    async fn find_driver_by_credentials(
        &self,
        email: &str,
        license_number: &str,
    ) -> Result<Option<Driver>, GatewayError>;

    /// All drivers, newest registration first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on backend failure.
    async fn list_drivers(&self) -> Result<Vec<Driver>, GatewayError>;

    /// Records an admin verification decision.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DriverNotFound`] if the driver does not exist.
    async fn set_verification(
        &self,
        id: DriverId,
        status: VerificationStatus,
        notes: Option<String>,
    ) -> Result<Driver, GatewayError>;
}

/// Full storage contract used by the services.
pub trait DispatchStore: JobStore + BidStore + DriverStore {}

impl<T> DispatchStore for T where T: JobStore + BidStore + DriverStore {}

/// Opens the storage backend selected in `config`.
///
/// # Errors
///
/// Returns [`GatewayError::Storage`] if the database cannot be opened or
/// migrated.
pub async fn open_store(config: &GatewayConfig) -> Result<Arc<dyn DispatchStore>, GatewayError> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::info!("using in-memory storage");
            Ok(Arc::new(memory::MemoryStore::new()))
        }
        StorageBackend::Sqlite => {
            tracing::info!(url = %config.database_url, "opening SQLite storage");
            let store = sqlite::SqliteStore::connect(
                &config.database_url,
                config.database_max_connections,
                config.database_connect_timeout,
            )
            .await?;
            Ok(Arc::new(store))
        }
    }
}
