//! SQLite implementation of the storage contract.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use super::models::{
    BidRow, BidWithDriverRow, BidWithJobRow, DriverRow, JobRow, JobSummaryRow, convert_all,
};
use super::{BidStore, DriverStore, JobStore};
use crate::domain::lifecycle::{self, Acceptance};
use crate::domain::{
    Bid, BidId, BidWithDriver, BidWithJob, Driver, DriverId, Job, JobFilter, JobId, JobStatus,
    JobSummary, VerificationStatus,
};
use crate::error::GatewayError;

const BIDS_WITH_DRIVER: &str = "SELECT b.*, d.name AS driver_name, d.rating AS driver_rating, \
     d.completed_deliveries, d.vehicle_type \
     FROM driver_bids b JOIN drivers d ON d.id = b.driver_id";

const BIDS_WITH_JOB: &str = "SELECT b.*, j.vehicle_info, j.pickup_address, j.delivery_address, \
     j.delivery_date, j.delivery_window, j.status AS job_status \
     FROM driver_bids b JOIN delivery_jobs j ON j.id = b.job_id";

/// SQLite-backed store using `sqlx::SqlitePool`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wraps an already migrated connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) and migrates the database at `url`.
    ///
    /// WAL journaling, a busy timeout and foreign keys are enabled on every
    /// connection. In-memory URLs are pinned to one connection so all
    /// queries see the same database.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] if the URL is invalid or the
    /// database cannot be opened or migrated.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let options = SqliteConnectOptions::from_str(url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .create_if_missing(true);

        let pool_options = SqlitePoolOptions::new().acquire_timeout(connect_timeout);
        let pool_options = if is_in_memory(url) {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| GatewayError::Storage(format!("migration failed: {e}")))?;

        Ok(Self::new(pool))
    }

    /// Opens a fresh private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] if migration fails.
    pub async fn in_memory() -> Result<Self, GatewayError> {
        Self::connect("sqlite::memory:", 1, Duration::from_secs(5)).await
    }

    /// Works out why a guarded acceptance update matched no row.
    async fn acceptance_conflict(&self, job_id: JobId, bid_id: BidId) -> GatewayError {
        let job = match self.get_job(job_id).await {
            Ok(job) => job,
            Err(err) => return err,
        };
        let bid = match self.get_bid(bid_id).await {
            Ok(bid) => bid,
            Err(err) => return err,
        };
        match lifecycle::check_acceptance(&job, &bid) {
            Err(err) => err,
            Ok(()) => GatewayError::InvalidTransition(format!(
                "job {job_id} changed while accepting bid {bid_id}"
            )),
        }
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Escapes `LIKE` wildcards and wraps the needle for a substring match.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl JobStore for SqliteStore {
    async fn insert_job(&self, job: &Job) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO delivery_jobs (id, customer_name, customer_phone, pickup_address, \
             delivery_address, vehicle_info, distance_km, estimated_minutes, delivery_date, \
             delivery_window, special_instructions, status, winning_bid_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::from(job.id))
        .bind(&job.customer_name)
        .bind(&job.customer_phone)
        .bind(&job.pickup_address)
        .bind(&job.delivery_address)
        .bind(&job.vehicle_info)
        .bind(job.distance_km)
        .bind(job.estimated_minutes)
        .bind(job.delivery_date)
        .bind(&job.delivery_window)
        .bind(&job.special_instructions)
        .bind(job.status.as_str())
        .bind(job.winning_bid_id.map(Uuid::from))
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<Job, GatewayError> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM delivery_jobs WHERE id = ?")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(GatewayError::JobNotFound(id))?;
        row.try_into()
    }

    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobSummary>, GatewayError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT j.*, COUNT(b.id) AS bid_count, AVG(b.bid_amount_cents) AS average_bid_cents, \
             wd.name AS winning_driver \
             FROM delivery_jobs j \
             LEFT JOIN driver_bids b ON b.job_id = j.id \
             LEFT JOIN driver_bids wb ON wb.id = j.winning_bid_id \
             LEFT JOIN drivers wd ON wd.id = wb.driver_id \
             WHERE 1 = 1",
        );
        if let Some(status) = filter.status {
            query.push(" AND j.status = ").push_bind(status.as_str());
        }
        if let Some(location) = &filter.location {
            let pattern = like_pattern(location);
            query
                .push(" AND (j.pickup_address LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR j.delivery_address LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        if let Some(date) = filter.delivery_date {
            query.push(" AND j.delivery_date = ").push_bind(date);
        }
        query.push(" GROUP BY j.id ORDER BY j.rowid DESC");

        let rows: Vec<JobSummaryRow> = query.build_query_as().fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn update_job_status(
        &self,
        id: JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<Job, GatewayError> {
        let updated = sqlx::query(
            "UPDATE delivery_jobs SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(next.as_str())
        .bind(Utc::now())
        .bind(Uuid::from(id))
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        let job = self.get_job(id).await?;
        if updated.rows_affected() == 0 {
            return Err(GatewayError::InvalidTransition(format!(
                "job {id} is now {}; expected {expected}",
                job.status
            )));
        }
        Ok(job)
    }

    async fn list_assigned_jobs(&self, driver_id: DriverId) -> Result<Vec<Job>, GatewayError> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT j.* FROM delivery_jobs j JOIN driver_bids b ON b.id = j.winning_bid_id \
             WHERE b.driver_id = ? AND j.status IN ('assigned', 'in_progress') \
             ORDER BY j.delivery_date ASC, j.rowid ASC",
        )
        .bind(Uuid::from(driver_id))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }
}

#[async_trait]
impl BidStore for SqliteStore {
    async fn insert_bid(&self, bid: &Bid) -> Result<(), GatewayError> {
        // The open-check and the insert are one statement.
        let inserted = sqlx::query(
            "INSERT INTO driver_bids (id, job_id, driver_id, bid_amount_cents, \
             estimated_completion_minutes, message, status, created_at, updated_at) \
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, ? \
             WHERE EXISTS (SELECT 1 FROM delivery_jobs WHERE id = ? AND status = 'open')",
        )
        .bind(Uuid::from(bid.id))
        .bind(Uuid::from(bid.job_id))
        .bind(Uuid::from(bid.driver_id))
        .bind(bid.bid_amount.cents())
        .bind(bid.estimated_completion_minutes)
        .bind(&bid.message)
        .bind(bid.status.as_str())
        .bind(bid.created_at)
        .bind(bid.updated_at)
        .bind(Uuid::from(bid.job_id))
        .execute(&self.pool)
        .await;

        let inserted = match inserted {
            Ok(result) => result,
            Err(err) if is_unique_violation(&err) => {
                return Err(GatewayError::DuplicateBid {
                    job_id: bid.job_id,
                    driver_id: bid.driver_id,
                });
            }
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(GatewayError::DriverNotFound(bid.driver_id));
            }
            Err(err) => return Err(err.into()),
        };

        if inserted.rows_affected() == 0 {
            let job = self.get_job(bid.job_id).await?;
            // An existing pair is a duplicate whatever the job's status.
            let existing: Option<i64> = sqlx::query_scalar(
                "SELECT 1 FROM driver_bids WHERE job_id = ?1 AND driver_id = ?2",
            )
            .bind(Uuid::from(bid.job_id))
            .bind(Uuid::from(bid.driver_id))
            .fetch_optional(&self.pool)
            .await?;
            if existing.is_some() {
                return Err(GatewayError::DuplicateBid {
                    job_id: bid.job_id,
                    driver_id: bid.driver_id,
                });
            }
            return Err(GatewayError::JobNotOpen {
                job_id: job.id,
                status: job.status,
            });
        }
        Ok(())
    }

    async fn get_bid(&self, id: BidId) -> Result<Bid, GatewayError> {
        let row = sqlx::query_as::<_, BidRow>("SELECT * FROM driver_bids WHERE id = ?")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(GatewayError::BidNotFound(id))?;
        row.try_into()
    }

    async fn list_bids_for_job(&self, job_id: JobId) -> Result<Vec<BidWithDriver>, GatewayError> {
        let rows = sqlx::query_as::<_, BidWithDriverRow>(&format!(
            "{BIDS_WITH_DRIVER} WHERE b.job_id = ? ORDER BY b.bid_amount_cents ASC, b.rowid ASC"
        ))
        .bind(Uuid::from(job_id))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn list_bids_for_driver(
        &self,
        driver_id: DriverId,
    ) -> Result<Vec<BidWithJob>, GatewayError> {
        let rows = sqlx::query_as::<_, BidWithJobRow>(&format!(
            "{BIDS_WITH_JOB} WHERE b.driver_id = ? ORDER BY b.rowid DESC"
        ))
        .bind(Uuid::from(driver_id))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn delete_bid(&self, id: BidId) -> Result<Bid, GatewayError> {
        let deleted = sqlx::query_as::<_, BidRow>(
            "DELETE FROM driver_bids WHERE id = ? AND status != 'accepted' RETURNING *",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await?;

        match deleted {
            Some(row) => row.try_into(),
            None => {
                // Either unknown, or the accepted bid.
                let bid = self.get_bid(id).await?;
                Err(GatewayError::InvalidTransition(format!(
                    "bid {} is {} and cannot be withdrawn",
                    bid.id, bid.status
                )))
            }
        }
    }

    async fn accept_bid(&self, job_id: JobId, bid_id: BidId) -> Result<Acceptance, GatewayError> {
        let now = Utc::now();
        let job_uuid = Uuid::from(job_id);
        let bid_uuid = Uuid::from(bid_id);
        let mut tx = self.pool.begin().await?;

        // Taking the write lock first makes concurrent acceptances queue
        // here; the loser then sees the job as assigned and matches nothing.
        let claimed = sqlx::query(
            "UPDATE delivery_jobs SET status = 'assigned', winning_bid_id = ?1, updated_at = ?2 \
             WHERE id = ?3 AND status = 'open' AND EXISTS (\
                 SELECT 1 FROM driver_bids WHERE id = ?1 AND job_id = ?3 AND status = 'pending')",
        )
        .bind(bid_uuid)
        .bind(now)
        .bind(job_uuid)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self.acceptance_conflict(job_id, bid_id).await);
        }

        sqlx::query("UPDATE driver_bids SET status = 'accepted', updated_at = ?1 WHERE id = ?2")
            .bind(now)
            .bind(bid_uuid)
            .execute(&mut *tx)
            .await?;

        let rejected: Vec<Uuid> = sqlx::query_scalar(
            "UPDATE driver_bids SET status = 'rejected', updated_at = ?1 \
             WHERE job_id = ?2 AND id != ?3 AND status = 'pending' RETURNING id",
        )
        .bind(now)
        .bind(job_uuid)
        .bind(bid_uuid)
        .fetch_all(&mut *tx)
        .await?;

        let job_row = sqlx::query_as::<_, JobRow>("SELECT * FROM delivery_jobs WHERE id = ?")
            .bind(job_uuid)
            .fetch_one(&mut *tx)
            .await?;
        let bid_row = sqlx::query_as::<_, BidRow>("SELECT * FROM driver_bids WHERE id = ?")
            .bind(bid_uuid)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Acceptance {
            job: job_row.try_into()?,
            bid: bid_row.try_into()?,
            rejected_bids: rejected.into_iter().map(BidId::from).collect(),
        })
    }
}

#[async_trait]
impl DriverStore for SqliteStore {
    async fn insert_driver(&self, driver: &Driver) -> Result<(), GatewayError> {
        let result = sqlx::query(
            "INSERT INTO drivers (id, name, email, phone, license_number, license_expiry, \
             vehicle_type, rating, completed_deliveries, verification_status, \
             verification_notes, verified_at, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::from(driver.id))
        .bind(&driver.name)
        .bind(&driver.email)
        .bind(&driver.phone)
        .bind(&driver.license_number)
        .bind(driver.license_expiry)
        .bind(&driver.vehicle_type)
        .bind(driver.rating)
        .bind(driver.completed_deliveries)
        .bind(driver.verification_status.as_str())
        .bind(&driver.verification_notes)
        .bind(driver.verified_at)
        .bind(driver.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(GatewayError::DuplicateDriver),
            Err(err) => Err(err.into()),
        }
    }

    async fn get_driver(&self, id: DriverId) -> Result<Driver, GatewayError> {
        let row = sqlx::query_as::<_, DriverRow>("SELECT * FROM drivers WHERE id = ?")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(GatewayError::DriverNotFound(id))?;
        row.try_into()
    }

    async fn find_driver_by_credentials(
        &self,
        email: &str,
        license_number: &str,
    ) -> Result<Option<Driver>, GatewayError> {
        sqlx::query_as::<_, DriverRow>(
            "SELECT * FROM drivers WHERE email = ? AND license_number = ?",
        )
        .bind(email)
        .bind(license_number)
        .fetch_optional(&self.pool)
        .await?
        .map(Driver::try_from)
        .transpose()
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>, GatewayError> {
        let rows = sqlx::query_as::<_, DriverRow>("SELECT * FROM drivers ORDER BY rowid DESC")
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn set_verification(
        &self,
        id: DriverId,
        status: VerificationStatus,
        notes: Option<String>,
    ) -> Result<Driver, GatewayError> {
        sqlx::query_as::<_, DriverRow>(
            "UPDATE drivers SET verification_status = ?, verification_notes = ?, verified_at = ? \
             WHERE id = ? RETURNING *",
        )
        .bind(status.as_str())
        .bind(notes)
        .bind(Utc::now())
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(GatewayError::DriverNotFound(id))?
        .try_into()
    }
}
