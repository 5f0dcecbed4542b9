//! Database row models for drivers, jobs and bids.
//!
//! Rows carry raw column values (UUID blobs, status strings, cents) and
//! convert into domain types with `TryFrom`, failing with
//! [`GatewayError::Storage`] if a stored value is out of range.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::money::average_cents_to_dollars;
use crate::domain::{
    Bid, BidWithDriver, BidWithJob, Driver, Job, JobStatus, JobSummary, Money, VerificationStatus,
};
use crate::error::GatewayError;

fn corrupt(what: &str, err: impl std::fmt::Display) -> GatewayError {
    GatewayError::Storage(format!("corrupt {what} row: {err}"))
}

/// A row from the `delivery_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    /// Job ID.
    pub id: Uuid,
    /// Customer name.
    pub customer_name: String,
    /// Customer phone.
    pub customer_phone: Option<String>,
    /// Pickup address.
    pub pickup_address: String,
    /// Delivery address.
    pub delivery_address: String,
    /// Vehicle description.
    pub vehicle_info: String,
    /// Estimated distance.
    pub distance_km: f64,
    /// Estimated minutes.
    pub estimated_minutes: i64,
    /// Requested delivery date.
    pub delivery_date: NaiveDate,
    /// Requested delivery window.
    pub delivery_window: String,
    /// Driver instructions.
    pub special_instructions: Option<String>,
    /// Status string (e.g. `"in_progress"`).
    pub status: String,
    /// Accepted bid ID.
    pub winning_bid_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = GatewayError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status: JobStatus = row.status.parse().map_err(|e| corrupt("job", e))?;
        Ok(Self {
            id: row.id.into(),
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            pickup_address: row.pickup_address,
            delivery_address: row.delivery_address,
            vehicle_info: row.vehicle_info,
            distance_km: row.distance_km,
            estimated_minutes: row.estimated_minutes,
            delivery_date: row.delivery_date,
            delivery_window: row.delivery_window,
            special_instructions: row.special_instructions,
            status,
            winning_bid_id: row.winning_bid_id.map(Into::into),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A job row joined with its bid statistics.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobSummaryRow {
    /// The job columns.
    #[sqlx(flatten)]
    pub job: JobRow,
    /// `COUNT` of bids.
    pub bid_count: i64,
    /// `AVG` of bid amounts in cents.
    pub average_bid_cents: Option<f64>,
    /// Name of the winning driver.
    pub winning_driver: Option<String>,
}

impl TryFrom<JobSummaryRow> for JobSummary {
    type Error = GatewayError;

    fn try_from(row: JobSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            job: row.job.try_into()?,
            bid_count: row.bid_count,
            average_bid: row.average_bid_cents.map(average_cents_to_dollars),
            winning_driver: row.winning_driver,
        })
    }
}

/// A row from the `driver_bids` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BidRow {
    /// Bid ID.
    pub id: Uuid,
    /// Job the bid is on.
    pub job_id: Uuid,
    /// Bidding driver.
    pub driver_id: Uuid,
    /// Amount in cents.
    pub bid_amount_cents: i64,
    /// Driver's completion estimate.
    pub estimated_completion_minutes: i64,
    /// Optional note.
    pub message: Option<String>,
    /// Status string.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BidRow> for Bid {
    type Error = GatewayError;

    fn try_from(row: BidRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            job_id: row.job_id.into(),
            driver_id: row.driver_id.into(),
            bid_amount: Money::from_cents(row.bid_amount_cents),
            estimated_completion_minutes: row.estimated_completion_minutes,
            message: row.message,
            status: row.status.parse().map_err(|e| corrupt("bid", e))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A bid row joined with the bidding driver's profile.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BidWithDriverRow {
    /// The bid columns.
    #[sqlx(flatten)]
    pub bid: BidRow,
    /// Driver name.
    pub driver_name: String,
    /// Driver rating.
    pub driver_rating: f64,
    /// Driver's completed deliveries.
    pub completed_deliveries: i64,
    /// Driver's vehicle type.
    pub vehicle_type: String,
}

impl TryFrom<BidWithDriverRow> for BidWithDriver {
    type Error = GatewayError;

    fn try_from(row: BidWithDriverRow) -> Result<Self, Self::Error> {
        Ok(Self {
            bid: row.bid.try_into()?,
            driver_name: row.driver_name,
            driver_rating: row.driver_rating,
            completed_deliveries: row.completed_deliveries,
            vehicle_type: row.vehicle_type,
        })
    }
}

/// A bid row joined with its job's summary columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BidWithJobRow {
    /// The bid columns.
    #[sqlx(flatten)]
    pub bid: BidRow,
    /// Vehicle description.
    pub vehicle_info: String,
    /// Pickup address.
    pub pickup_address: String,
    /// Delivery address.
    pub delivery_address: String,
    /// Requested delivery date.
    pub delivery_date: NaiveDate,
    /// Requested delivery window.
    pub delivery_window: String,
    /// Job status string.
    pub job_status: String,
}

impl TryFrom<BidWithJobRow> for BidWithJob {
    type Error = GatewayError;

    fn try_from(row: BidWithJobRow) -> Result<Self, Self::Error> {
        Ok(Self {
            bid: row.bid.try_into()?,
            vehicle_info: row.vehicle_info,
            pickup_address: row.pickup_address,
            delivery_address: row.delivery_address,
            delivery_date: row.delivery_date,
            delivery_window: row.delivery_window,
            job_status: row.job_status.parse().map_err(|e| corrupt("job", e))?,
        })
    }
}

/// A row from the `drivers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DriverRow {
    /// Driver ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: String,
    /// Licence number.
    pub license_number: String,
    /// Licence expiry.
    pub license_expiry: Option<NaiveDate>,
    /// Vehicle type.
    pub vehicle_type: String,
    /// Rating.
    pub rating: f64,
    /// Completed deliveries.
    pub completed_deliveries: i64,
    /// Verification status string.
    pub verification_status: String,
    /// Admin notes.
    pub verification_notes: Option<String>,
    /// When the admin decided.
    pub verified_at: Option<DateTime<Utc>>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DriverRow> for Driver {
    type Error = GatewayError;

    fn try_from(row: DriverRow) -> Result<Self, Self::Error> {
        let verification_status: VerificationStatus = row
            .verification_status
            .parse()
            .map_err(|e| corrupt("driver", e))?;
        Ok(Self {
            id: row.id.into(),
            name: row.name,
            email: row.email,
            phone: row.phone,
            license_number: row.license_number,
            license_expiry: row.license_expiry,
            vehicle_type: row.vehicle_type,
            rating: row.rating,
            completed_deliveries: row.completed_deliveries,
            verification_status,
            verification_notes: row.verification_notes,
            verified_at: row.verified_at,
            created_at: row.created_at,
        })
    }
}

/// Converts a batch of rows, failing on the first corrupt one.
///
/// # Errors
///
/// Returns [`GatewayError::Storage`] if any row cannot be converted.
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, GatewayError>
where
    T: TryFrom<R, Error = GatewayError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn bid_row(status: &str) -> BidRow {
        BidRow {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            bid_amount_cents: 45_000,
            estimated_completion_minutes: 240,
            message: None,
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn bid_row_converts_cents_to_money() {
        let Ok(bid) = Bid::try_from(bid_row("pending")) else {
            panic!("valid row");
        };
        assert_eq!(bid.bid_amount, Money::from_cents(45_000));
    }

    #[test]
    fn unknown_status_is_a_storage_error() {
        let Err(err) = Bid::try_from(bid_row("withdrawn")) else {
            panic!("expected corrupt row error");
        };
        assert_eq!(err.kind(), "storage_error");
    }
}
