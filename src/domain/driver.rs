//! Registered drivers and their licence verification state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::DriverId;

/// Default rating given to newly registered drivers.
pub const DEFAULT_RATING: f64 = 5.0;

/// Licence verification state of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Awaiting admin review.
    Pending,
    /// Licence checked and approved.
    Approved,
    /// Licence refused.
    Rejected,
}

impl VerificationStatus {
    /// Returns the wire/storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown verification status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verification status: {0}")]
pub struct UnknownVerificationStatus(pub String);

impl FromStr for VerificationStatus {
    type Err = UnknownVerificationStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownVerificationStatus(other.to_string())),
        }
    }
}

/// A driver registered with the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Driver {
    /// Unique driver identifier.
    pub id: DriverId,
    /// Display name.
    pub name: String,
    /// Contact email (unique).
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Driver's licence number (unique).
    pub license_number: String,
    /// Licence expiry date, when provided.
    pub license_expiry: Option<NaiveDate>,
    /// Vehicle used for deliveries (e.g. `"Flatbed Truck"`).
    pub vehicle_type: String,
    /// Running customer rating.
    pub rating: f64,
    /// Number of completed deliveries.
    pub completed_deliveries: i64,
    /// Licence verification state.
    pub verification_status: VerificationStatus,
    /// Reviewer notes from the last verification decision.
    pub verification_notes: Option<String>,
    /// When the last verification decision was made.
    pub verified_at: Option<DateTime<Utc>>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated registration input. Built by the driver service.
#[derive(Debug, Clone)]
pub struct NewDriver {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Licence number.
    pub license_number: String,
    /// Licence expiry date.
    pub license_expiry: Option<NaiveDate>,
    /// Vehicle type.
    pub vehicle_type: String,
}

impl Driver {
    /// Builds a newly registered driver awaiting verification.
    #[must_use]
    pub fn register(new: NewDriver) -> Self {
        Self {
            id: DriverId::new(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            license_number: new.license_number,
            license_expiry: new.license_expiry,
            vehicle_type: new.vehicle_type,
            rating: DEFAULT_RATING,
            completed_deliveries: 0,
            verification_status: VerificationStatus::Pending,
            verification_notes: None,
            verified_at: None,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if the driver's licence has been approved.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_driver() -> NewDriver {
        NewDriver {
            name: "Maria Garcia".to_string(),
            email: "maria@driver.com".to_string(),
            phone: "778-555-0102".to_string(),
            license_number: "DL234567".to_string(),
            license_expiry: None,
            vehicle_type: "Enclosed Trailer".to_string(),
        }
    }

    #[test]
    fn registered_driver_is_pending_with_default_rating() {
        let driver = Driver::register(new_driver());
        assert_eq!(driver.verification_status, VerificationStatus::Pending);
        assert!(!driver.is_verified());
        assert!((driver.rating - DEFAULT_RATING).abs() < f64::EPSILON);
        assert_eq!(driver.completed_deliveries, 0);
    }

    #[test]
    fn verification_status_round_trips() {
        for status in [
            VerificationStatus::Pending,
            VerificationStatus::Approved,
            VerificationStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<VerificationStatus>(), Ok(status));
        }
        assert!("suspended".parse::<VerificationStatus>().is_err());
    }
}
