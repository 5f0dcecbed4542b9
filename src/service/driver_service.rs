//! Driver service: registration, login and licence verification.

use std::sync::Arc;

use super::{BidPolicy, require_text};
use crate::domain::{Driver, DriverId, NewDriver, VerificationStatus};
use crate::error::GatewayError;
use crate::persistence::{DispatchStore, DriverStore};

/// Driver account operations.
#[derive(Debug, Clone)]
pub struct DriverService {
    store: Arc<dyn DispatchStore>,
    policy: BidPolicy,
}

impl DriverService {
    /// Creates a new `DriverService`.
    #[must_use]
    pub fn new(store: Arc<dyn DispatchStore>, policy: BidPolicy) -> Self {
        Self { store, policy }
    }

    /// Registers a driver in `pending` verification status.
    ///
    /// Emails are stored lowercased so login is case-insensitive.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Validation`] if a required field is blank or the
    ///   email is malformed.
    /// - [`GatewayError::DuplicateDriver`] if the email or licence number is
    ///   taken.
    pub async fn register(&self, new: NewDriver) -> Result<Driver, GatewayError> {
        let email = normalize_email(&require_text("email", new.email)?)?;
        let new = NewDriver {
            name: require_text("name", new.name)?,
            email,
            phone: require_text("phone", new.phone)?,
            license_number: require_text("license_number", new.license_number)?,
            vehicle_type: require_text("vehicle_type", new.vehicle_type)?,
            ..new
        };
        let driver = Driver::register(new);
        self.store.insert_driver(&driver).await?;
        tracing::info!(driver_id = %driver.id, "driver registered");
        Ok(driver)
    }

    /// Logs a driver in with email and licence number.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidCredentials`] if no driver matches.
    /// - [`GatewayError::DriverNotVerified`] if the driver was rejected, or
    ///   is still pending while the verification policy is on.
    pub async fn login(&self, email: &str, license_number: &str) -> Result<Driver, GatewayError> {
        let email = email.trim().to_lowercase();
        let driver = self
            .store
            .find_driver_by_credentials(&email, license_number.trim())
            .await?
            .ok_or(GatewayError::InvalidCredentials)?;

        let refused = match driver.verification_status {
            VerificationStatus::Approved => false,
            VerificationStatus::Rejected => true,
            VerificationStatus::Pending => self.policy.require_verified_driver,
        };
        if refused {
            tracing::info!(driver_id = %driver.id, status = %driver.verification_status, "login refused");
            return Err(GatewayError::DriverNotVerified(driver.id));
        }
        Ok(driver)
    }

    /// All drivers, newest registration first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list(&self) -> Result<Vec<Driver>, GatewayError> {
        self.store.list_drivers().await
    }

    /// Fetches a driver.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DriverNotFound`] if the driver does not exist.
    pub async fn get(&self, driver_id: DriverId) -> Result<Driver, GatewayError> {
        self.store.get_driver(driver_id).await
    }

    /// Records an admin decision on a driver's licence.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Validation`] if `decision` is `pending`.
    /// - [`GatewayError::DriverNotFound`] if the driver does not exist.
    pub async fn review(
        &self,
        driver_id: DriverId,
        decision: VerificationStatus,
        notes: Option<String>,
    ) -> Result<Driver, GatewayError> {
        if decision == VerificationStatus::Pending {
            return Err(GatewayError::Validation(
                "decision must be approve or reject".to_string(),
            ));
        }
        let notes = notes.filter(|n| !n.trim().is_empty());
        let driver = self
            .store
            .set_verification(driver_id, decision, notes)
            .await?;
        tracing::info!(%driver_id, status = %decision, "driver verification updated");
        Ok(driver)
    }
}

fn normalize_email(email: &str) -> Result<String, GatewayError> {
    let email = email.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(GatewayError::Validation(format!("invalid email: {email}"))),
    }
}
