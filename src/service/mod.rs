//! Service layer: business logic orchestration.
//!
//! [`DispatchService`] drives the job and bid lifecycle and emits events
//! through an [`crate::domain::EventSink`]; [`DriverService`] handles
//! driver registration, login and verification.

pub mod dispatch_service;
pub mod driver_service;

pub use dispatch_service::DispatchService;
pub use driver_service::DriverService;

use crate::error::GatewayError;

/// Marketplace rules that depend on deployment configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BidPolicy {
    /// Only `approved` drivers may bid or log in.
    pub require_verified_driver: bool,
}

/// Trims `value`, rejecting it if nothing is left.
pub(crate) fn require_text(field: &str, value: String) -> Result<String, GatewayError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::Validation(format!("{field} is required")));
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}
