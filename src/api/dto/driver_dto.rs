//! Driver portal and admin DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::{parse_date, required};
use crate::domain::{NewDriver, VerificationStatus};
use crate::error::GatewayError;

/// Request body for `POST /driver/register`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterDriverRequest {
    /// Display name.
    pub name: Option<String>,
    /// Contact email; also the login name.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Driver's licence number; also the login secret.
    pub license_number: Option<String>,
    /// Licence expiry date, `YYYY-MM-DD`.
    pub license_expiry: Option<String>,
    /// Vehicle type (e.g. `"Flatbed Truck"`).
    pub vehicle_type: Option<String>,
}

impl TryFrom<RegisterDriverRequest> for NewDriver {
    type Error = GatewayError;

    fn try_from(req: RegisterDriverRequest) -> Result<Self, Self::Error> {
        let license_expiry = req
            .license_expiry
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| parse_date("license_expiry", d))
            .transpose()?;
        Ok(Self {
            name: required("name", req.name)?,
            email: required("email", req.email)?,
            phone: required("phone", req.phone)?,
            license_number: required("license_number", req.license_number)?,
            license_expiry,
            vehicle_type: required("vehicle_type", req.vehicle_type)?,
        })
    }
}

/// Request body for `POST /driver/login`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct DriverLoginRequest {
    /// Registered email.
    pub email: Option<String>,
    /// Registered licence number.
    #[serde(rename = "licenseNumber", alias = "license_number")]
    pub license_number: Option<String>,
}

/// Admin decision on a driver's licence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerificationDecision {
    /// Licence checks out.
    Approve,
    /// Licence refused.
    Reject,
}

impl From<VerificationDecision> for VerificationStatus {
    fn from(decision: VerificationDecision) -> Self {
        match decision {
            VerificationDecision::Approve => Self::Approved,
            VerificationDecision::Reject => Self::Rejected,
        }
    }
}

/// Request body for `PUT /admin/drivers/{id}/verify`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct VerifyDriverRequest {
    /// `approve` or `reject`.
    pub status: Option<VerificationDecision>,
    /// Optional notes for the record.
    pub notes: Option<String>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn login_accepts_both_field_spellings() {
        for body in [
            serde_json::json!({"email": "a@b.co", "licenseNumber": "DL1"}),
            serde_json::json!({"email": "a@b.co", "license_number": "DL1"}),
        ] {
            let Ok(req) = serde_json::from_value::<DriverLoginRequest>(body) else {
                panic!("valid body");
            };
            assert_eq!(req.license_number.as_deref(), Some("DL1"));
        }
    }

    #[test]
    fn verify_decision_maps_to_status() {
        let Ok(req) =
            serde_json::from_value::<VerifyDriverRequest>(serde_json::json!({"status": "approve"}))
        else {
            panic!("valid body");
        };
        assert_eq!(
            req.status.map(VerificationStatus::from),
            Some(VerificationStatus::Approved)
        );
    }

    #[test]
    fn decision_round_trips_as_snake_case() {
        assert_eq!(
            serde_json::to_value(VerificationDecision::Reject).ok(),
            Some(serde_json::json!("reject"))
        );
    }

    #[test]
    fn blank_expiry_is_ignored() {
        let req = RegisterDriverRequest {
            name: Some("John Smith".to_string()),
            email: Some("john@driver.com".to_string()),
            phone: Some("604-555-0101".to_string()),
            license_number: Some("DL123456".to_string()),
            license_expiry: Some(" ".to_string()),
            vehicle_type: Some("Flatbed Truck".to_string()),
        };
        let Ok(new) = NewDriver::try_from(req) else {
            panic!("valid registration");
        };
        assert_eq!(new.license_expiry, None);
    }
}
