//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{BidId, DriverId, JobId, JobStatus};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "kind": "duplicate_bid",
///     "message": "driver ... has already bid on job ..."
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code, machine-readable kind and
/// human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Machine-readable error kind (e.g. `"job_not_open"`).
    pub kind: String,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                    |
/// |-----------|-------------------|--------------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request                |
/// | 2000–2999 | Not Found         | 404 Not Found                  |
/// | 3000–3999 | Server            | 500 Internal Server Error      |
/// | 4000–4999 | Marketplace rules | 400 / 401 / 403 / 409          |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing or malformed request fields.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Delivery job with the given ID was not found.
    #[error("delivery job not found: {0}")]
    JobNotFound(JobId),

    /// Bid with the given ID was not found.
    #[error("bid not found: {0}")]
    BidNotFound(BidId),

    /// Driver with the given ID was not found.
    #[error("driver not found: {0}")]
    DriverNotFound(DriverId),

    /// The driver already has a bid on this job.
    #[error("driver {driver_id} has already bid on job {job_id}")]
    DuplicateBid {
        /// Job that was bid on.
        job_id: JobId,
        /// Driver that tried to bid twice.
        driver_id: DriverId,
    },

    /// Bids are only accepted while the job is open.
    #[error("job {job_id} is not open for bidding (status: {status})")]
    JobNotOpen {
        /// Job that was bid on.
        job_id: JobId,
        /// Status the job was in.
        status: JobStatus,
    },

    /// A lifecycle transition was requested from a state that forbids it.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// A driver with the same email or licence number is already registered.
    #[error("a driver with this email or license number already exists")]
    DuplicateDriver,

    /// Driver login failed.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// The driver's licence has not been approved.
    #[error("driver {0} is not verified")]
    DriverNotVerified(DriverId),

    /// Underlying database failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::JobNotFound(_) => 2001,
            Self::BidNotFound(_) => 2002,
            Self::DriverNotFound(_) => 2003,
            Self::Internal(_) => 3000,
            Self::Storage(_) => 3001,
            Self::DuplicateBid { .. } => 4001,
            Self::JobNotOpen { .. } => 4002,
            Self::InvalidTransition(_) => 4003,
            Self::DuplicateDriver => 4004,
            Self::InvalidCredentials => 4005,
            Self::DriverNotVerified(_) => 4006,
        }
    }

    /// Returns the machine-readable kind for this variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::JobNotFound(_) | Self::BidNotFound(_) | Self::DriverNotFound(_) => "not_found",
            Self::DuplicateBid { .. } => "duplicate_bid",
            Self::JobNotOpen { .. } => "job_not_open",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::DuplicateDriver => "duplicate_driver",
            Self::InvalidCredentials => "invalid_credentials",
            Self::DriverNotVerified(_) => "driver_not_verified",
            Self::Storage(_) => "storage_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::DuplicateBid { .. }
            | Self::JobNotOpen { .. }
            | Self::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            Self::JobNotFound(_) | Self::BidNotFound(_) | Self::DriverNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::DuplicateDriver => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::DriverNotVerified(_) => StatusCode::FORBIDDEN,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "database operation failed");
        Self::Storage(err.to_string())
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for GatewayError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                kind: self.kind().to_string(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
