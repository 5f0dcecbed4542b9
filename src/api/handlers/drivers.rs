//! Driver portal and driver admin handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{
    DriverLoginRequest, PlaceBidRequest, RegisterDriverRequest, VerifyDriverRequest, required,
};
use crate::app_state::AppState;
use crate::domain::{
    Bid, BidId, BidWithJob, Driver, DriverId, Job, NewBid, NewDriver, VerificationStatus,
};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /driver/place-bid` — Bid on an open job.
///
/// # Errors
///
/// - [`GatewayError::Validation`] for missing fields or non-positive values.
/// - [`GatewayError::JobNotFound`] / [`GatewayError::DriverNotFound`].
/// - [`GatewayError::JobNotOpen`] if the job has left `open`.
/// - [`GatewayError::DuplicateBid`] if the driver already bid on the job.
#[utoipa::path(
    post,
    path = "/api/driver/place-bid",
    tag = "Drivers",
    summary = "Place a bid",
    description = "Records a pending bid. `bid_amount` is in dollars and `estimated_completion_time` in minutes. One bid per driver per job.",
    request_body = PlaceBidRequest,
    responses(
        (status = 201, description = "Bid placed", body = Bid),
        (status = 400, description = "Invalid bid, job not open or duplicate bid", body = ErrorResponse),
        (status = 403, description = "Driver not verified", body = ErrorResponse),
        (status = 404, description = "Job or driver not found", body = ErrorResponse),
    )
)]
pub async fn place_bid(
    State(state): State<AppState>,
    payload: Result<Json<PlaceBidRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(req) = payload?;
    let bid = state
        .dispatch_service
        .place_bid(NewBid::try_from(req)?)
        .await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

/// `GET /driver/{id}/bids` — A driver's bids with job context.
///
/// # Errors
///
/// Returns [`GatewayError::DriverNotFound`] if the driver does not exist.
#[utoipa::path(
    get,
    path = "/api/driver/{id}/bids",
    tag = "Drivers",
    summary = "List a driver's bids",
    description = "Returns the driver's bids newest first, each with the job's vehicle, route, date and status.",
    params(
        ("id" = uuid::Uuid, Path, description = "Driver UUID"),
    ),
    responses(
        (status = 200, description = "Driver's bids", body = Vec<BidWithJob>),
        (status = 404, description = "Driver not found", body = ErrorResponse),
    )
)]
pub async fn driver_bids(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Path(id) = path?;
    let bids = state
        .dispatch_service
        .list_bids_for_driver(DriverId::from_uuid(id))
        .await?;
    Ok(Json(bids))
}

/// `GET /driver/{id}/assigned-jobs` — Jobs the driver has won.
///
/// # Errors
///
/// Returns [`GatewayError::DriverNotFound`] if the driver does not exist.
#[utoipa::path(
    get,
    path = "/api/driver/{id}/assigned-jobs",
    tag = "Drivers",
    summary = "List a driver's assigned jobs",
    description = "Returns jobs in `assigned` or `in_progress` whose winning bid belongs to the driver, soonest delivery first.",
    params(
        ("id" = uuid::Uuid, Path, description = "Driver UUID"),
    ),
    responses(
        (status = 200, description = "Assigned jobs", body = Vec<Job>),
        (status = 404, description = "Driver not found", body = ErrorResponse),
    )
)]
pub async fn assigned_jobs(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Path(id) = path?;
    let jobs = state
        .dispatch_service
        .assigned_jobs(DriverId::from_uuid(id))
        .await?;
    Ok(Json(jobs))
}

/// `DELETE /driver/cancel-bid/{id}` — Withdraw a bid.
///
/// # Errors
///
/// - [`GatewayError::BidNotFound`] if the bid does not exist.
/// - [`GatewayError::InvalidTransition`] if the bid has been accepted.
#[utoipa::path(
    delete,
    path = "/api/driver/cancel-bid/{id}",
    tag = "Drivers",
    summary = "Cancel a bid",
    description = "Deletes a pending or rejected bid. An accepted bid cannot be withdrawn.",
    params(
        ("id" = uuid::Uuid, Path, description = "Bid UUID"),
    ),
    responses(
        (status = 204, description = "Bid cancelled"),
        (status = 400, description = "Bid already accepted", body = ErrorResponse),
        (status = 404, description = "Bid not found", body = ErrorResponse),
    )
)]
pub async fn cancel_bid(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Path(id) = path?;
    state
        .dispatch_service
        .cancel_bid(BidId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /driver/register` — Sign up a new driver.
///
/// # Errors
///
/// - [`GatewayError::Validation`] for missing or malformed fields.
/// - [`GatewayError::DuplicateDriver`] if the email or licence is taken.
#[utoipa::path(
    post,
    path = "/api/driver/register",
    tag = "Drivers",
    summary = "Register a driver",
    description = "Creates a driver account awaiting licence verification.",
    request_body = RegisterDriverRequest,
    responses(
        (status = 201, description = "Driver registered", body = Driver),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email or licence already registered", body = ErrorResponse),
    )
)]
pub async fn register_driver(
    State(state): State<AppState>,
    payload: Result<Json<RegisterDriverRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(req) = payload?;
    let driver = state
        .driver_service
        .register(NewDriver::try_from(req)?)
        .await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

/// `POST /driver/login` — Look a driver up by email and licence number.
///
/// # Errors
///
/// - [`GatewayError::InvalidCredentials`] if no driver matches.
/// - [`GatewayError::DriverNotVerified`] if the driver may not sign in.
#[utoipa::path(
    post,
    path = "/api/driver/login",
    tag = "Drivers",
    summary = "Driver login",
    request_body = DriverLoginRequest,
    responses(
        (status = 200, description = "Driver profile", body = Driver),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Driver not verified", body = ErrorResponse),
    )
)]
pub async fn login_driver(
    State(state): State<AppState>,
    payload: Result<Json<DriverLoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(req) = payload?;
    let email = required("email", req.email)?;
    let license_number = required("licenseNumber", req.license_number)?;
    let driver = state
        .driver_service
        .login(&email, &license_number)
        .await?;
    Ok(Json(driver))
}

/// `GET /driver/{id}` — A driver's profile.
///
/// # Errors
///
/// Returns [`GatewayError::DriverNotFound`] if the driver does not exist.
#[utoipa::path(
    get,
    path = "/api/driver/{id}",
    tag = "Drivers",
    summary = "Get a driver",
    params(
        ("id" = uuid::Uuid, Path, description = "Driver UUID"),
    ),
    responses(
        (status = 200, description = "Driver profile", body = Driver),
        (status = 404, description = "Driver not found", body = ErrorResponse),
    )
)]
pub async fn get_driver(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Path(id) = path?;
    let driver = state.driver_service.get(DriverId::from_uuid(id)).await?;
    Ok(Json(driver))
}

/// `GET /admin/drivers` — Every driver, newest first.
///
/// # Errors
///
/// Returns [`GatewayError::Storage`] on database failure.
#[utoipa::path(
    get,
    path = "/api/admin/drivers",
    tag = "Admin",
    summary = "List drivers",
    responses(
        (status = 200, description = "All drivers", body = Vec<Driver>),
    )
)]
pub async fn list_drivers(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.driver_service.list().await?))
}

/// `PUT /admin/drivers/{id}/verify` — Approve or reject a licence.
///
/// # Errors
///
/// - [`GatewayError::Validation`] if `status` is missing or unknown.
/// - [`GatewayError::DriverNotFound`] if the driver does not exist.
#[utoipa::path(
    put,
    path = "/api/admin/drivers/{id}/verify",
    tag = "Admin",
    summary = "Verify a driver",
    description = "Records an `approve` or `reject` decision on the driver's licence, with optional notes.",
    params(
        ("id" = uuid::Uuid, Path, description = "Driver UUID"),
    ),
    request_body = VerifyDriverRequest,
    responses(
        (status = 200, description = "Updated driver", body = Driver),
        (status = 400, description = "Invalid decision", body = ErrorResponse),
        (status = 404, description = "Driver not found", body = ErrorResponse),
    )
)]
pub async fn verify_driver(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<VerifyDriverRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Path(id) = path?;
    let Json(req) = payload?;
    let decision = VerificationStatus::from(required("status", req.status)?);
    let driver = state
        .driver_service
        .review(DriverId::from_uuid(id), decision, req.notes)
        .await?;
    Ok(Json(driver))
}

/// Driver portal and admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/driver/place-bid", post(place_bid))
        .route("/driver/register", post(register_driver))
        .route("/driver/login", post(login_driver))
        .route("/driver/cancel-bid/{id}", delete(cancel_bid))
        .route("/driver/{id}", get(get_driver))
        .route("/driver/{id}/bids", get(driver_bids))
        .route("/driver/{id}/assigned-jobs", get(assigned_jobs))
        .route("/admin/drivers", get(list_drivers))
        .route("/admin/drivers/{id}/verify", put(verify_driver))
}
