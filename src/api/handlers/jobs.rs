//! Dealership-facing delivery-job handlers: create, list, inspect bids,
//! accept a bid and override status.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{
    AcceptBidRequest, AcceptBidResponse, CreateJobRequest, JobBidsResponse, JobListQuery,
    JobListResponse, UpdateJobStatusRequest, required,
};
use crate::app_state::AppState;
use crate::domain::{BidId, Job, JobId, NewJob};
use crate::error::{ErrorResponse, GatewayError};

/// `GET /delivery-jobs` — List jobs with filters and pagination.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] for a bad filter value.
#[utoipa::path(
    get,
    path = "/api/delivery-jobs",
    tag = "Delivery Jobs",
    summary = "List delivery jobs",
    description = "Returns jobs newest first, each with its bid count, average bid and winning driver. Filters combine with AND.",
    params(JobListQuery),
    responses(
        (status = 200, description = "Paginated job list", body = JobListResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
    )
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    query: Result<Query<JobListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(query) = query?;
    let filter = query.filter()?;
    let jobs = state.dispatch_service.list_jobs(&filter).await?;
    let (data, pagination) = query.pagination().paginate(jobs);
    Ok(Json(JobListResponse { data, pagination }))
}

/// `GET /delivery-jobs/{id}` — Get one job.
///
/// # Errors
///
/// Returns [`GatewayError::JobNotFound`] if the job does not exist.
#[utoipa::path(
    get,
    path = "/api/delivery-jobs/{id}",
    tag = "Delivery Jobs",
    summary = "Get a delivery job",
    params(
        ("id" = uuid::Uuid, Path, description = "Job UUID"),
    ),
    responses(
        (status = 200, description = "Job details", body = Job),
        (status = 404, description = "Job not found", body = ErrorResponse),
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Path(id) = path?;
    let job = state.dispatch_service.get_job(JobId::from_uuid(id)).await?;
    Ok(Json(job))
}

/// `POST /delivery-jobs` — Post a new delivery job.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] for missing or malformed fields.
#[utoipa::path(
    post,
    path = "/api/delivery-jobs",
    tag = "Delivery Jobs",
    summary = "Create a delivery job",
    description = "Creates an `open` job. Distance and duration are estimated from the two addresses.",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job created", body = Job),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(req) = payload?;
    let job = state
        .dispatch_service
        .create_job(NewJob::try_from(req)?)
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// `GET /delivery-jobs/{id}/bids` — A job and its bids, cheapest first.
///
/// # Errors
///
/// Returns [`GatewayError::JobNotFound`] if the job does not exist.
#[utoipa::path(
    get,
    path = "/api/delivery-jobs/{id}/bids",
    tag = "Delivery Jobs",
    summary = "List bids on a job",
    description = "Returns the job together with every bid on it, ordered by amount ascending, each with the bidding driver's profile.",
    params(
        ("id" = uuid::Uuid, Path, description = "Job UUID"),
    ),
    responses(
        (status = 200, description = "Job and bids", body = JobBidsResponse),
        (status = 404, description = "Job not found", body = ErrorResponse),
    )
)]
pub async fn job_bids(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Path(id) = path?;
    let (job, bids) = state
        .dispatch_service
        .job_with_bids(JobId::from_uuid(id))
        .await?;
    Ok(Json(JobBidsResponse { job, bids }))
}

/// `POST /delivery-jobs/{id}/accept-bid` — Award the job to one bid.
///
/// # Errors
///
/// - [`GatewayError::JobNotFound`] / [`GatewayError::BidNotFound`].
/// - [`GatewayError::InvalidTransition`] if the job is not open or the bid
///   is not a pending bid on it.
#[utoipa::path(
    post,
    path = "/api/delivery-jobs/{id}/accept-bid",
    tag = "Delivery Jobs",
    summary = "Accept a bid",
    description = "Atomically accepts the bid, rejects every other pending bid on the job and assigns the job.",
    params(
        ("id" = uuid::Uuid, Path, description = "Job UUID"),
    ),
    request_body = AcceptBidRequest,
    responses(
        (status = 200, description = "Bid accepted", body = AcceptBidResponse),
        (status = 400, description = "Job not open or bid not pending", body = ErrorResponse),
        (status = 404, description = "Job or bid not found", body = ErrorResponse),
    )
)]
pub async fn accept_bid(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AcceptBidRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Path(id) = path?;
    let Json(req) = payload?;
    let bid_id = BidId::from_uuid(required("bidId", req.bid_id)?);
    let acceptance = state
        .dispatch_service
        .accept_bid(JobId::from_uuid(id), bid_id)
        .await?;
    Ok(Json(AcceptBidResponse {
        message: "Bid accepted successfully".to_string(),
        job: acceptance.job,
        bid: acceptance.bid,
        rejected_bids: acceptance.rejected_bids,
    }))
}

/// `PUT /delivery-jobs/{id}/status` — Manual status override.
///
/// # Errors
///
/// - [`GatewayError::Validation`] for a missing or unknown status.
/// - [`GatewayError::JobNotFound`] if the job does not exist.
/// - [`GatewayError::InvalidTransition`] if the override skips or leaves
///   the lifecycle.
#[utoipa::path(
    put,
    path = "/api/delivery-jobs/{id}/status",
    tag = "Delivery Jobs",
    summary = "Override a job's status",
    description = "Moves a job one step along its lifecycle: `open → cancelled`, `assigned → in_progress | cancelled`, `in_progress → completed`. `assigned` is reachable only through bid acceptance.",
    params(
        ("id" = uuid::Uuid, Path, description = "Job UUID"),
    ),
    request_body = UpdateJobStatusRequest,
    responses(
        (status = 200, description = "Updated job", body = Job),
        (status = 400, description = "Invalid status or transition", body = ErrorResponse),
        (status = 404, description = "Job not found", body = ErrorResponse),
    )
)]
pub async fn update_job_status(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateJobStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Path(id) = path?;
    let Json(req) = payload?;
    let job = state
        .dispatch_service
        .set_job_status(JobId::from_uuid(id), req.target()?)
        .await?;
    Ok(Json(job))
}

/// Delivery-job routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/delivery-jobs", get(list_jobs).post(create_job))
        .route("/delivery-jobs/{id}", get(get_job))
        .route("/delivery-jobs/{id}/bids", get(job_bids))
        .route("/delivery-jobs/{id}/accept-bid", post(accept_bid))
        .route("/delivery-jobs/{id}/status", put(update_job_status))
}
