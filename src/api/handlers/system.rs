//! System endpoints: health check and the job-status catalogue.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::JobStatusInfo;
use crate::app_state::AppState;
use crate::domain::JobStatus;
use crate::domain::lifecycle::override_targets;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

const fn describe(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Open => "Accepting bids from drivers",
        JobStatus::Assigned => "A bid has been accepted; awaiting pickup",
        JobStatus::InProgress => "The winning driver is delivering the vehicle",
        JobStatus::Completed => "The vehicle has been delivered",
        JobStatus::Cancelled => "Withdrawn by the dealership",
    }
}

/// Builds the catalogue served by `GET /config/job-statuses`.
#[must_use]
pub fn job_status_catalogue() -> Vec<JobStatusInfo> {
    JobStatus::ALL
        .into_iter()
        .map(|status| JobStatusInfo {
            status,
            description: describe(status),
            requires_winning_bid: status.requires_winning_bid(),
            override_targets: override_targets(status).to_vec(),
        })
        .collect()
}

/// `GET /config/job-statuses` — Job lifecycle catalogue.
#[utoipa::path(
    get,
    path = "/api/config/job-statuses",
    tag = "System",
    summary = "List job statuses",
    description = "Returns every job status, whether it requires an accepted bid, and the statuses a manual override may move a job in that status to.",
    responses(
        (status = 200, description = "Job status catalogue", body = Vec<JobStatusInfo>),
    )
)]
pub async fn job_statuses_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(job_status_catalogue()))
}

/// System routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/job-statuses", get(job_statuses_handler))
}
