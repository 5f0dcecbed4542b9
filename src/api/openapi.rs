//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use crate::api::dto::{
    AcceptBidRequest, AcceptBidResponse, CreateJobRequest, DriverLoginRequest, JobBidsResponse,
    JobListResponse, JobStatusInfo, PaginationMeta, PlaceBidRequest, RegisterDriverRequest,
    UpdateJobStatusRequest, VerificationDecision, VerifyDriverRequest,
};
use crate::api::handlers::{drivers, jobs, system};
use crate::domain::{
    Bid, BidStatus, BidWithDriver, BidWithJob, DispatchEvent, Driver, Job, JobStatus, JobSummary,
    VerificationStatus,
};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification, served at `/api-docs/openapi.json`
/// when the `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "dispatch-gateway",
        description = "Delivery-job bidding marketplace: dealerships post vehicle deliveries, drivers bid, the dealership accepts one bid."
    ),
    paths(
        jobs::list_jobs,
        jobs::get_job,
        jobs::create_job,
        jobs::job_bids,
        jobs::accept_bid,
        jobs::update_job_status,
        drivers::place_bid,
        drivers::driver_bids,
        drivers::assigned_jobs,
        drivers::cancel_bid,
        drivers::register_driver,
        drivers::login_driver,
        drivers::get_driver,
        drivers::list_drivers,
        drivers::verify_driver,
        system::health_handler,
        system::job_statuses_handler,
    ),
    components(schemas(
        Job,
        JobStatus,
        JobSummary,
        Bid,
        BidStatus,
        BidWithDriver,
        BidWithJob,
        Driver,
        VerificationStatus,
        DispatchEvent,
        CreateJobRequest,
        JobListResponse,
        JobBidsResponse,
        AcceptBidRequest,
        AcceptBidResponse,
        UpdateJobStatusRequest,
        JobStatusInfo,
        PlaceBidRequest,
        RegisterDriverRequest,
        DriverLoginRequest,
        VerifyDriverRequest,
        VerificationDecision,
        PaginationMeta,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Delivery Jobs", description = "Dealership job posting and bid acceptance"),
        (name = "Drivers", description = "Driver portal: bidding and account"),
        (name = "Admin", description = "Driver licence verification"),
        (name = "System", description = "Health and lifecycle catalogue"),
    )
)]
pub struct ApiDoc;
