//! Data Transfer Objects for REST request/response serialization.
//!
//! Request bodies use optional fields so that a missing field is reported
//! as a `validation_error` naming the field rather than a generic decode
//! failure. Currency amounts travel as decimal dollars.

pub mod bid_dto;
pub mod common_dto;
pub mod driver_dto;
pub mod job_dto;

pub use bid_dto::*;
pub use common_dto::*;
pub use driver_dto::*;
pub use job_dto::*;
