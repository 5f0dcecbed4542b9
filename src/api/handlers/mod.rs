//! REST endpoint handlers organized by resource.

pub mod drivers;
pub mod jobs;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes; mounted under `/api` by the caller.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(jobs::routes())
        .merge(drivers::routes())
        .merge(system::routes())
}
