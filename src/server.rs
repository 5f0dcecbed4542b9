//! HTTP application assembly: REST routes, WebSocket endpoint, OpenAPI UI
//! and the tower middleware stack.

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the full application router.
///
/// REST endpoints live under `/api`, the event stream at `/ws`, and the
/// Swagger UI (with the `swagger-ui` feature) at `/swagger-ui`. Requests
/// taking longer than `request_timeout` are answered with 408.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    let router = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::openapi::ApiDoc::openapi()),
        )
    };

    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::EventBus;
    use crate::persistence::memory::MemoryStore;
    use crate::service::BidPolicy;

    fn app() -> Router {
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            EventBus::new(8),
            BidPolicy::default(),
        );
        build_app(state, Duration::from_secs(5))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let request = tokio_test::assert_ok!(Request::get(uri).body(Body::empty()));
        let response = tokio_test::assert_ok!(app().oneshot(request).await);
        response.status()
    }

    #[tokio::test]
    async fn rest_routes_live_under_api() {
        assert_eq!(status_of("/api/health").await, StatusCode::OK);
        assert_eq!(status_of("/api/delivery-jobs").await, StatusCode::OK);
        assert_eq!(status_of("/health").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_driver_is_not_found() {
        let uri = format!("/api/driver/{}/bids", uuid::Uuid::new_v4());
        assert_eq!(status_of(&uri).await, StatusCode::NOT_FOUND);
    }
}
