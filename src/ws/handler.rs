//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// The connection subscribes to the event bus before the upgrade
/// completes, so no event published after this handler runs is missed.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let event_rx = state.event_bus.subscribe();
    let dispatch_service = std::sync::Arc::clone(&state.dispatch_service);

    ws.on_upgrade(move |socket| run_connection(socket, event_rx, dispatch_service))
}
