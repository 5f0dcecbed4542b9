//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{DispatchEvent, JobId};
use crate::service::DispatchService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<DispatchEvent>,
    dispatch_service: Arc<DispatchService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs, &dispatch_service).await;
                        let json = serde_json::to_string(&reply).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(dispatch_event) => {
                        if subs.matches(dispatch_event.job_id()) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&dispatch_event).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Splits raw job ID strings into parsed IDs and a wildcard flag.
/// Unparseable IDs are returned separately so the client can be told.
fn parse_job_ids(raw: &[String]) -> (Vec<JobId>, bool, Vec<String>) {
    let mut ids = Vec::new();
    let mut wildcard = false;
    let mut invalid = Vec::new();
    for s in raw {
        if s == "*" {
            wildcard = true;
        } else if let Ok(uuid) = s.parse::<uuid::Uuid>() {
            ids.push(JobId::from_uuid(uuid));
        } else {
            invalid.push(s.clone());
        }
    }
    (ids, wildcard, invalid)
}

/// Handles a text message from the client and builds the reply.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    dispatch_service: &DispatchService,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "expected a command message");
    }
    let command = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(command) => command,
        Err(err) => return WsMessage::error(msg.id, 404, format!("unknown command: {err}")),
    };

    match command {
        WsCommand::Subscribe { job_ids } => {
            let (ids, wildcard, invalid) = parse_job_ids(&job_ids);
            subs.subscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "invalid": invalid,
                    "count": subs.count(),
                    "broadcast": subs.is_broadcast(),
                }),
            )
        }
        WsCommand::Unsubscribe { job_ids } => {
            let (ids, wildcard, invalid) = parse_job_ids(&job_ids);
            subs.unsubscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "invalid": invalid,
                    "remaining_count": subs.count(),
                    "broadcast": subs.is_broadcast(),
                }),
            )
        }
        WsCommand::GetJob { job_id } => {
            let Ok(uuid) = job_id.parse::<uuid::Uuid>() else {
                return WsMessage::error(msg.id, 400, format!("invalid job id: {job_id}"));
            };
            match dispatch_service.get_job(JobId::from_uuid(uuid)).await {
                Ok(job) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::to_value(&job).unwrap_or_default(),
                ),
                Err(err) => WsMessage::error(msg.id, err.status_code().as_u16(), err.to_string()),
            }
        }
    }
}
