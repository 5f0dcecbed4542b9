//! WebSocket fan-out: lifecycle events reach connected observers.

#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

use common::{id_of, json_body, spawn_memory};

type Socket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn connect(url: &str) -> Socket {
    let Ok((socket, _)) = tokio_tungstenite::connect_async(url).await else {
        panic!("websocket handshake failed");
    };
    socket
}

/// Next JSON text frame, skipping pings.
async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_secs(5), socket.next()).await
        else {
            panic!("no websocket message within timeout");
        };
        if let Message::Text(text) = msg {
            let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                panic!("non-JSON frame: {text}");
            };
            return value;
        }
    }
}

async fn send_command(socket: &mut Socket, id: &str, payload: Value) {
    let envelope = json!({
        "id": id,
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": payload,
    });
    if socket
        .send(Message::text(envelope.to_string()))
        .await
        .is_err()
    {
        panic!("websocket send failed");
    }
}

#[tokio::test]
async fn acceptance_events_are_broadcast() {
    let server = spawn_memory().await;
    let mut socket = connect(&server.ws_url()).await;

    let job = server.create_job("Robert Chen").await;
    let d1 = server.register_driver(1).await;
    let d2 = server.register_driver(2).await;
    server.place_bid(&job, &d1, 500.0, 180).await;
    let b2 = id_of(json_body(server.place_bid(&job, &d2, 450.0, 240).await).await);
    let resp = server
        .post(
            &format!("/delivery-jobs/{job}/accept-bid"),
            json!({ "bidId": b2 }),
        )
        .await;
    assert_eq!(resp.status(), 200);

    let mut events = Vec::new();
    for _ in 0..4 {
        let msg = next_json(&mut socket).await;
        assert_eq!(msg["type"], "event");
        events.push(msg["payload"].clone());
    }
    let names: Vec<_> = events.iter().map(|e| e["event"].clone()).collect();
    assert_eq!(
        names,
        vec![
            json!("newBid"),
            json!("newBid"),
            json!("bidAccepted"),
            json!("jobStatusUpdate")
        ]
    );
    assert_eq!(events[1]["bid_amount"], 450.0);
    assert_eq!(events[2]["bid_id"], b2.as_str());
    assert_eq!(events[2]["rejected_bids"], 1);
    assert_eq!(events[3]["previous_status"], "open");
    assert_eq!(events[3]["status"], "assigned");
}

#[tokio::test]
async fn subscription_narrows_the_feed() {
    let server = spawn_memory().await;
    let mut socket = connect(&server.ws_url()).await;

    let watched = server.create_job("Watched").await;
    let ignored = server.create_job("Ignored").await;
    let driver = server.register_driver(3).await;

    send_command(
        &mut socket,
        "sub-1",
        json!({ "command": "subscribe", "job_ids": [watched, "bogus"] }),
    )
    .await;
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["id"], "sub-1");
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["payload"]["invalid"], json!(["bogus"]));
    assert_eq!(reply["payload"]["broadcast"], false);

    server.place_bid(&ignored, &driver, 200.0, 60).await;
    server.place_bid(&watched, &driver, 210.0, 60).await;

    let event = next_json(&mut socket).await;
    assert_eq!(event["payload"]["job_id"], watched.as_str());

    send_command(
        &mut socket,
        "get-1",
        json!({ "command": "get_job", "job_id": watched }),
    )
    .await;
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["id"], "get-1");
    assert_eq!(reply["payload"]["customer_name"], "Watched");
}

#[tokio::test]
async fn bad_commands_get_error_replies() {
    let server = spawn_memory().await;
    let mut socket = connect(&server.ws_url()).await;

    if socket.send(Message::text("{oops")).await.is_err() {
        panic!("websocket send failed");
    }
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["payload"]["code"], 400);

    send_command(
        &mut socket,
        "get-missing",
        json!({ "command": "get_job", "job_id": uuid::Uuid::new_v4() }),
    )
    .await;
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["id"], "get-missing");
    assert_eq!(reply["payload"]["code"], 404);
}
