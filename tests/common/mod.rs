//! Shared harness: boots the full application on an ephemeral port.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use dispatch_gateway::app_state::AppState;
use dispatch_gateway::domain::EventBus;
use dispatch_gateway::persistence::DispatchStore;
use dispatch_gateway::persistence::memory::MemoryStore;
use dispatch_gateway::persistence::sqlite::SqliteStore;
use dispatch_gateway::server::build_app;
use dispatch_gateway::service::BidPolicy;

/// A running gateway and a client pointed at it.
#[derive(Debug)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/api{path}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        let Ok(resp) = self.client.post(self.url(path)).json(&body).send().await else {
            panic!("POST {path} failed to send");
        };
        resp
    }

    pub async fn put(&self, path: &str, body: Value) -> reqwest::Response {
        let Ok(resp) = self.client.put(self.url(path)).json(&body).send().await else {
            panic!("PUT {path} failed to send");
        };
        resp
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        let Ok(resp) = self.client.get(self.url(path)).send().await else {
            panic!("GET {path} failed to send");
        };
        resp
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        let Ok(resp) = self.client.delete(self.url(path)).send().await else {
            panic!("DELETE {path} failed to send");
        };
        resp
    }

    /// Posts a job and returns its id.
    pub async fn create_job(&self, customer: &str) -> String {
        let resp = self
            .post(
                "/delivery-jobs",
                json!({
                    "customer_name": customer,
                    "pickup_address": "123 Main St, Vancouver",
                    "delivery_address": "456 Oak Ave, Richmond",
                    "vehicle_info": "2022 Honda Civic - Blue",
                    "delivery_date": "2025-08-22",
                    "delivery_window": "9:00 AM - 12:00 PM",
                }),
            )
            .await;
        assert_eq!(resp.status(), 201);
        id_of(json_body(resp).await)
    }

    /// Registers a driver and returns its id.
    pub async fn register_driver(&self, n: u32) -> String {
        let resp = self
            .post(
                "/driver/register",
                json!({
                    "name": format!("Driver {n}"),
                    "email": format!("driver{n}@example.com"),
                    "phone": "604-555-0100",
                    "license_number": format!("DL{n:06}"),
                    "vehicle_type": "Flatbed Truck",
                }),
            )
            .await;
        assert_eq!(resp.status(), 201);
        id_of(json_body(resp).await)
    }

    /// Places a bid and returns the raw response.
    pub async fn place_bid(
        &self,
        job_id: &str,
        driver_id: &str,
        dollars: f64,
        minutes: i64,
    ) -> reqwest::Response {
        self.post(
            "/driver/place-bid",
            json!({
                "job_id": job_id,
                "driver_id": driver_id,
                "bid_amount": dollars,
                "estimated_completion_time": minutes,
            }),
        )
        .await
    }
}

pub async fn json_body(resp: reqwest::Response) -> Value {
    let Ok(value) = resp.json::<Value>().await else {
        panic!("response body is not JSON");
    };
    value
}

pub fn id_of(value: Value) -> String {
    let Some(id) = value["id"].as_str() else {
        panic!("no id in {value}");
    };
    id.to_string()
}

pub fn error_kind(value: &Value) -> &str {
    value["error"]["kind"].as_str().unwrap_or_default()
}

/// Boots the app over `store` and returns once it is listening.
pub async fn spawn_with(store: Arc<dyn DispatchStore>, policy: BidPolicy) -> TestServer {
    let state = AppState::new(store, EventBus::new(64), policy);
    let app = build_app(state, Duration::from_secs(10));
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("cannot bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    TestServer {
        addr,
        client: reqwest::Client::new(),
    }
}

pub async fn spawn_memory() -> TestServer {
    spawn_with(Arc::new(MemoryStore::new()), BidPolicy::default()).await
}

pub async fn spawn_sqlite() -> TestServer {
    let Ok(store) = SqliteStore::in_memory().await else {
        panic!("cannot open in-memory SQLite");
    };
    spawn_with(Arc::new(store), BidPolicy::default()).await
}
