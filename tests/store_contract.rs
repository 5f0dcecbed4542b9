//! Lifecycle properties that every storage backend must uphold.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use dispatch_gateway::domain::{
    BidStatus, Driver, EventBus, EventSink, Job, JobStatus, Money, NewBid, NewDriver, NewJob,
};
use dispatch_gateway::error::GatewayError;
use dispatch_gateway::persistence::DispatchStore;
use dispatch_gateway::persistence::memory::MemoryStore;
use dispatch_gateway::persistence::seed::seed_sample_data;
use dispatch_gateway::persistence::sqlite::SqliteStore;
use dispatch_gateway::service::{BidPolicy, DispatchService, DriverService};

struct Harness {
    store: Arc<dyn DispatchStore>,
    dispatch: DispatchService,
    drivers: DriverService,
}

fn harness(store: Arc<dyn DispatchStore>) -> Harness {
    let sink: Arc<dyn EventSink> = Arc::new(EventBus::new(16));
    Harness {
        dispatch: DispatchService::new(Arc::clone(&store), sink, BidPolicy::default()),
        drivers: DriverService::new(Arc::clone(&store), BidPolicy::default()),
        store,
    }
}

async fn backends() -> Vec<(&'static str, Harness)> {
    let Ok(sqlite) = SqliteStore::in_memory().await else {
        panic!("cannot open in-memory SQLite");
    };
    vec![
        ("memory", harness(Arc::new(MemoryStore::new()))),
        ("sqlite", harness(Arc::new(sqlite))),
    ]
}

async fn job(h: &Harness) -> Job {
    let Some(date) = NaiveDate::from_ymd_opt(2025, 8, 22) else {
        panic!("valid date");
    };
    let Ok(job) = h
        .dispatch
        .create_job(NewJob {
            customer_name: "Robert Chen".to_string(),
            customer_phone: None,
            pickup_address: "123 Main St, Vancouver".to_string(),
            delivery_address: "456 Oak Ave, Richmond".to_string(),
            vehicle_info: "2022 Honda Civic - Blue".to_string(),
            delivery_date: date,
            delivery_window: "9:00 AM - 12:00 PM".to_string(),
            special_instructions: None,
        })
        .await
    else {
        panic!("job creation failed");
    };
    job
}

async fn driver(h: &Harness, n: u32) -> Driver {
    let Ok(driver) = h
        .drivers
        .register(NewDriver {
            name: format!("Driver {n}"),
            email: format!("driver{n}@example.com"),
            phone: "604-555-0100".to_string(),
            license_number: format!("DL{n:06}"),
            license_expiry: None,
            vehicle_type: "Flatbed Truck".to_string(),
        })
        .await
    else {
        panic!("driver registration failed");
    };
    driver
}

fn bid(job: &Job, driver: &Driver, cents: i64) -> NewBid {
    NewBid {
        job_id: job.id,
        driver_id: driver.id,
        bid_amount: Money::from_cents(cents),
        estimated_completion_minutes: 120,
        message: None,
    }
}

async fn accepted_count(h: &Harness, job: &Job) -> usize {
    let Ok(bids) = h.dispatch.list_bids_for_job(job.id).await else {
        panic!("bid listing failed");
    };
    bids.iter()
        .filter(|b| b.bid.status == BidStatus::Accepted)
        .count()
}

#[tokio::test]
async fn accepted_bid_count_tracks_job_status() {
    for (name, h) in backends().await {
        let job = job(&h).await;
        let d1 = driver(&h, 1).await;
        let d2 = driver(&h, 2).await;
        assert!(h.dispatch.place_bid(bid(&job, &d1, 50_000)).await.is_ok());
        let Ok(winner) = h.dispatch.place_bid(bid(&job, &d2, 45_000)).await else {
            panic!("{name}: bid failed");
        };
        assert_eq!(accepted_count(&h, &job).await, 0, "{name}");

        assert!(h.dispatch.accept_bid(job.id, winner.id).await.is_ok());
        for status in [JobStatus::InProgress, JobStatus::Completed] {
            let Ok(updated) = h.dispatch.set_job_status(job.id, status).await else {
                panic!("{name}: override to {status} failed");
            };
            assert_eq!(updated.status, status, "{name}");
            assert_eq!(accepted_count(&h, &job).await, 1, "{name}");
        }
    }
}

#[tokio::test]
async fn accepting_on_assigned_job_changes_nothing() {
    for (name, h) in backends().await {
        let job = job(&h).await;
        let d1 = driver(&h, 1).await;
        let d2 = driver(&h, 2).await;
        let Ok(first) = h.dispatch.place_bid(bid(&job, &d1, 30_000)).await else {
            panic!("{name}: bid failed");
        };
        let Ok(second) = h.dispatch.place_bid(bid(&job, &d2, 31_000)).await else {
            panic!("{name}: bid failed");
        };
        assert!(h.dispatch.accept_bid(job.id, first.id).await.is_ok());

        let err = h.dispatch.accept_bid(job.id, second.id).await;
        assert!(
            matches!(err, Err(GatewayError::InvalidTransition(_))),
            "{name}: {err:?}"
        );

        let Ok(stored) = h.store.get_job(job.id).await else {
            panic!("{name}: job vanished");
        };
        assert_eq!(stored.status, JobStatus::Assigned, "{name}");
        assert_eq!(stored.winning_bid_id, Some(first.id), "{name}");
        let Ok(loser) = h.store.get_bid(second.id).await else {
            panic!("{name}: bid vanished");
        };
        assert_eq!(loser.status, BidStatus::Rejected, "{name}");
    }
}

#[tokio::test]
async fn accepting_a_bid_from_another_job_is_refused() {
    for (name, h) in backends().await {
        let job_a = job(&h).await;
        let job_b = job(&h).await;
        let d = driver(&h, 1).await;
        let Ok(on_b) = h.dispatch.place_bid(bid(&job_b, &d, 20_000)).await else {
            panic!("{name}: bid failed");
        };
        let err = h.dispatch.accept_bid(job_a.id, on_b.id).await;
        assert!(
            matches!(err, Err(GatewayError::InvalidTransition(_))),
            "{name}: {err:?}"
        );
        assert_eq!(accepted_count(&h, &job_b).await, 0, "{name}");
    }
}

#[tokio::test]
async fn duplicate_bid_wins_regardless_of_order() {
    for (name, h) in backends().await {
        let job = job(&h).await;
        let d = driver(&h, 1).await;
        let other = driver(&h, 2).await;
        assert!(h.dispatch.place_bid(bid(&job, &other, 10_000)).await.is_ok());
        assert!(h.dispatch.place_bid(bid(&job, &d, 12_000)).await.is_ok());
        let err = h.dispatch.place_bid(bid(&job, &d, 9_000)).await;
        assert!(
            matches!(err, Err(GatewayError::DuplicateBid { .. })),
            "{name}: {err:?}"
        );
    }
}

#[tokio::test]
async fn rebidding_after_the_job_closes_is_still_a_duplicate() {
    for (name, h) in backends().await {
        let assigned = job(&h).await;
        let cancelled = job(&h).await;
        let d = driver(&h, 1).await;
        let Ok(first) = h.dispatch.place_bid(bid(&assigned, &d, 30_000)).await else {
            panic!("{name}: bid failed");
        };
        assert!(h.dispatch.place_bid(bid(&cancelled, &d, 30_000)).await.is_ok());
        assert!(h.dispatch.accept_bid(assigned.id, first.id).await.is_ok());
        assert!(
            h.dispatch
                .set_job_status(cancelled.id, JobStatus::Cancelled)
                .await
                .is_ok()
        );

        for closed in [&assigned, &cancelled] {
            let err = h.dispatch.place_bid(bid(closed, &d, 25_000)).await;
            assert!(
                matches!(err, Err(GatewayError::DuplicateBid { .. })),
                "{name}: {err:?}"
            );
        }

        let newcomer = driver(&h, 2).await;
        let err = h.dispatch.place_bid(bid(&assigned, &newcomer, 25_000)).await;
        assert!(
            matches!(err, Err(GatewayError::JobNotOpen { .. })),
            "{name}: {err:?}"
        );
    }
}

#[tokio::test]
async fn concurrent_acceptance_has_one_winner() {
    for (name, h) in backends().await {
        let job = job(&h).await;
        let mut bids = Vec::new();
        for n in 0..5 {
            let d = driver(&h, n).await;
            let Ok(b) = h
                .dispatch
                .place_bid(bid(&job, &d, 40_000 + i64::from(n)))
                .await
            else {
                panic!("{name}: bid failed");
            };
            bids.push(b.id);
        }
        let results = futures_util::future::join_all(
            bids.iter().map(|bid_id| h.dispatch.accept_bid(job.id, *bid_id)),
        )
        .await;
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "{name}");
        assert_eq!(accepted_count(&h, &job).await, 1, "{name}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_backed_sqlite_accepts_in_parallel_with_one_winner() {
    let Ok(dir) = tempfile::tempdir() else {
        panic!("cannot create temp dir");
    };
    let url = format!("sqlite://{}", dir.path().join("dispatch.db").display());
    let Ok(sqlite) = SqliteStore::connect(&url, 10, Duration::from_secs(5)).await else {
        panic!("cannot open {url}");
    };
    let h = harness(Arc::new(sqlite));

    let mut drivers = Vec::new();
    for n in 0..6 {
        drivers.push(driver(&h, n).await);
    }

    for round in 0..5 {
        let job = job(&h).await;
        let mut bids = Vec::new();
        for (n, d) in (0_i64..).zip(&drivers) {
            let Ok(b) = h.dispatch.place_bid(bid(&job, d, 40_000 + n)).await else {
                panic!("round {round}: bid failed");
            };
            bids.push(b.id);
        }

        let tasks: Vec<_> = bids
            .iter()
            .map(|&bid_id| {
                let store = Arc::clone(&h.store);
                let job_id = job.id;
                tokio::spawn(async move { store.accept_bid(job_id, bid_id).await })
            })
            .collect();

        let mut winners = Vec::new();
        for task in tasks {
            let Ok(result) = task.await else {
                panic!("round {round}: accept task panicked");
            };
            match result {
                Ok(acceptance) => winners.push(acceptance),
                Err(GatewayError::InvalidTransition(_)) => {}
                Err(other) => panic!("round {round}: unexpected error {other}"),
            }
        }

        assert_eq!(winners.len(), 1, "round {round}");
        let Some(winner) = winners.first() else {
            panic!("round {round}: no winner");
        };
        assert_eq!(winner.rejected_bids.len(), bids.len() - 1, "round {round}");
        assert_eq!(accepted_count(&h, &job).await, 1, "round {round}");

        let Ok(stored) = h.store.get_job(job.id).await else {
            panic!("round {round}: job vanished");
        };
        assert_eq!(stored.status, JobStatus::Assigned, "round {round}");
        assert_eq!(stored.winning_bid_id, Some(winner.bid.id), "round {round}");
    }
}

#[tokio::test]
async fn seeding_only_fills_an_empty_store() {
    for (name, h) in backends().await {
        assert!(matches!(seed_sample_data(h.store.as_ref()).await, Ok(true)), "{name}");
        assert!(matches!(seed_sample_data(h.store.as_ref()).await, Ok(false)), "{name}");
        let Ok(drivers) = h.drivers.list().await else {
            panic!("{name}: listing failed");
        };
        assert_eq!(drivers.len(), 4, "{name}");
        assert!(drivers.iter().all(Driver::is_verified), "{name}");
    }
}
