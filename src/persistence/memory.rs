//! In-process storage behind a single lock.
//!
//! [`MemoryStore`] keeps drivers, jobs and bids in `HashMap`s inside one
//! [`tokio::sync::RwLock`]. Reads run concurrently; every mutation takes the
//! write lock for its whole check-then-act sequence, which is what makes
//! bid placement and acceptance atomic here.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{BidStore, DriverStore, JobStore};
use crate::domain::bid::sort_by_amount;
use crate::domain::lifecycle::{self, Acceptance};
use crate::domain::money::average_cents_to_dollars;
use crate::domain::{
    Bid, BidId, BidStatus, BidWithDriver, BidWithJob, Driver, DriverId, Job, JobFilter, JobId,
    JobStatus, JobSummary, VerificationStatus,
};
use crate::error::GatewayError;

/// A stored value plus its insertion sequence number, used for stable
/// newest/oldest-first ordering.
#[derive(Debug, Clone)]
struct Entry<T> {
    seq: u64,
    value: T,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_seq: u64,
    jobs: HashMap<JobId, Entry<Job>>,
    bids: HashMap<BidId, Entry<Bid>>,
    drivers: HashMap<DriverId, Entry<Driver>>,
}

impl MemoryState {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn job(&self, id: JobId) -> Result<&Job, GatewayError> {
        self.jobs
            .get(&id)
            .map(|entry| &entry.value)
            .ok_or(GatewayError::JobNotFound(id))
    }

    fn bid(&self, id: BidId) -> Result<&Bid, GatewayError> {
        self.bids
            .get(&id)
            .map(|entry| &entry.value)
            .ok_or(GatewayError::BidNotFound(id))
    }

    fn driver(&self, id: DriverId) -> Result<&Driver, GatewayError> {
        self.drivers
            .get(&id)
            .map(|entry| &entry.value)
            .ok_or(GatewayError::DriverNotFound(id))
    }

    fn bids_on(&self, job_id: JobId) -> impl Iterator<Item = &Entry<Bid>> {
        self.bids
            .values()
            .filter(move |entry| entry.value.job_id == job_id)
    }

    fn summarize(&self, job: &Job) -> JobSummary {
        let mut count: i64 = 0;
        let mut total_cents: i64 = 0;
        for entry in self.bids_on(job.id) {
            count += 1;
            total_cents = total_cents.saturating_add(entry.value.bid_amount.cents());
        }
        #[allow(clippy::cast_precision_loss)]
        let average_bid =
            (count > 0).then(|| average_cents_to_dollars(total_cents as f64 / count as f64));
        let winning_driver = job
            .winning_bid_id
            .and_then(|bid_id| self.bid(bid_id).ok())
            .and_then(|bid| self.driver(bid.driver_id).ok())
            .map(|driver| driver.name.clone());
        JobSummary {
            job: job.clone(),
            bid_count: count,
            average_bid,
            winning_driver,
        }
    }
}

/// Storage backend holding everything in process memory.
///
/// # Concurrency
///
/// - Any number of readers run concurrently.
/// - Mutations are serialized by one write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: &Job) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        if state.jobs.contains_key(&job.id) {
            return Err(GatewayError::Internal(format!("job {} already exists", job.id)));
        }
        let seq = state.next_seq();
        state.jobs.insert(
            job.id,
            Entry {
                seq,
                value: job.clone(),
            },
        );
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<Job, GatewayError> {
        self.state.read().await.job(id).cloned()
    }

    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobSummary>, GatewayError> {
        let state = self.state.read().await;
        let mut entries: Vec<&Entry<Job>> = state
            .jobs
            .values()
            .filter(|entry| filter.matches(&entry.value))
            .collect();
        entries.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(entries
            .into_iter()
            .map(|entry| state.summarize(&entry.value))
            .collect())
    }

    async fn update_job_status(
        &self,
        id: JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<Job, GatewayError> {
        let mut state = self.state.write().await;
        let entry = state.jobs.get_mut(&id).ok_or(GatewayError::JobNotFound(id))?;
        if entry.value.status != expected {
            return Err(GatewayError::InvalidTransition(format!(
                "job {id} is now {}; expected {expected}",
                entry.value.status
            )));
        }
        entry.value.status = next;
        entry.value.updated_at = Utc::now();
        Ok(entry.value.clone())
    }

    async fn list_assigned_jobs(&self, driver_id: DriverId) -> Result<Vec<Job>, GatewayError> {
        let state = self.state.read().await;
        let mut entries: Vec<&Entry<Job>> = state
            .jobs
            .values()
            .filter(|entry| {
                matches!(
                    entry.value.status,
                    JobStatus::Assigned | JobStatus::InProgress
                )
            })
            .filter(|entry| {
                entry
                    .value
                    .winning_bid_id
                    .and_then(|bid_id| state.bid(bid_id).ok())
                    .is_some_and(|bid| bid.driver_id == driver_id)
            })
            .collect();
        entries.sort_by(|a, b| {
            a.value
                .delivery_date
                .cmp(&b.value.delivery_date)
                .then(a.seq.cmp(&b.seq))
        });
        Ok(entries.into_iter().map(|entry| entry.value.clone()).collect())
    }
}

#[async_trait]
impl BidStore for MemoryStore {
    async fn insert_bid(&self, bid: &Bid) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        let job_status = state.job(bid.job_id)?.status;
        state.driver(bid.driver_id)?;
        // An existing pair is a duplicate whatever the job's status.
        if state
            .bids_on(bid.job_id)
            .any(|entry| entry.value.driver_id == bid.driver_id)
        {
            return Err(GatewayError::DuplicateBid {
                job_id: bid.job_id,
                driver_id: bid.driver_id,
            });
        }
        if job_status != JobStatus::Open {
            return Err(GatewayError::JobNotOpen {
                job_id: bid.job_id,
                status: job_status,
            });
        }
        let seq = state.next_seq();
        state.bids.insert(
            bid.id,
            Entry {
                seq,
                value: bid.clone(),
            },
        );
        Ok(())
    }

    async fn get_bid(&self, id: BidId) -> Result<Bid, GatewayError> {
        self.state.read().await.bid(id).cloned()
    }

    async fn list_bids_for_job(&self, job_id: JobId) -> Result<Vec<BidWithDriver>, GatewayError> {
        let state = self.state.read().await;
        let mut entries: Vec<&Entry<Bid>> = state.bids_on(job_id).collect();
        // Insertion order first so equal amounts keep placement order.
        entries.sort_by_key(|entry| entry.seq);
        let mut bids = Vec::with_capacity(entries.len());
        for entry in entries {
            let driver = state.driver(entry.value.driver_id)?;
            bids.push(BidWithDriver {
                bid: entry.value.clone(),
                driver_name: driver.name.clone(),
                driver_rating: driver.rating,
                completed_deliveries: driver.completed_deliveries,
                vehicle_type: driver.vehicle_type.clone(),
            });
        }
        sort_by_amount(&mut bids);
        Ok(bids)
    }

    async fn list_bids_for_driver(
        &self,
        driver_id: DriverId,
    ) -> Result<Vec<BidWithJob>, GatewayError> {
        let state = self.state.read().await;
        let mut entries: Vec<&Entry<Bid>> = state
            .bids
            .values()
            .filter(|entry| entry.value.driver_id == driver_id)
            .collect();
        entries.sort_by(|a, b| b.seq.cmp(&a.seq));
        let mut bids = Vec::with_capacity(entries.len());
        for entry in entries {
            let job = state.job(entry.value.job_id)?;
            bids.push(BidWithJob {
                bid: entry.value.clone(),
                vehicle_info: job.vehicle_info.clone(),
                pickup_address: job.pickup_address.clone(),
                delivery_address: job.delivery_address.clone(),
                delivery_date: job.delivery_date,
                delivery_window: job.delivery_window.clone(),
                job_status: job.status,
            });
        }
        Ok(bids)
    }

    async fn delete_bid(&self, id: BidId) -> Result<Bid, GatewayError> {
        let mut state = self.state.write().await;
        let bid = state.bid(id)?;
        if bid.status == BidStatus::Accepted {
            return Err(GatewayError::InvalidTransition(format!(
                "bid {id} is {} and cannot be withdrawn",
                bid.status
            )));
        }
        state
            .bids
            .remove(&id)
            .map(|entry| entry.value)
            .ok_or(GatewayError::BidNotFound(id))
    }

    async fn accept_bid(&self, job_id: JobId, bid_id: BidId) -> Result<Acceptance, GatewayError> {
        let mut state = self.state.write().await;
        let job = state.job(job_id)?;
        let bid = state.bid(bid_id)?;
        lifecycle::check_acceptance(job, bid)?;

        // All checks passed under the write lock; nothing below can fail.
        let now = Utc::now();
        let mut rejected_bids = Vec::new();
        for entry in state.bids.values_mut() {
            if entry.value.job_id != job_id {
                continue;
            }
            if entry.value.id == bid_id {
                entry.value.status = BidStatus::Accepted;
            } else if entry.value.status == BidStatus::Pending {
                entry.value.status = BidStatus::Rejected;
                rejected_bids.push(entry.value.id);
            } else {
                continue;
            }
            entry.value.updated_at = now;
        }

        let entry = state
            .jobs
            .get_mut(&job_id)
            .ok_or(GatewayError::JobNotFound(job_id))?;
        entry.value.status = JobStatus::Assigned;
        entry.value.winning_bid_id = Some(bid_id);
        entry.value.updated_at = now;
        let job = entry.value.clone();

        let bid = state.bid(bid_id)?.clone();
        Ok(Acceptance {
            job,
            bid,
            rejected_bids,
        })
    }
}

#[async_trait]
impl DriverStore for MemoryStore {
    async fn insert_driver(&self, driver: &Driver) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        let taken = state.drivers.values().any(|entry| {
            entry.value.email.eq_ignore_ascii_case(&driver.email)
                || entry.value.license_number == driver.license_number
        });
        if taken {
            return Err(GatewayError::DuplicateDriver);
        }
        let seq = state.next_seq();
        state.drivers.insert(
            driver.id,
            Entry {
                seq,
                value: driver.clone(),
            },
        );
        Ok(())
    }

    async fn get_driver(&self, id: DriverId) -> Result<Driver, GatewayError> {
        self.state.read().await.driver(id).cloned()
    }

    async fn find_driver_by_credentials(
        &self,
        email: &str,
        license_number: &str,
    ) -> Result<Option<Driver>, GatewayError> {
        let state = self.state.read().await;
        Ok(state
            .drivers
            .values()
            .find(|entry| {
                entry.value.email == email && entry.value.license_number == license_number
            })
            .map(|entry| entry.value.clone()))
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>, GatewayError> {
        let state = self.state.read().await;
        let mut entries: Vec<&Entry<Driver>> = state.drivers.values().collect();
        entries.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(entries.into_iter().map(|entry| entry.value.clone()).collect())
    }

    async fn set_verification(
        &self,
        id: DriverId,
        status: VerificationStatus,
        notes: Option<String>,
    ) -> Result<Driver, GatewayError> {
        let mut state = self.state.write().await;
        let entry = state
            .drivers
            .get_mut(&id)
            .ok_or(GatewayError::DriverNotFound(id))?;
        entry.value.verification_status = status;
        entry.value.verification_notes = notes;
        entry.value.verified_at = Some(Utc::now());
        Ok(entry.value.clone())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Money, NewBid, NewDriver, NewJob};

    fn sample_job(pickup: &str) -> Job {
        Job::open(NewJob {
            customer_name: "Sarah Johnson".to_string(),
            customer_phone: Some("(250) 555-0123".to_string()),
            pickup_address: pickup.to_string(),
            delivery_address: "321 Maple Dr, Sidney".to_string(),
            vehicle_info: "2023 Ford F-150 - Black".to_string(),
            delivery_date: NaiveDate::from_ymd_opt(2025, 8, 24).unwrap_or_default(),
            delivery_window: "10:00 AM - 2:00 PM".to_string(),
            special_instructions: None,
        })
    }

    fn sample_driver(n: u8) -> Driver {
        Driver::register(NewDriver {
            name: format!("Driver {n}"),
            email: format!("driver{n}@example.com"),
            phone: "(250) 555-0000".to_string(),
            license_number: format!("BC-{n}"),
            license_expiry: None,
            vehicle_type: "Car Carrier".to_string(),
        })
    }

    fn sample_bid(job: &Job, driver: &Driver, cents: i64) -> Bid {
        Bid::pending(NewBid {
            job_id: job.id,
            driver_id: driver.id,
            bid_amount: Money::from_cents(cents),
            estimated_completion_minutes: 180,
            message: None,
        })
    }

    async fn seeded() -> (MemoryStore, Job, Driver, Driver) {
        let store = MemoryStore::new();
        let job = sample_job("789 Pine St, Victoria");
        let d1 = sample_driver(1);
        let d2 = sample_driver(2);
        assert!(store.insert_job(&job).await.is_ok());
        assert!(store.insert_driver(&d1).await.is_ok());
        assert!(store.insert_driver(&d2).await.is_ok());
        (store, job, d1, d2)
    }

    #[tokio::test]
    async fn get_unknown_job_is_not_found() {
        let store = MemoryStore::new();
        let result = store.get_job(JobId::new()).await;
        assert!(matches!(result, Err(GatewayError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn jobs_list_newest_first_with_bid_stats() {
        let (store, first, d1, d2) = seeded().await;
        let second = sample_job("10 Fort St, Victoria");
        assert!(store.insert_job(&second).await.is_ok());
        assert!(store.insert_bid(&sample_bid(&first, &d1, 50_000)).await.is_ok());
        assert!(store.insert_bid(&sample_bid(&first, &d2, 45_000)).await.is_ok());

        let Ok(jobs) = store.list_jobs(&JobFilter::default()).await else {
            panic!("list should succeed");
        };
        let ids: Vec<JobId> = jobs.iter().map(|summary| summary.job.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        let Some(stats) = jobs.iter().find(|summary| summary.job.id == first.id) else {
            panic!("first job listed");
        };
        assert_eq!(stats.bid_count, 2);
        assert_eq!(stats.average_bid, Some(475.0));
    }

    #[tokio::test]
    async fn bids_list_cheapest_first() {
        let (store, job, d1, d2) = seeded().await;
        assert!(store.insert_bid(&sample_bid(&job, &d1, 50_000)).await.is_ok());
        assert!(store.insert_bid(&sample_bid(&job, &d2, 45_000)).await.is_ok());

        let Ok(bids) = store.list_bids_for_job(job.id).await else {
            panic!("list should succeed");
        };
        let names: Vec<&str> = bids.iter().map(|b| b.driver_name.as_str()).collect();
        assert_eq!(names, vec!["Driver 2", "Driver 1"]);
    }

    #[tokio::test]
    async fn bid_on_assigned_job_is_refused() {
        let (store, job, d1, d2) = seeded().await;
        let winner = sample_bid(&job, &d1, 50_000);
        assert!(store.insert_bid(&winner).await.is_ok());
        assert!(store.accept_bid(job.id, winner.id).await.is_ok());

        let result = store.insert_bid(&sample_bid(&job, &d2, 40_000)).await;
        assert!(matches!(
            result,
            Err(GatewayError::JobNotOpen {
                status: JobStatus::Assigned,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn failed_accept_changes_nothing() {
        let (store, job, d1, d2) = seeded().await;
        let b1 = sample_bid(&job, &d1, 50_000);
        let b2 = sample_bid(&job, &d2, 45_000);
        assert!(store.insert_bid(&b1).await.is_ok());
        assert!(store.insert_bid(&b2).await.is_ok());
        assert!(store.accept_bid(job.id, b2.id).await.is_ok());

        let result = store.accept_bid(job.id, b1.id).await;
        assert!(matches!(result, Err(GatewayError::InvalidTransition(_))));
        let Ok(job) = store.get_job(job.id).await else {
            panic!("job exists");
        };
        assert_eq!(job.winning_bid_id, Some(b2.id));
    }

    #[tokio::test]
    async fn concurrent_accepts_have_one_winner() {
        let (store, job, d1, d2) = seeded().await;
        let b1 = sample_bid(&job, &d1, 50_000);
        let b2 = sample_bid(&job, &d2, 45_000);
        assert!(store.insert_bid(&b1).await.is_ok());
        assert!(store.insert_bid(&b2).await.is_ok());

        let store = Arc::new(store);
        let first = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.accept_bid(job.id, b1.id).await }
        });
        let second = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.accept_bid(job.id, b2.id).await }
        });
        let (Ok(first), Ok(second)) = (first.await, second.await) else {
            panic!("tasks should not panic");
        };
        assert_eq!(usize::from(first.is_ok()) + usize::from(second.is_ok()), 1);
    }

    #[tokio::test]
    async fn status_compare_and_set_detects_races() {
        let (store, job, _, _) = seeded().await;
        let Ok(cancelled) = store
            .update_job_status(job.id, JobStatus::Open, JobStatus::Cancelled)
            .await
        else {
            panic!("first update should win");
        };
        assert_eq!(cancelled.status, JobStatus::Cancelled);

        let stale = store
            .update_job_status(job.id, JobStatus::Open, JobStatus::Cancelled)
            .await;
        assert!(matches!(stale, Err(GatewayError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn duplicate_license_is_rejected() {
        let store = MemoryStore::new();
        let first = sample_driver(1);
        let mut second = sample_driver(2);
        second.license_number = first.license_number.clone();
        assert!(store.insert_driver(&first).await.is_ok());
        let result = store.insert_driver(&second).await;
        assert!(matches!(result, Err(GatewayError::DuplicateDriver)));
    }
}
