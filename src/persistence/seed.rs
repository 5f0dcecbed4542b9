//! Sample drivers and jobs for demos and local development.

use chrono::{NaiveDate, Utc};

use super::{DispatchStore, DriverStore, JobStore};
use crate::domain::{Driver, Job, NewDriver, NewJob, VerificationStatus};
use crate::error::GatewayError;

/// `(name, email, phone, licence, vehicle type, rating, completed deliveries)`
const SAMPLE_DRIVERS: [(&str, &str, &str, &str, &str, f64, i64); 4] = [
    ("John Smith", "john@driver.com", "604-555-0101", "DL123456", "Flatbed Truck", 4.8, 127),
    ("Maria Garcia", "maria@driver.com", "778-555-0102", "DL234567", "Enclosed Trailer", 4.9, 203),
    ("David Lee", "david@driver.com", "250-555-0103", "DL345678", "Tow Truck", 4.7, 89),
    ("Sarah Johnson", "sarah@driver.com", "604-555-0104", "DL456789", "Flatbed Truck", 5.0, 156),
];

struct SampleJob {
    customer: &'static str,
    pickup: &'static str,
    delivery: &'static str,
    vehicle: &'static str,
    distance_km: f64,
    minutes: i64,
    date: (i32, u32, u32),
    window: &'static str,
    instructions: &'static str,
}

const SAMPLE_JOBS: [SampleJob; 3] = [
    SampleJob {
        customer: "Robert Chen",
        pickup: "123 Main St, Vancouver, BC",
        delivery: "456 Oak Ave, Richmond, BC",
        vehicle: "2022 Honda Civic - Blue",
        distance_km: 15.5,
        minutes: 30,
        date: (2025, 8, 22),
        window: "9:00 AM - 12:00 PM",
        instructions: "Handle with care, new purchase",
    },
    SampleJob {
        customer: "Emily Watson",
        pickup: "789 Pine St, Victoria, BC",
        delivery: "321 Maple Dr, Sidney, BC",
        vehicle: "2021 Toyota RAV4 - Silver",
        distance_km: 22.3,
        minutes: 45,
        date: (2025, 8, 23),
        window: "2:00 PM - 5:00 PM",
        instructions: "Customer will meet at destination",
    },
    SampleJob {
        customer: "Michael Brown",
        pickup: "555 Beach Rd, Kelowna, BC",
        delivery: "777 Mountain View, West Kelowna, BC",
        vehicle: "2020 Ford F-150 - Black",
        distance_km: 18.7,
        minutes: 35,
        date: (2025, 8, 24),
        window: "10:00 AM - 1:00 PM",
        instructions: "Requires flatbed truck",
    },
];

/// Inserts four approved sample drivers and three open sample jobs, but
/// only into a store that has no drivers yet.
///
/// Returns `true` if data was inserted.
///
/// # Errors
///
/// Returns any storage error raised while inserting.
pub async fn seed_sample_data(store: &dyn DispatchStore) -> Result<bool, GatewayError> {
    if !store.list_drivers().await?.is_empty() {
        tracing::debug!("store already has drivers; skipping sample data");
        return Ok(false);
    }

    for (name, email, phone, license, vehicle, rating, completed) in SAMPLE_DRIVERS {
        let mut driver = Driver::register(NewDriver {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            license_number: license.to_string(),
            license_expiry: None,
            vehicle_type: vehicle.to_string(),
        });
        driver.rating = rating;
        driver.completed_deliveries = completed;
        driver.verification_status = VerificationStatus::Approved;
        driver.verified_at = Some(Utc::now());
        store.insert_driver(&driver).await?;
    }

    for sample in SAMPLE_JOBS {
        let (year, month, day) = sample.date;
        let delivery_date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| GatewayError::Internal("invalid sample date".to_string()))?;
        let mut job = Job::open(NewJob {
            customer_name: sample.customer.to_string(),
            customer_phone: None,
            pickup_address: sample.pickup.to_string(),
            delivery_address: sample.delivery.to_string(),
            vehicle_info: sample.vehicle.to_string(),
            delivery_date,
            delivery_window: sample.window.to_string(),
            special_instructions: Some(sample.instructions.to_string()),
        });
        job.distance_km = sample.distance_km;
        job.estimated_minutes = sample.minutes;
        store.insert_job(&job).await?;
    }

    tracing::info!(
        drivers = SAMPLE_DRIVERS.len(),
        jobs = SAMPLE_JOBS.len(),
        "sample data inserted"
    );
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::JobFilter;
    use crate::persistence::memory::MemoryStore;

    #[tokio::test]
    async fn seeds_once() {
        let store = MemoryStore::new();
        assert!(matches!(seed_sample_data(&store).await, Ok(true)));
        assert!(matches!(seed_sample_data(&store).await, Ok(false)));

        let Ok(drivers) = store.list_drivers().await else {
            panic!("list drivers");
        };
        assert_eq!(drivers.len(), 4);
        assert!(drivers.iter().all(Driver::is_verified));

        let Ok(jobs) = store.list_jobs(&JobFilter::default()).await else {
            panic!("list jobs");
        };
        assert_eq!(jobs.len(), 3);
    }
}
