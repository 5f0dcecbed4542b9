//! Bid lifecycle rules.
//!
//! Pure checks shared by every storage backend. A job moves
//! `open → assigned → in_progress → completed`; `cancelled` is reachable by
//! manual override from `open` or `assigned` and is terminal. The only way into `assigned` is [`check_acceptance`].
//! These functions never touch storage, so a backend can run them inside
//! its own transaction or lock.

use super::{Bid, BidId, BidStatus, Job, JobStatus};
use crate::error::GatewayError;

/// Result of a successful bid acceptance.
#[derive(Debug, Clone)]
pub struct Acceptance {
    /// The job, now `assigned` with its winning bid set.
    pub job: Job,
    /// The winning bid, now `accepted`.
    pub bid: Bid,
    /// Sibling bids that were moved to `rejected`.
    pub rejected_bids: Vec<BidId>,
}

/// Checks that `bid` can be accepted as the winner of `job`.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidTransition`] if the bid belongs to another
/// job, the job is not `open`, or the bid is not `pending`.
pub fn check_acceptance(job: &Job, bid: &Bid) -> Result<(), GatewayError> {
    if bid.job_id != job.id {
        return Err(GatewayError::InvalidTransition(format!(
            "bid {} does not belong to job {}",
            bid.id, job.id
        )));
    }
    if job.status != JobStatus::Open {
        return Err(GatewayError::InvalidTransition(format!(
            "job {} is {}; only open jobs can accept a bid",
            job.id, job.status
        )));
    }
    if bid.status != BidStatus::Pending {
        return Err(GatewayError::InvalidTransition(format!(
            "bid {} is {}; only pending bids can be accepted",
            bid.id, bid.status
        )));
    }
    Ok(())
}

/// Statuses a job in `from` can be manually moved to.
///
/// Overrides follow the lifecycle edges one step at a time. `assigned` is
/// never a target, and `cancelled` and `completed` are terminal.
#[must_use]
pub const fn override_targets(from: JobStatus) -> &'static [JobStatus] {
    match from {
        JobStatus::Open => &[JobStatus::Cancelled],
        JobStatus::Assigned => &[JobStatus::InProgress, JobStatus::Cancelled],
        JobStatus::InProgress => &[JobStatus::Completed],
        JobStatus::Completed | JobStatus::Cancelled => &[],
    }
}

/// Checks that a manual status override from the job's current state to
/// `target` follows the lifecycle. Re-applying the current status is
/// allowed.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidTransition`] if `target` is not one of
/// [`override_targets`] for the job's status.
pub fn check_status_override(job: &Job, target: JobStatus) -> Result<(), GatewayError> {
    if target == job.status || override_targets(job.status).contains(&target) {
        return Ok(());
    }
    let reason = match (job.status, target) {
        (_, JobStatus::Assigned) => "jobs become assigned only by accepting a bid".to_string(),
        (JobStatus::Completed | JobStatus::Cancelled, _) => {
            format!("job {} is {} and can no longer change", job.id, job.status)
        }
        (from, to) => format!("job {} cannot move from {from} to {to}", job.id),
    };
    Err(GatewayError::InvalidTransition(reason))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{DriverId, Money, NewBid, NewJob};

    fn open_job() -> Job {
        Job::open(NewJob {
            customer_name: "Emily Watson".to_string(),
            customer_phone: None,
            pickup_address: "789 Pine St, Victoria".to_string(),
            delivery_address: "321 Maple Dr, Sidney".to_string(),
            vehicle_info: "2021 Toyota RAV4 - Silver".to_string(),
            delivery_date: NaiveDate::from_ymd_opt(2025, 8, 23).unwrap_or_default(),
            delivery_window: "2:00 PM - 5:00 PM".to_string(),
            special_instructions: None,
        })
    }

    fn bid_on(job: &Job) -> Bid {
        Bid::pending(NewBid {
            job_id: job.id,
            driver_id: DriverId::new(),
            bid_amount: Money::from_cents(45_000),
            estimated_completion_minutes: 240,
            message: None,
        })
    }

    fn assert_invalid_transition(result: Result<(), GatewayError>) {
        let Err(GatewayError::InvalidTransition(_)) = result else {
            panic!("expected InvalidTransition, got {result:?}");
        };
    }

    #[test]
    fn pending_bid_on_open_job_is_acceptable() {
        let job = open_job();
        let bid = bid_on(&job);
        assert!(check_acceptance(&job, &bid).is_ok());
    }

    #[test]
    fn bid_from_another_job_is_refused() {
        let job = open_job();
        let other = open_job();
        let bid = bid_on(&other);
        assert_invalid_transition(check_acceptance(&job, &bid));
    }

    #[test]
    fn assigned_job_cannot_accept_again() {
        let mut job = open_job();
        let bid = bid_on(&job);
        job.status = JobStatus::Assigned;
        job.winning_bid_id = Some(BidId::new());
        assert_invalid_transition(check_acceptance(&job, &bid));
    }

    #[test]
    fn rejected_bid_cannot_be_accepted() {
        let job = open_job();
        let mut bid = bid_on(&job);
        bid.status = BidStatus::Rejected;
        assert_invalid_transition(check_acceptance(&job, &bid));
    }

    #[test]
    fn override_cannot_assign() {
        assert_invalid_transition(check_status_override(&open_job(), JobStatus::Assigned));
    }

    #[test]
    fn override_to_in_progress_needs_assignment() {
        let mut job = open_job();
        assert_invalid_transition(check_status_override(&job, JobStatus::InProgress));

        job.status = JobStatus::Assigned;
        job.winning_bid_id = Some(BidId::new());
        assert!(check_status_override(&job, JobStatus::InProgress).is_ok());
        assert_invalid_transition(check_status_override(&job, JobStatus::Open));
        assert_invalid_transition(check_status_override(&job, JobStatus::Completed));
    }

    #[test]
    fn cancel_only_from_open_or_assigned() {
        let mut job = open_job();
        assert!(check_status_override(&job, JobStatus::Cancelled).is_ok());
        job.status = JobStatus::Assigned;
        job.winning_bid_id = Some(BidId::new());
        assert!(check_status_override(&job, JobStatus::Cancelled).is_ok());
        job.status = JobStatus::InProgress;
        assert_invalid_transition(check_status_override(&job, JobStatus::Cancelled));
    }

    #[test]
    fn terminal_statuses_are_absorbing() {
        let mut job = open_job();
        job.status = JobStatus::Cancelled;
        assert_invalid_transition(check_status_override(&job, JobStatus::Open));
        job.status = JobStatus::Completed;
        job.winning_bid_id = Some(BidId::new());
        assert_invalid_transition(check_status_override(&job, JobStatus::Cancelled));
    }

    #[test]
    fn same_status_is_a_no_op() {
        assert!(check_status_override(&open_job(), JobStatus::Open).is_ok());
    }

    #[test]
    fn override_targets_follow_lifecycle() {
        assert_eq!(override_targets(JobStatus::Open), &[JobStatus::Cancelled]);
        assert_eq!(
            override_targets(JobStatus::Assigned),
            &[JobStatus::InProgress, JobStatus::Cancelled]
        );
        assert!(override_targets(JobStatus::Cancelled).is_empty());
    }
}
