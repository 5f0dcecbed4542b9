//! Per-connection subscription manager.
//!
//! Tracks which jobs a WebSocket client follows and provides server-side
//! event filtering. A fresh connection is in broadcast mode and receives
//! every event; subscribing to specific jobs narrows the feed.

use std::collections::HashSet;

use crate::domain::JobId;

/// Manages the job subscriptions of a single WebSocket connection.
#[derive(Debug)]
pub struct SubscriptionManager {
    /// Followed jobs. Ignored while `broadcast` is set.
    job_ids: HashSet<JobId>,
    /// Whether the client receives events for every job.
    broadcast: bool,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self {
            job_ids: HashSet::new(),
            broadcast: true,
        }
    }
}

impl SubscriptionManager {
    /// Creates a manager in broadcast mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Follows `ids`, leaving broadcast mode. A wildcard restores broadcast
    /// mode and forgets the explicit set.
    pub fn subscribe(&mut self, ids: &[JobId], wildcard: bool) {
        if wildcard {
            self.broadcast = true;
            self.job_ids.clear();
            return;
        }
        if !ids.is_empty() {
            self.broadcast = false;
        }
        self.job_ids.extend(ids.iter().copied());
    }

    /// Stops following `ids`. A wildcard stops all events.
    pub fn unsubscribe(&mut self, ids: &[JobId], wildcard: bool) {
        if wildcard {
            self.broadcast = false;
            self.job_ids.clear();
            return;
        }
        for id in ids {
            self.job_ids.remove(id);
        }
    }

    /// Returns `true` if events for `job_id` should be forwarded.
    #[must_use]
    pub fn matches(&self, job_id: JobId) -> bool {
        self.broadcast || self.job_ids.contains(&job_id)
    }

    /// Number of explicitly followed jobs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.job_ids.len()
    }

    /// Returns `true` in broadcast mode.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.broadcast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_connection_receives_everything() {
        let mgr = SubscriptionManager::new();
        assert!(mgr.is_broadcast());
        assert!(mgr.matches(JobId::new()));
    }

    #[test]
    fn subscribing_narrows_the_feed() {
        let mut mgr = SubscriptionManager::new();
        let id = JobId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(id));
        assert!(!mgr.matches(JobId::new()));
        assert_eq!(mgr.count(), 1);
    }

    #[test]
    fn wildcard_restores_broadcast() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[JobId::new()], false);
        mgr.subscribe(&[], true);
        assert!(mgr.is_broadcast());
        assert_eq!(mgr.count(), 0);
        assert!(mgr.matches(JobId::new()));
    }

    #[test]
    fn unsubscribe_removes_job() {
        let mut mgr = SubscriptionManager::new();
        let id = JobId::new();
        mgr.subscribe(&[id], false);
        mgr.unsubscribe(&[id], false);
        assert!(!mgr.matches(id));
    }

    #[test]
    fn wildcard_unsubscribe_silences_connection() {
        let mut mgr = SubscriptionManager::new();
        mgr.unsubscribe(&[], true);
        assert!(!mgr.matches(JobId::new()));
    }
}
