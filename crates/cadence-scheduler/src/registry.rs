//! Name-keyed registry of active jobs.
//!
//! The registry is the one resource shared between registration callers,
//! dispatch loops, and cancellation. All descriptor mutation funnels
//! through its methods under a single lock, so no caller ever observes a
//! partially-constructed entry or loses an update.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, watch};
use tracing::info;

use crate::backoff::Outcome;
use crate::error::SchedulerError;
use crate::types::{JobDescriptor, JobState};

struct JobEntry {
    descriptor: JobDescriptor,
    /// Cancellation signal for the job's dispatch loop. Dropping the
    /// entry also wakes the loop.
    cancel: watch::Sender<bool>,
}

/// Shared map of registered jobs.
#[derive(Clone, Default)]
pub(crate) struct Registry {
    jobs: Arc<RwLock<HashMap<String, JobEntry>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new job, checking the capacity cap and name uniqueness
    /// atomically. Returns the receiver half of the job's cancellation
    /// signal.
    pub async fn insert(
        &self,
        descriptor: JobDescriptor,
        max_jobs: usize,
    ) -> Result<watch::Receiver<bool>, SchedulerError> {
        let mut jobs = self.jobs.write().await;
        if jobs.len() >= max_jobs {
            return Err(SchedulerError::TooManyJobs(max_jobs));
        }
        if jobs.contains_key(&descriptor.name) {
            return Err(SchedulerError::DuplicateName(descriptor.name.clone()));
        }
        let (cancel, cancel_rx) = watch::channel(false);
        jobs.insert(descriptor.name.clone(), JobEntry { descriptor, cancel });
        Ok(cancel_rx)
    }

    /// Snapshot of a job's descriptor.
    pub async fn lookup(&self, name: &str) -> Option<JobDescriptor> {
        self.jobs
            .read()
            .await
            .get(name)
            .map(|entry| entry.descriptor.clone())
    }

    pub async fn state(&self, name: &str) -> Option<JobState> {
        self.jobs
            .read()
            .await
            .get(name)
            .map(|entry| entry.descriptor.state)
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Mark a job cancelled and wake its dispatch loop. Returns whether
    /// this call changed anything; unknown and already-cancelled names
    /// are no-ops.
    pub async fn cancel(&self, name: &str) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(entry) = jobs.get_mut(name) else {
            return false;
        };
        if entry.descriptor.state == JobState::Cancelled {
            return false;
        }
        entry.descriptor.state = JobState::Cancelled;
        // The loop may already have exited; a dead receiver is fine.
        let _ = entry.cancel.send(true);
        info!(name = %name, "cancelled cron job");
        true
    }

    /// Remove a job. Idempotent; absent names are a no-op.
    pub async fn remove(&self, name: &str) {
        self.jobs.write().await.remove(name);
    }

    /// Run the backoff state machine for `name` against `outcome` and
    /// return the next deadline. `None` means the job is gone or
    /// cancelled and its loop should terminate.
    pub async fn next_deadline(
        &self,
        name: &str,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> Result<Option<(DateTime<Utc>, bool)>, SchedulerError> {
        let mut jobs = self.jobs.write().await;
        let Some(entry) = jobs.get_mut(name) else {
            return Ok(None);
        };
        if !entry.descriptor.is_active() {
            return Ok(None);
        }
        let (deadline, is_retry) = entry.descriptor.next_deadline(outcome, now)?;
        Ok(Some((deadline, is_retry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::BackoffSchedule;
    use chrono::TimeZone;

    fn descriptor(name: &str) -> JobDescriptor {
        JobDescriptor::new(
            name.to_string(),
            "*/5 * * * *".parse().unwrap(),
            BackoffSchedule::default(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let registry = Registry::new();
        registry.insert(descriptor("a"), 10).await.unwrap();

        let found = registry.lookup("a").await.unwrap();
        assert_eq!(found.name, "a");
        assert_eq!(found.state, JobState::Active);
        assert!(registry.lookup("b").await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let registry = Registry::new();
        registry.insert(descriptor("a"), 10).await.unwrap();

        let err = registry.insert(descriptor("a"), 10).await.unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateName(name) if name == "a"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_capacity_cap() {
        let registry = Registry::new();
        registry.insert(descriptor("a"), 1).await.unwrap();

        let err = registry.insert(descriptor("b"), 1).await.unwrap_err();
        assert!(matches!(err, SchedulerError::TooManyJobs(1)));
    }

    #[tokio::test]
    async fn test_cancel_fires_signal_once() {
        let registry = Registry::new();
        let mut rx = registry.insert(descriptor("a"), 10).await.unwrap();

        assert!(registry.cancel("a").await);
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert_eq!(registry.state("a").await, Some(JobState::Cancelled));

        // Second cancel and unknown names are no-ops.
        assert!(!registry.cancel("a").await);
        assert!(!registry.cancel("missing").await);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = Registry::new();
        registry.insert(descriptor("a"), 10).await.unwrap();

        registry.remove("a").await;
        registry.remove("a").await;
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_remove_wakes_waiting_receiver() {
        let registry = Registry::new();
        let mut rx = registry.insert(descriptor("a"), 10).await.unwrap();

        registry.remove("a").await;
        // Sender dropped with the entry.
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test]
    async fn test_next_deadline_terminal_cases() {
        let registry = Registry::new();
        registry.insert(descriptor("a"), 10).await.unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 12, 3, 0).unwrap();

        let next = registry
            .next_deadline("a", Outcome::Success, now)
            .await
            .unwrap();
        assert_eq!(
            next,
            Some((Utc.with_ymd_and_hms(2024, 3, 5, 12, 5, 0).unwrap(), false))
        );

        registry.cancel("a").await;
        let next = registry
            .next_deadline("a", Outcome::Success, now)
            .await
            .unwrap();
        assert!(next.is_none());

        let next = registry
            .next_deadline("missing", Outcome::Success, now)
            .await
            .unwrap();
        assert!(next.is_none());
    }
}
