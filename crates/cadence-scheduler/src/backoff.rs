//! Retry backoff policy and state transitions.
//!
//! The backoff sequence is fixed at registration. On failure the attempt
//! index advances through the sequence and saturates at the last entry;
//! a success resets it and the job returns to its normal schedule.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use cadence_cron::CronError;

use crate::types::JobDescriptor;

/// Outcome of a handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Ordered retry delays in seconds. Empty means no retry policy: the
/// normal schedule applies regardless of outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackoffSchedule(Vec<u32>);

impl BackoffSchedule {
    pub fn new(delays: Vec<u32>) -> Self {
        Self(delays)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Delay for the given attempt index; zero for an out-of-range index,
    /// which `next_deadline` never produces.
    fn delay(&self, attempt: usize) -> Duration {
        Duration::seconds(i64::from(self.0.get(attempt).copied().unwrap_or(0)))
    }
}

impl From<Vec<u32>> for BackoffSchedule {
    fn from(delays: Vec<u32>) -> Self {
        Self(delays)
    }
}

impl JobDescriptor {
    /// Advance the retry state for `outcome` and compute the next trigger
    /// deadline. Returns the deadline and whether it is a retry.
    ///
    /// Backoff delays are measured from `now`, never from the missed
    /// normal deadline, so successive deadlines are monotone relative to
    /// when they are computed.
    pub fn next_deadline(
        &mut self,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, bool), CronError> {
        if outcome == Outcome::Success || self.backoff.is_empty() {
            self.retry_attempt = None;
            return Ok((self.expression.next_after(now)?, false));
        }

        let attempt = match self.retry_attempt {
            None => 0,
            Some(current) if current + 1 < self.backoff.len() => current + 1,
            // Exhausted: keep retrying at the last delay.
            Some(current) => current,
        };
        self.retry_attempt = Some(attempt);
        Ok((now + self.backoff.delay(attempt), true))
    }
}
