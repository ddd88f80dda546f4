//! Scheduler types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cadence_cron::CronExpression;

use crate::backoff::BackoffSchedule;

/// Lifecycle state of a registered job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobState {
    /// Job is live; its dispatch loop keeps computing triggers.
    #[default]
    Active,
    /// Job was cancelled; no further triggers fire.
    Cancelled,
}

/// A registered job and its mutable dispatch state.
///
/// Descriptors are owned by the registry; dispatch loops and cancellation
/// mutate them only through registry methods.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    /// Unique name of the job.
    pub name: String,
    /// Parsed trigger schedule.
    pub expression: CronExpression,
    /// Retry delays applied after handler failure.
    pub backoff: BackoffSchedule,
    /// Index into the backoff schedule while failures are ongoing;
    /// `None` outside a retry sequence. Always `< backoff.len()` when set.
    pub retry_attempt: Option<usize>,
    /// Current lifecycle state.
    pub state: JobState,
    /// When the job was registered.
    pub registered_at: DateTime<Utc>,
}

impl JobDescriptor {
    pub fn new(
        name: String,
        expression: CronExpression,
        backoff: BackoffSchedule,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            expression,
            backoff,
            retry_attempt: None,
            state: JobState::Active,
            registered_at,
        }
    }

    /// Whether the job still accepts triggers.
    pub fn is_active(&self) -> bool {
        self.state == JobState::Active
    }
}

/// A single firing of a job. Ephemeral; constructed per dispatch cycle
/// and carried through logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Name of the job that fired.
    pub job_name: String,
    /// When the trigger fired.
    pub fired_at: DateTime<Utc>,
    /// Whether this trigger came from the backoff sequence rather than
    /// the normal schedule.
    pub is_retry: bool,
}

/// Options accepted at registration time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOptions {
    /// Retry delays in seconds applied after handler failure. Absent or
    /// empty means no retry policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_schedule: Option<Vec<u32>>,
}
