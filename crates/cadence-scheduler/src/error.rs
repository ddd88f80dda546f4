//! Error types for the scheduler.

use thiserror::Error;

/// Errors raised at the registration boundary. Steady-state handler
/// failures never surface here; they feed the backoff state machine.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Schedule normalization or expression parsing failed.
    #[error("cron error: {0}")]
    Cron(#[from] cadence_cron::CronError),

    /// A job with this name is already registered.
    #[error("job already registered: {0}")]
    DuplicateName(String),

    /// The job name is empty, too long, or contains invalid characters.
    #[error("invalid job name: {0}")]
    InvalidName(String),

    /// The registered-job cap was reached.
    #[error("too many jobs: limit is {0}")]
    TooManyJobs(usize),
}
