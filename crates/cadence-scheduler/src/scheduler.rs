//! Job registration and per-job trigger dispatch.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use cadence_cron::{CronExpression, CronSchedule};

use crate::backoff::{BackoffSchedule, Outcome};
use crate::clock::{Clock, SystemClock};
use crate::error::SchedulerError;
use crate::registry::Registry;
use crate::sink::{DiagnosticSink, TracingSink};
use crate::types::{JobDescriptor, JobOptions, JobState, Trigger};

/// Maximum length of a job name.
const MAX_NAME_LEN: usize = 64;

/// Type alias for the boxed handler invoked on every trigger.
pub type JobHandler =
    Box<dyn Fn() -> Pin<Box<dyn Future<Output = Result<(), String>> + Send>> + Send + Sync>;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of concurrently registered jobs.
    pub max_jobs: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_jobs: 100 }
    }
}

/// The job scheduler.
///
/// Each registered job gets its own dispatch loop: wait for the next
/// trigger, invoke the handler exactly once, record the outcome, and let
/// the backoff state machine pick the next deadline. Loops run
/// independently; a slow handler stalls only its own job.
pub struct Scheduler {
    registry: Registry,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
    config: SchedulerConfig,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler with the default configuration, wall clock,
    /// and tracing sink.
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(TracingSink))
    }

    /// Create a scheduler with an explicit clock and diagnostic sink.
    pub fn with_parts(
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            registry: Registry::new(),
            clock,
            sink,
            config,
        }
    }

    /// Register a job under a unique name and start its dispatch loop.
    ///
    /// Fails with a configuration error if the name is invalid or taken,
    /// the schedule cannot be normalized or parsed, the expression never
    /// matches, or the job cap is reached. Once registration returns, the
    /// only error surface left is the diagnostic sink.
    pub async fn register<F, Fut>(
        &self,
        name: impl Into<String>,
        schedule: impl Into<CronSchedule>,
        options: JobOptions,
        handler: F,
    ) -> Result<JobHandle, SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        let handler: JobHandler = Box::new(move || Box::pin(handler()));
        self.register_boxed(name.into(), schedule.into(), options, handler)
            .await
    }

    async fn register_boxed(
        &self,
        name: String,
        schedule: CronSchedule,
        options: JobOptions,
        handler: JobHandler,
    ) -> Result<JobHandle, SchedulerError> {
        validate_name(&name)?;
        let expression: CronExpression = schedule.to_expression()?.parse()?;
        let backoff = BackoffSchedule::new(options.backoff_schedule.unwrap_or_default());

        let now = self.clock.now();
        // Computing the first occurrence up front makes an unmatchable
        // expression fail the registration call itself.
        let first_deadline = expression.next_after(now)?;

        let descriptor = JobDescriptor::new(name.clone(), expression, backoff, now);
        let cancel_rx = self
            .registry
            .insert(descriptor, self.config.max_jobs)
            .await?;

        info!(name = %name, next = %first_deadline, "registered cron job");

        let task = tokio::spawn(dispatch_loop(
            name.clone(),
            self.registry.clone(),
            self.clock.clone(),
            self.sink.clone(),
            handler,
            cancel_rx,
            first_deadline,
        ));

        Ok(JobHandle {
            name,
            registry: self.registry.clone(),
            task,
        })
    }

    /// Cancel a job by name. Unknown and already-cancelled names are
    /// no-ops; returns whether this call cancelled anything.
    pub async fn cancel(&self, name: &str) -> bool {
        self.registry.cancel(name).await
    }

    /// Remove a job outright. Its dispatch loop wakes and terminates.
    /// Idempotent.
    pub async fn remove(&self, name: &str) {
        self.registry.remove(name).await;
    }

    /// Snapshot of a registered job's descriptor.
    pub async fn lookup(&self, name: &str) -> Option<JobDescriptor> {
        self.registry.lookup(name).await
    }

    /// Number of currently registered jobs.
    pub async fn job_count(&self) -> usize {
        self.registry.len().await
    }
}

/// Handle to a registered job: cancellation control plus a way to await
/// the dispatch loop's terminal state for clean shutdown.
///
/// Dropping the handle does not cancel the job; the loop keeps running
/// until cancelled or removed by name.
pub struct JobHandle {
    name: String,
    registry: Registry,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cancel the job. Idempotent; an in-flight invocation runs to
    /// completion before the loop terminates.
    pub async fn cancel(&self) {
        self.registry.cancel(&self.name).await;
    }

    /// Wait for the dispatch loop to terminate.
    pub async fn stopped(self) {
        let _ = self.task.await;
    }
}

/// One cycle per trigger: cancellable wait, exactly-once invocation,
/// outcome recording, next-deadline computation. The loop never starts
/// invocation N+1 before invocation N's outcome is recorded.
async fn dispatch_loop(
    name: String,
    registry: Registry,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
    handler: JobHandler,
    mut cancel_rx: watch::Receiver<bool>,
    first_deadline: DateTime<Utc>,
) {
    let mut deadline = first_deadline;
    let mut is_retry = false;

    loop {
        debug!(name = %name, deadline = %deadline, is_retry, "waiting for trigger");

        tokio::select! {
            // The signal only ever flips to true, and an Err means the
            // registry entry is gone; both end the loop.
            _ = cancel_rx.changed() => break,
            _ = clock.sleep_until(deadline) => {}
        }

        // Cancellation can race the deadline; re-check before invoking.
        if registry.state(&name).await != Some(JobState::Active) {
            break;
        }

        let trigger = Trigger {
            job_name: name.clone(),
            fired_at: clock.now(),
            is_retry,
        };
        debug!(
            name = %trigger.job_name,
            fired_at = %trigger.fired_at,
            is_retry = trigger.is_retry,
            "trigger fired"
        );

        // Invoke exactly once and wait for completion. Failures are
        // reported to the sink and converted into scheduling decisions;
        // they never propagate.
        let outcome = match handler().await {
            Ok(()) => Outcome::Success,
            Err(message) => {
                sink.handler_failed(&name, &message);
                Outcome::Failure
            }
        };

        match registry.next_deadline(&name, outcome, clock.now()).await {
            Ok(Some((next, retry))) => {
                if retry {
                    warn!(name = %name, next = %next, "handler failed, scheduled retry");
                }
                deadline = next;
                is_retry = retry;
            }
            // Cancelled or removed while the handler was running.
            Ok(None) => break,
            Err(e) => {
                error!(name = %name, error = %e, "failed to compute next occurrence");
                break;
            }
        }
    }

    registry.remove(&name).await;
    info!(name = %name, "cron job stopped");
}

fn validate_name(name: &str) -> Result<(), SchedulerError> {
    if name.is_empty() {
        return Err(SchedulerError::InvalidName("name is empty".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(SchedulerError::InvalidName(format!(
            "name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(SchedulerError::InvalidName(format!(
            "name contains invalid characters: {name:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_accepts_reasonable_names() {
        assert!(validate_name("nightly-cleanup").is_ok());
        assert!(validate_name("job_42").is_ok());
        assert!(validate_name(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_validate_name_rejects() {
        assert!(validate_name("").is_err());
        assert!(validate_name(&"a".repeat(65)).is_err());
        assert!(validate_name("has spaces").is_err());
        assert!(validate_name("sneaky/slash").is_err());
    }

    #[test]
    fn test_default_config() {
        assert_eq!(SchedulerConfig::default().max_jobs, 100);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_schedule() {
        let scheduler = Scheduler::new();
        let result = scheduler
            .register("bad", "not a cron", JobOptions::default(), || async {
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(SchedulerError::Cron(_))));
        assert_eq!(scheduler.job_count().await, 0);
    }

    #[tokio::test]
    async fn test_register_rejects_unmatchable_schedule() {
        let scheduler = Scheduler::new();
        let result = scheduler
            .register(
                "impossible",
                "0 0 30 2 *",
                JobOptions::default(),
                || async { Ok(()) },
            )
            .await;
        assert!(matches!(
            result,
            Err(SchedulerError::Cron(cadence_cron::CronError::Unmatchable(_)))
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_name() {
        let scheduler = Scheduler::new();
        let result = scheduler
            .register("", "* * * * *", JobOptions::default(), || async { Ok(()) })
            .await;
        assert!(matches!(result, Err(SchedulerError::InvalidName(_))));
    }
}
