//! Time source abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Injectable time source for the scheduler.
///
/// `sleep_until` resolves once `deadline` has passed. The dispatcher
/// races it against the job's cancellation signal, so implementations do
/// not need to handle cancellation themselves. Substituting the clock
/// makes dispatch fully deterministic in tests.
#[async_trait]
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspend until `deadline`. Returns immediately if it has passed.
    async fn sleep_until(&self, deadline: DateTime<Utc>);
}

/// Wall-clock implementation backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        let now = Utc::now();
        if deadline <= now {
            return;
        }
        let remaining = (deadline - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        tokio::time::sleep(remaining).await;
    }
}
