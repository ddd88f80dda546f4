//! Named, recurring job scheduler for cadence.
//!
//! This crate provides the asynchronous engine on top of `cadence-cron`:
//! - Jobs registered under a unique name with a cron schedule and handler
//! - One dispatch loop per job; at most one in-flight invocation per name
//! - Bounded retry backoff applied after handler failure
//! - Cooperative cancellation through job handles
//! - Injectable clock and diagnostic sink for deterministic testing

mod backoff;
mod clock;
mod error;
mod registry;
mod scheduler;
mod sink;
mod types;

pub use backoff::{BackoffSchedule, Outcome};
pub use clock::{Clock, SystemClock};
pub use error::SchedulerError;
pub use scheduler::{JobHandle, JobHandler, Scheduler, SchedulerConfig};
pub use sink::{DiagnosticSink, TracingSink};
pub use types::{JobDescriptor, JobOptions, JobState, Trigger};

pub use cadence_cron::{CronError, CronExpression, CronSchedule, FieldSpec, OneOrMany, ScheduleSpec};
