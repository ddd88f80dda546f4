//! Cron schedule handling for cadence.
//!
//! This crate provides the synchronous scheduling core:
//! - Structured per-field schedule descriptions and their normalization
//!   into canonical five-field cron expressions
//! - Expression parsing with wildcard, exact-set, and stepped-range fields
//! - Next-occurrence computation at minute resolution

mod error;
mod expr;
mod occurrence;
mod schedule;

pub use error::CronError;
pub use expr::{CronExpression, CronField};
pub use schedule::{CronSchedule, FieldSpec, OneOrMany, ScheduleSpec};
