//! Error types for the cron core.

use thiserror::Error;

/// Errors that can occur while normalizing, parsing, or evaluating
/// cron schedules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CronError {
    /// A structured schedule field had an inconsistent combination of parts.
    #[error("invalid schedule field: {0}")]
    InvalidField(String),

    /// A cron expression string could not be parsed.
    #[error("invalid cron expression: {0}")]
    InvalidExpression(String),

    /// A field value is outside the allowed bounds for its position.
    #[error("{field} value {value} out of range {min}-{max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// The expression parses but provably never matches any timestamp.
    #[error("cron expression never matches: {0}")]
    Unmatchable(String),
}
