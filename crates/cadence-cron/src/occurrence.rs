//! Next-occurrence computation.
//!
//! Candidates advance largest-field-first: a failing month jumps to the
//! first minute of the next month, a failing day to the next midnight, a
//! failing hour to the next top of hour, and a failing minute by one
//! minute. Every step strictly increases the candidate, so the search
//! terminates for any matchable expression; a bounded horizon converts
//! never-matching expressions into an error.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};

use crate::error::CronError;
use crate::expr::CronExpression;

/// Search horizon. Any matchable five-field expression has occurrence
/// gaps well under a year; expressions that survive this many days
/// without a match (e.g. day 30 in February only) never match.
const SEARCH_HORIZON_DAYS: i64 = 366 * 5;

/// Fixed occurrence resolution. Five-field expressions have no seconds
/// field, so every result lands on a minute boundary and references are
/// truncated to one before the search starts.
const RESOLUTION_SECONDS: i64 = 60;

impl CronExpression {
    /// The earliest timestamp strictly after `after` that satisfies this
    /// expression, aligned to the fixed 60-second resolution.
    pub fn next_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>, CronError> {
        let mut candidate = truncate_to_minute(after) + Duration::seconds(RESOLUTION_SECONDS);
        let horizon = candidate + Duration::days(SEARCH_HORIZON_DAYS);

        while candidate < horizon {
            if !self.month.matches(candidate.month()) {
                match first_of_next_month(candidate) {
                    Some(next) => candidate = next,
                    None => break,
                }
                continue;
            }
            if !self.day_matches(candidate.date_naive()) {
                match start_of_next_day(candidate) {
                    Some(next) => candidate = next,
                    None => break,
                }
                continue;
            }
            if !self.hour.matches(candidate.hour()) {
                candidate = top_of_next_hour(candidate);
                continue;
            }
            if !self.minute.matches(candidate.minute()) {
                candidate += Duration::seconds(RESOLUTION_SECONDS);
                continue;
            }
            return Ok(candidate);
        }

        Err(CronError::Unmatchable(self.to_string()))
    }
}

fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at - Duration::nanoseconds(i64::from(at.timestamp_subsec_nanos()))
        - Duration::seconds(i64::from(at.second()))
}

fn top_of_next_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    truncate_to_minute(at) - Duration::minutes(i64::from(at.minute())) + Duration::hours(1)
}

fn start_of_next_day(at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let next = at.date_naive().succ_opt()?;
    Some(next.and_time(NaiveTime::MIN).and_utc())
}

fn first_of_next_month(at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let (year, month) = if at.month() == 12 {
        (at.year() + 1, 1)
    } else {
        (at.year(), at.month() + 1)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(first.and_time(NaiveTime::MIN).and_utc())
}
