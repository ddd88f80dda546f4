//! Canonical cron expression parsing and field matching.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use crate::error::CronError;

/// Inclusive bounds for one expression position.
#[derive(Debug, Clone, Copy)]
struct FieldBounds {
    name: &'static str,
    min: u32,
    max: u32,
}

const MINUTE: FieldBounds = FieldBounds {
    name: "minute",
    min: 0,
    max: 59,
};
const HOUR: FieldBounds = FieldBounds {
    name: "hour",
    min: 0,
    max: 23,
};
const DAY_OF_MONTH: FieldBounds = FieldBounds {
    name: "day-of-month",
    min: 1,
    max: 31,
};
const MONTH: FieldBounds = FieldBounds {
    name: "month",
    min: 1,
    max: 12,
};
// Both 0 and 7 mean Sunday; 7 is normalized at match time.
const DAY_OF_WEEK: FieldBounds = FieldBounds {
    name: "day-of-week",
    min: 0,
    max: 7,
};

/// One parsed cron field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronField {
    /// `*` — matches every value.
    Wildcard,
    /// An explicit set of values, e.g. `1,2,3` or a single `5`.
    Exact(Vec<u32>),
    /// An inclusive range walked in `step` increments, e.g. `1-5/2`.
    Range { start: u32, end: u32, step: u32 },
}

impl CronField {
    fn parse(input: &str, bounds: FieldBounds) -> Result<Self, CronError> {
        if input == "*" {
            return Ok(CronField::Wildcard);
        }

        if let Some(step) = input.strip_prefix("*/") {
            let step = parse_step(step, input)?;
            return Ok(CronField::Range {
                start: bounds.min,
                end: bounds.max,
                step,
            });
        }

        if input.contains(',') {
            let values = input
                .split(',')
                .map(|part| parse_value(part, bounds))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(CronField::Exact(values));
        }

        if let Some((range, step)) = split_step(input) {
            let step = match step {
                Some(step) => parse_step(step, input)?,
                None => 1,
            };
            return match range.split_once('-') {
                Some((start, end)) => {
                    let start = parse_value(start, bounds)?;
                    let end = parse_value(end, bounds)?;
                    if end < start {
                        return Err(CronError::InvalidExpression(format!(
                            "range end before start: {input}"
                        )));
                    }
                    Ok(CronField::Range { start, end, step })
                }
                // `a/s` means "from a to the field's maximum, every s".
                None => {
                    let start = parse_value(range, bounds)?;
                    Ok(CronField::Range {
                        start,
                        end: bounds.max,
                        step,
                    })
                }
            };
        }

        Ok(CronField::Exact(vec![parse_value(input, bounds)?]))
    }

    /// Whether `value` satisfies this field.
    pub fn matches(&self, value: u32) -> bool {
        match self {
            CronField::Wildcard => true,
            CronField::Exact(values) => values.contains(&value),
            CronField::Range { start, end, step } => {
                value >= *start && value <= *end && (value - start) % step == 0
            }
        }
    }

    /// Whether this field is unrestricted.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, CronField::Wildcard)
    }
}

/// Split `a-b/s` or `a/s` into the range part and the optional step part.
/// Returns `None` for plain values (no `-` and no `/`).
fn split_step(input: &str) -> Option<(&str, Option<&str>)> {
    match input.split_once('/') {
        Some((range, step)) => Some((range, Some(step))),
        None if input.contains('-') => Some((input, None)),
        None => None,
    }
}

fn parse_value(input: &str, bounds: FieldBounds) -> Result<u32, CronError> {
    let value: u32 = input.trim().parse().map_err(|_| {
        CronError::InvalidExpression(format!("not a number in {} field: {input:?}", bounds.name))
    })?;
    if value < bounds.min || value > bounds.max {
        return Err(CronError::OutOfRange {
            field: bounds.name,
            value,
            min: bounds.min,
            max: bounds.max,
        });
    }
    Ok(value)
}

fn parse_step(input: &str, context: &str) -> Result<u32, CronError> {
    let step: u32 = input.trim().parse().map_err(|_| {
        CronError::InvalidExpression(format!("invalid step in field: {context:?}"))
    })?;
    if step == 0 {
        return Err(CronError::InvalidExpression(format!(
            "step must be at least 1: {context:?}"
        )));
    }
    Ok(step)
}

/// A parsed five-field cron expression: minute, hour, day-of-month,
/// month, day-of-week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
    pub minute: CronField,
    pub hour: CronField,
    pub day_of_month: CronField,
    pub month: CronField,
    pub day_of_week: CronField,
    source: String,
}

impl FromStr for CronExpression {
    type Err = CronError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = input.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronError::InvalidExpression(format!(
                "expected 5 fields, got {}: {input:?}",
                fields.len()
            )));
        }
        Ok(Self {
            minute: CronField::parse(fields[0], MINUTE)?,
            hour: CronField::parse(fields[1], HOUR)?,
            day_of_month: CronField::parse(fields[2], DAY_OF_MONTH)?,
            month: CronField::parse(fields[3], MONTH)?,
            day_of_week: CronField::parse(fields[4], DAY_OF_WEEK)?,
            source: fields.join(" "),
        })
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl CronExpression {
    /// Whether `date` satisfies the day constraint.
    ///
    /// When both day fields are restricted, a date matches if *either*
    /// does (standard cron OR rule); when exactly one is restricted, only
    /// that one applies; two wildcards match everything.
    pub(crate) fn day_matches(&self, date: NaiveDate) -> bool {
        let dow = date.weekday().num_days_from_sunday();
        // 7 in the field means Sunday as well.
        let dow_match = self.day_of_week.matches(dow) || (dow == 0 && self.day_of_week.matches(7));
        let dom_match = self.day_of_month.matches(date.day());

        match (self.day_of_month.is_wildcard(), self.day_of_week.is_wildcard()) {
            (true, true) => true,
            (false, true) => dom_match,
            (true, false) => dow_match,
            (false, false) => dom_match || dow_match,
        }
    }

    /// Whether `at` (at minute resolution) satisfies this expression.
    pub fn matches(&self, at: DateTime<Utc>) -> bool {
        self.minute.matches(at.minute())
            && self.hour.matches(at.hour())
            && self.month.matches(at.month())
            && self.day_matches(at.date_naive())
    }
}
