//! Structured schedule descriptions and normalization.
//!
//! A schedule can be given either as a raw five-field cron expression or as
//! a per-field description (a bare value, an exact set, or a
//! start/end/every range). Normalization turns the structured form into
//! the canonical expression string consumed by the parser.

use serde::{Deserialize, Serialize};

use crate::error::CronError;

/// One or more exact field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(u32),
    Many(Vec<u32>),
}

/// A structured description of a single cron field.
///
/// The three constructors are mutually exclusive; an inconsistent range
/// (e.g. `end` without `start` or `every`) is rejected at normalization
/// time rather than silently reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    /// A single literal value, e.g. `5`.
    Value(u32),
    /// An explicit value or set of values, kept in the order given.
    Exact { exact: OneOrMany },
    /// A start/end/every range; parts are individually optional but
    /// validated as a consistent combination.
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        every: Option<u32>,
    },
}

impl FieldSpec {
    /// Render this description as one canonical cron field string.
    pub fn to_field_string(&self) -> Result<String, CronError> {
        match self {
            FieldSpec::Value(value) => Ok(value.to_string()),
            FieldSpec::Exact {
                exact: OneOrMany::One(value),
            } => Ok(value.to_string()),
            FieldSpec::Exact {
                exact: OneOrMany::Many(values),
            } => Ok(values
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",")),
            FieldSpec::Range { start, end, every } => match (start, end, every) {
                (Some(start), Some(end), Some(every)) => Ok(format!("{start}-{end}/{every}")),
                (Some(start), Some(end), None) => Ok(format!("{start}-{end}")),
                (Some(start), None, Some(every)) => Ok(format!("{start}/{every}")),
                (Some(start), None, None) => Ok(format!("{start}/1")),
                (None, None, Some(every)) => Ok(format!("*/{every}")),
                _ => Err(CronError::InvalidField(format!(
                    "inconsistent range: start={start:?} end={end:?} every={every:?}"
                ))),
            },
        }
    }
}

/// Render an optional field description; an absent field means "any".
pub(crate) fn normalize_field(spec: Option<&FieldSpec>) -> Result<String, CronError> {
    match spec {
        None => Ok("*".to_string()),
        Some(spec) => spec.to_field_string(),
    }
}

/// A structured five-field schedule. Missing fields normalize to `*`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<FieldSpec>,
}

impl ScheduleSpec {
    /// Compose the five normalized fields into a canonical expression.
    pub fn to_expression(&self) -> Result<String, CronError> {
        let fields = [
            normalize_field(self.minute.as_ref())?,
            normalize_field(self.hour.as_ref())?,
            normalize_field(self.day_of_month.as_ref())?,
            normalize_field(self.month.as_ref())?,
            normalize_field(self.day_of_week.as_ref())?,
        ];
        Ok(fields.join(" "))
    }
}

/// A schedule as accepted at registration: either an already-canonical
/// expression string (passed through unchanged) or a structured spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CronSchedule {
    Expression(String),
    Spec(ScheduleSpec),
}

impl CronSchedule {
    /// The canonical expression string for this schedule.
    pub fn to_expression(&self) -> Result<String, CronError> {
        match self {
            CronSchedule::Expression(expr) => Ok(expr.clone()),
            CronSchedule::Spec(spec) => spec.to_expression(),
        }
    }
}

impl From<&str> for CronSchedule {
    fn from(expr: &str) -> Self {
        CronSchedule::Expression(expr.to_string())
    }
}

impl From<String> for CronSchedule {
    fn from(expr: String) -> Self {
        CronSchedule::Expression(expr)
    }
}

impl From<ScheduleSpec> for CronSchedule {
    fn from(spec: ScheduleSpec) -> Self {
        CronSchedule::Spec(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: Option<u32>, end: Option<u32>, every: Option<u32>) -> FieldSpec {
        FieldSpec::Range { start, end, every }
    }

    #[test]
    fn test_absent_field_is_wildcard() {
        assert_eq!(normalize_field(None).unwrap(), "*");
    }

    #[test]
    fn test_bare_value() {
        assert_eq!(FieldSpec::Value(5).to_field_string().unwrap(), "5");
    }

    #[test]
    fn test_exact_single() {
        let spec = FieldSpec::Exact {
            exact: OneOrMany::One(7),
        };
        assert_eq!(spec.to_field_string().unwrap(), "7");
    }

    #[test]
    fn test_exact_set_preserves_order() {
        let spec = FieldSpec::Exact {
            exact: OneOrMany::Many(vec![1, 2, 3]),
        };
        assert_eq!(spec.to_field_string().unwrap(), "1,2,3");

        // No implied sorting or deduplication.
        let spec = FieldSpec::Exact {
            exact: OneOrMany::Many(vec![30, 10, 10]),
        };
        assert_eq!(spec.to_field_string().unwrap(), "30,10,10");
    }

    #[test]
    fn test_range_combinations() {
        assert_eq!(
            range(Some(1), Some(5), Some(2)).to_field_string().unwrap(),
            "1-5/2"
        );
        assert_eq!(
            range(Some(1), Some(5), None).to_field_string().unwrap(),
            "1-5"
        );
        assert_eq!(
            range(Some(3), None, Some(4)).to_field_string().unwrap(),
            "3/4"
        );
        assert_eq!(range(Some(3), None, None).to_field_string().unwrap(), "3/1");
        assert_eq!(
            range(None, None, Some(15)).to_field_string().unwrap(),
            "*/15"
        );
    }

    #[test]
    fn test_invalid_range_combinations() {
        assert!(matches!(
            range(None, Some(5), None).to_field_string(),
            Err(CronError::InvalidField(_))
        ));
        assert!(matches!(
            range(None, Some(5), Some(2)).to_field_string(),
            Err(CronError::InvalidField(_))
        ));
        assert!(matches!(
            range(None, None, None).to_field_string(),
            Err(CronError::InvalidField(_))
        ));
    }

    #[test]
    fn test_spec_to_expression() {
        let spec = ScheduleSpec {
            minute: Some(FieldSpec::Value(0)),
            hour: Some(FieldSpec::Value(0)),
            ..Default::default()
        };
        assert_eq!(spec.to_expression().unwrap(), "0 0 * * *");
    }

    #[test]
    fn test_empty_spec_is_all_wildcards() {
        assert_eq!(ScheduleSpec::default().to_expression().unwrap(), "* * * * *");
    }

    #[test]
    fn test_expression_passes_through() {
        let schedule = CronSchedule::from("*/10 2 * * 1");
        assert_eq!(schedule.to_expression().unwrap(), "*/10 2 * * 1");
    }

    #[test]
    fn test_deserialize_structured_schedule() {
        let spec: ScheduleSpec = serde_json::from_str(
            r#"{"minute": {"every": 15}, "hour": {"exact": [2, 14]}, "dayOfWeek": 1}"#,
        )
        .unwrap();
        assert_eq!(spec.to_expression().unwrap(), "*/15 2,14 * * 1");
    }

    #[test]
    fn test_deserialize_schedule_union() {
        let schedule: CronSchedule = serde_json::from_str(r#""0 0 * * *""#).unwrap();
        assert_eq!(schedule.to_expression().unwrap(), "0 0 * * *");

        let schedule: CronSchedule =
            serde_json::from_str(r#"{"minute": {"start": 1, "end": 5, "every": 2}}"#).unwrap();
        assert_eq!(schedule.to_expression().unwrap(), "1-5/2 * * * *");
    }
}
