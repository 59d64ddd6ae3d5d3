//! Input schema for a report run.
//!
//! The payload is produced by the statistics service and is trusted for its
//! overall shape but not for individual field values. Every field carries an
//! explicit default, and the lenient deserializers in [`lenient`] turn
//! malformed scalars into those defaults instead of failing the whole run.

use std::io::Read;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ReportError;

/// Exporter identity used when the payload does not name one.
pub const DEFAULT_ACCOUNT_NAME: &str = "Admin";

/// Filter label shown when no semester filter is active.
pub const ALL_SEMESTERS: &str = "All Semesters";

/// Filter label shown when no year filter is active.
pub const ALL_YEARS: &str = "All Years";

/// Label used for records that carry no name at all.
pub const UNKNOWN_NAME: &str = "Unknown";

/// A display label as found in the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Label {
    /// A string value, kept verbatim.
    Text(String),
    /// Any non-string, non-null JSON value.
    NotText,
}

impl Label {
    /// Returns the string content, if the label was a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Label::Text(text) => Some(text),
            Label::NotText => None,
        }
    }
}

/// Top-level payload handed to the generator.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Payload {
    #[serde(deserialize_with = "lenient::optional_string")]
    pub account_name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub semester: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub year: Option<String>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub summary: Summary,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub departments: Vec<EntryRecord>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub advisers: Vec<EntryRecord>,
}

/// Pre-aggregated totals and "most active" winners.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Summary {
    #[serde(deserialize_with = "lenient::count")]
    pub total_research: i64,
    /// Department name or comma-joined tie list.
    #[serde(deserialize_with = "lenient::label")]
    pub most_active_department: Option<Label>,
    /// Adviser name or comma-joined tie list.
    #[serde(deserialize_with = "lenient::label")]
    pub most_active_adviser: Option<Label>,
}

/// One department or adviser row.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EntryRecord {
    #[serde(deserialize_with = "lenient::label")]
    pub name: Option<Label>,
    #[serde(deserialize_with = "lenient::count")]
    pub count: i64,
    /// `None` when the field is absent or could not be read as a number.
    #[serde(deserialize_with = "lenient::percentage")]
    pub percentage: Option<f64>,
}

impl Payload {
    /// Parses a payload from raw JSON text.
    ///
    /// Empty or whitespace-only input is treated as `{}`.
    pub fn from_json_str(input: &str) -> Result<Self, ReportError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_str(input)?;
        if !value.is_object() {
            return Err(ReportError::PayloadShape {
                found: json_kind(&value),
            });
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Reads all of `reader` and parses it with [`Payload::from_json_str`].
    pub fn from_reader(mut reader: impl Read) -> Result<Self, ReportError> {
        let mut input = String::new();
        reader
            .read_to_string(&mut input)
            .map_err(ReportError::Input)?;
        Self::from_json_str(&input)
    }

    /// Exporter identity printed in the footers.
    pub fn account_name(&self) -> &str {
        non_blank(self.account_name.as_deref()).unwrap_or(DEFAULT_ACCOUNT_NAME)
    }

    /// Active semester filter, or the "All Semesters" sentinel.
    pub fn semester_label(&self) -> &str {
        non_blank(self.semester.as_deref()).unwrap_or(ALL_SEMESTERS)
    }

    /// Active year filter, or the "All Years" sentinel.
    pub fn year_label(&self) -> &str {
        non_blank(self.year.as_deref()).unwrap_or(ALL_YEARS)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Field deserializers that recover from bad values instead of failing.
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::Label;

    /// Reads a number-like value as a finite `f64`.
    ///
    /// Numbers and numeric strings (surrounding whitespace allowed) are
    /// accepted. Everything else, including NaN and infinities, is `None`.
    pub fn parse_percentage(value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|value| value.is_finite())
    }

    /// Reads an integer-like value, falling back to `0`.
    ///
    /// Floats and numeric strings are truncated toward zero.
    pub fn parse_count(value: &Value) -> i64 {
        match value {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_u64().map(|value| i64::try_from(value).unwrap_or(i64::MAX)))
                .or_else(|| number.as_f64().and_then(truncate))
                .unwrap_or(0),
            Value::String(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(truncate))
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    fn truncate(value: f64) -> Option<i64> {
        value.is_finite().then(|| value.trunc() as i64)
    }

    pub(crate) fn percentage<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(parse_percentage(&value))
    }

    pub(crate) fn count<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(parse_count(&value))
    }

    pub(crate) fn label<'de, D>(deserializer: D) -> Result<Option<Label>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            Value::String(text) => Some(Label::Text(text)),
            _ => Some(Label::NotText),
        })
    }

    /// Strings only; any other value counts as absent.
    pub(crate) fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Some(text),
            _ => None,
        })
    }

    /// Strings, numbers and booleans, the latter two stringified.
    pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        })
    }

    pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_input_is_an_empty_object() {
        let payload = Payload::from_json_str("  \n").expect("parse succeeds");
        assert_eq!(payload, Payload::default());
        assert_eq!(payload.account_name(), DEFAULT_ACCOUNT_NAME);
        assert_eq!(payload.semester_label(), ALL_SEMESTERS);
        assert_eq!(payload.year_label(), ALL_YEARS);
    }

    #[test]
    fn rejects_invalid_json() {
        let err = Payload::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ReportError::Payload(_)));
    }

    #[test]
    fn reads_payload_from_a_reader() {
        let payload = Payload::from_reader(r#"{"account_name": "Registrar"}"#.as_bytes())
            .expect("parse succeeds");
        assert_eq!(payload.account_name(), "Registrar");
    }

    #[test]
    fn unreadable_input_is_reported_as_a_read_failure() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed"))
            }
        }

        let err = Payload::from_reader(Broken).unwrap_err();
        assert!(matches!(err, ReportError::Input(_)));
        assert_eq!(err.to_string(), "failed to read payload: stdin closed");
    }

    #[test]
    fn non_utf8_input_is_a_read_failure() {
        let err = Payload::from_reader(&[0xff, 0xfe, b'{'][..]).unwrap_err();
        assert!(matches!(err, ReportError::Input(_)));
    }

    #[test]
    fn rejects_non_object_top_level() {
        let err = Payload::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, ReportError::PayloadShape { found: "an array" }));
    }

    #[test]
    fn reads_a_full_payload() {
        let payload = Payload::from_json_str(
            r#"{
                "account_name": "JUAN DELA CRUZ",
                "semester": " 1st Semester ",
                "year": 2024,
                "summary": {
                    "totalResearch": 12,
                    "totalViews": 340,
                    "mostActiveDepartment": "Nursing",
                    "mostActiveAdviser": "maria santos"
                },
                "departments": [{"name": "Nursing", "count": 7, "percentage": "58.33"}],
                "advisers": [{"name": "maria santos", "count": 4, "percentage": 33.33}]
            }"#,
        )
        .expect("parse succeeds");

        assert_eq!(payload.account_name(), "JUAN DELA CRUZ");
        assert_eq!(payload.semester_label(), "1st Semester");
        assert_eq!(payload.year_label(), "2024");
        assert_eq!(payload.summary.total_research, 12);
        assert_eq!(
            payload.summary.most_active_department,
            Some(Label::Text("Nursing".into()))
        );
        assert_eq!(payload.departments[0].percentage, Some(58.33));
        assert_eq!(payload.advisers[0].count, 4);
    }

    #[test]
    fn blank_filters_use_sentinels() {
        let payload =
            Payload::from_json_str(r#"{"semester": "   ", "year": "", "account_name": null}"#)
                .expect("parse succeeds");
        assert_eq!(payload.semester_label(), ALL_SEMESTERS);
        assert_eq!(payload.year_label(), ALL_YEARS);
        assert_eq!(payload.account_name(), DEFAULT_ACCOUNT_NAME);
    }

    #[test]
    fn null_sections_fall_back_to_defaults() {
        let payload = Payload::from_json_str(
            r#"{"summary": null, "departments": null, "advisers": null}"#,
        )
        .expect("parse succeeds");
        assert_eq!(payload.summary, Summary::default());
        assert!(payload.departments.is_empty());
        assert!(payload.advisers.is_empty());
    }

    #[test]
    fn malformed_record_fields_recover() {
        let payload = Payload::from_json_str(
            r#"{"departments": [
                {"name": 42, "count": "x", "percentage": "N/A"},
                {"count": 3.9, "percentage": [1, 2]},
                {"name": null, "count": "5", "percentage": null}
            ]}"#,
        )
        .expect("parse succeeds");

        let rows = &payload.departments;
        assert_eq!(rows[0].name, Some(Label::NotText));
        assert_eq!(rows[0].count, 0);
        assert_eq!(rows[0].percentage, None);
        assert_eq!(rows[1].name, None);
        assert_eq!(rows[1].count, 3);
        assert_eq!(rows[1].percentage, None);
        assert_eq!(rows[2].name, None);
        assert_eq!(rows[2].count, 5);
    }

    #[test]
    fn structural_defects_are_fatal() {
        let err = Payload::from_json_str(r#"{"departments": "Nursing"}"#).unwrap_err();
        assert!(matches!(err, ReportError::Payload(_)));
    }

    #[test]
    fn percentage_parsing_rejects_non_numbers() {
        assert_eq!(lenient::parse_percentage(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(lenient::parse_percentage(&json!(7)), Some(7.0));
        assert_eq!(lenient::parse_percentage(&json!("N/A")), None);
        assert_eq!(lenient::parse_percentage(&json!(null)), None);
        assert_eq!(lenient::parse_percentage(&json!(true)), None);
        assert_eq!(lenient::parse_percentage(&json!({"v": 1})), None);
        assert_eq!(lenient::parse_percentage(&json!("inf")), None);
    }
}
