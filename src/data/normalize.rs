//! Decoding and normalization of EIA v2 `data` responses.
//!
//! Upstream shape (only the fields we read):
//!
//! ```json
//! { "response": { "total": "123", "data": [ { "period": "2024-01-02", "value": "71.65" } ] } }
//! ```
//!
//! Normalized output is ascending by date with one point per date; when the
//! upstream repeats a period, the first record seen wins.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{SeriesResult, TimePoint};
use crate::error::TransientFailure;

#[derive(Debug, Default, Deserialize)]
struct Record {
    #[serde(default)]
    period: Option<Value>,
    #[serde(default)]
    value: Option<Value>,
}

/// A decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub result: SeriesResult,
    /// Row count the upstream reports for the whole query, if present.
    pub total: Option<u64>,
    /// Records dropped because their period could not be read as a date.
    pub skipped: usize,
}

/// Decode a successful response body.
///
/// Anything that parses as JSON but lacks a `response.data` array is an
/// empty result. Only a body that is not JSON at all is an error.
pub fn decode_page(body: &str) -> Result<Page, TransientFailure> {
    let envelope: Value = serde_json::from_str(body).map_err(|e| TransientFailure::Malformed(e.to_string()))?;

    let Some(response) = envelope.get("response").filter(|r| r.is_object()) else {
        return Ok(Page::empty());
    };
    let total = response.get("total").and_then(parse_total);
    let Some(Value::Array(rows)) = response.get("data") else {
        return Ok(Page { total, ..Page::empty() });
    };
    if rows.is_empty() {
        return Ok(Page { total, ..Page::empty() });
    }

    let mut points = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        // A row that is not an object has no readable period either.
        let record = Record::deserialize(row).unwrap_or_default();
        let period = record.period.as_ref().and_then(value_as_text);
        match period.as_deref().and_then(parse_period) {
            Some(date) => points.push(TimePoint::new(date, coerce_value(record.value.as_ref()))),
            None => {
                skipped += 1;
                warn!(period = ?record.period, "dropping EIA record with unreadable period");
            }
        }
    }

    Ok(Page {
        result: normalize(points),
        total,
        skipped,
    })
}

impl Page {
    fn empty() -> Self {
        Self {
            result: SeriesResult::empty(),
            total: None,
            skipped: 0,
        }
    }
}

/// Sort ascending by date and keep the first point seen for each date.
pub fn normalize(mut points: Vec<TimePoint>) -> SeriesResult {
    // Stable sort keeps upstream order among equal dates, so dedup keeps the first.
    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    SeriesResult::from_normalized(points)
}

/// Parse an EIA period: `YYYY-MM-DD`, `YYYY-MM`, `YYYY` or `YYYY-Qn`.
///
/// Coarser periods map to their first day.
pub fn parse_period(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    let mut parts = raw.splitn(2, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    match parts.next() {
        None => NaiveDate::from_ymd_opt(year, 1, 1),
        Some(rest) => {
            let month = match rest.strip_prefix(['Q', 'q']) {
                Some(q) => {
                    let quarter: u32 = q.parse().ok()?;
                    if !(1..=4).contains(&quarter) {
                        return None;
                    }
                    (quarter - 1) * 3 + 1
                }
                None => {
                    if rest.len() > 2 {
                        return None;
                    }
                    rest.parse().ok()?
                }
            };
            NaiveDate::from_ymd_opt(year, month, 1)
        }
    }
}

/// Coerce an upstream value to a number; anything non-numeric becomes `NaN`.
pub fn coerce_value(raw: Option<&Value>) -> f64 {
    match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn value_as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_total(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn empty_record_list_is_an_empty_result() {
        let page = decode_page(r#"{"response":{"data":[],"total":0}}"#).unwrap();
        assert!(page.result.is_empty());
        assert_eq!(page.result.columns(), ["date", "value"]);
        assert_eq!(page.total, Some(0));
    }

    #[test]
    fn missing_envelope_is_an_empty_result() {
        for body in [r#"{}"#, r#"{"response":{}}"#, r#"{"response":null}"#, r#"{"warnings":[]}"#] {
            let page = decode_page(body).unwrap();
            assert!(page.result.is_empty(), "body {body} should be empty");
        }
    }

    #[test]
    fn wrongly_shaped_envelope_is_an_empty_result() {
        for body in [
            r#"{"response":{"data":{}}}"#,
            r#"{"response":{"data":"none"}}"#,
            r#"{"response":"x"}"#,
            r#"{"response":[]}"#,
            "[]",
            "42",
        ] {
            let page = decode_page(body).unwrap();
            assert!(page.result.is_empty(), "body {body} should be empty");
        }
    }

    #[test]
    fn non_object_rows_are_skipped() {
        let page = decode_page(r#"{"response":{"data":[7,{"period":"2024-01-01","value":"1"}]}}"#).unwrap();
        assert_eq!(page.result.len(), 1);
        assert_eq!(page.skipped, 1);
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = decode_page("<html>gateway</html>").unwrap_err();
        assert!(matches!(err, TransientFailure::Malformed(_)));
    }

    #[test]
    fn non_numeric_values_become_nan_and_rows_are_kept() {
        let body = r#"{"response":{"data":[
            {"period":"2024-01-01","value":"75.0"},
            {"period":"2024-01-02","value":"76.5"},
            {"period":"2024-01-03","value":"N/A"},
            {"period":"2024-01-04","value":null},
            {"period":"2024-01-05","value":78.25}
        ]}}"#;
        let page = decode_page(body).unwrap();
        let points = page.result.points();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0].value, 75.0);
        assert!(points[2].is_missing());
        assert!(points[3].is_missing());
        assert_eq!(points[4].value, 78.25);
    }

    #[test]
    fn duplicates_keep_first_upstream_value_and_sort_ascending() {
        let body = r#"{"response":{"data":[
            {"period":"2024-01-03","value":"77"},
            {"period":"2024-01-01","value":"75.0"},
            {"period":"2024-01-02","value":"76"},
            {"period":"2024-01-01","value":"75.5"}
        ]}}"#;
        let page = decode_page(body).unwrap();
        let got: Vec<(NaiveDate, f64)> = page.result.points().iter().map(|p| (p.date, p.value)).collect();
        assert_eq!(
            got,
            vec![(d(2024, 1, 1), 75.0), (d(2024, 1, 2), 76.0), (d(2024, 1, 3), 77.0)]
        );
    }

    #[test]
    fn coarse_periods_map_to_first_day() {
        assert_eq!(parse_period("2024-03-15"), Some(d(2024, 3, 15)));
        assert_eq!(parse_period("2024-03"), Some(d(2024, 3, 1)));
        assert_eq!(parse_period("2024"), Some(d(2024, 1, 1)));
        assert_eq!(parse_period("2024-Q3"), Some(d(2024, 7, 1)));
        assert_eq!(parse_period("2024-Q5"), None);
        assert_eq!(parse_period("2024-13"), None);
        assert_eq!(parse_period("yesterday"), None);
    }

    #[test]
    fn unreadable_periods_are_dropped_and_counted() {
        let body = r#"{"response":{"total":"3","data":[
            {"period":"2024-01-01","value":"1"},
            {"period":"soon","value":"2"},
            {"value":"3"}
        ]}}"#;
        let page = decode_page(body).unwrap();
        assert_eq!(page.result.len(), 1);
        assert_eq!(page.skipped, 2);
        assert_eq!(page.total, Some(3));
    }

    #[test]
    fn numeric_annual_period_is_accepted() {
        let page = decode_page(r#"{"response":{"data":[{"period":2023,"value":"2.5"}]}}"#).unwrap();
        assert_eq!(page.result.first_date(), Some(d(2023, 1, 1)));
    }
}
