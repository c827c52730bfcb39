//! Shared domain types.
//!
//! These types are intentionally small and serializable so they can be:
//!
//! - produced by the EIA client
//! - consumed by the statistics, pivot, plot and TUI code
//! - exported to CSV/JSON

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Sampling cadence of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Annual,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Annual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Annual => "annual",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frequency as sent to the upstream API.
///
/// Values outside the recognized set are kept verbatim; only the upstream
/// decides whether they are valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrequencyParam {
    Known(Frequency),
    Raw(String),
}

impl FrequencyParam {
    pub fn as_str(&self) -> &str {
        match self {
            FrequencyParam::Known(f) => f.as_str(),
            FrequencyParam::Raw(s) => s,
        }
    }
}

impl From<Frequency> for FrequencyParam {
    fn from(f: Frequency) -> Self {
        FrequencyParam::Known(f)
    }
}

impl FromStr for FrequencyParam {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match Frequency::parse(trimmed) {
            Some(f) => FrequencyParam::Known(f),
            None => FrequencyParam::Raw(trimmed.to_string()),
        })
    }
}

impl fmt::Display for FrequencyParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static registry entry describing one upstream series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesDefinition {
    /// Logical name; the registry key.
    pub name: &'static str,
    /// Upstream data route, e.g. `petroleum/pri/spt`.
    pub route: &'static str,
    /// Upstream series facet value, e.g. `RWTC`.
    pub series_id: &'static str,
    pub frequency: Frequency,
    pub description: &'static str,
}

/// One observation. `value` is `NaN` when the upstream value was not numeric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl TimePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_nan()
    }
}

/// A normalized series: ascending by date, one point per date.
///
/// An empty result is a successful "no data in range" answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesResult {
    points: Vec<TimePoint>,
}

impl SeriesResult {
    pub const COLUMNS: [&'static str; 2] = ["date", "value"];

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from points that already satisfy the ordering invariant.
    pub(crate) fn from_normalized(points: Vec<TimePoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self { points }
    }

    pub fn columns(&self) -> [&'static str; 2] {
        Self::COLUMNS
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

/// Results of a multi-series fetch, keyed by series name in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesBatch {
    entries: Vec<(String, SeriesResult)>,
}

impl SeriesBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the result for `name`; replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, result: SeriesResult) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = result,
            None => self.entries.push((name, result)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SeriesResult> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeriesResult)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when at least one series has a row.
    pub fn has_data(&self) -> bool {
        self.entries.iter().any(|(_, r)| !r.is_empty())
    }
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

/// Quick-select lookback windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum Window {
    #[value(name = "7d")]
    Last7Days,
    #[value(name = "30d")]
    Last30Days,
    #[default]
    #[value(name = "90d")]
    Last90Days,
    #[value(name = "6m")]
    Last6Months,
    #[value(name = "1y")]
    LastYear,
}

impl Window {
    pub const ALL: [Window; 5] = [
        Window::Last7Days,
        Window::Last30Days,
        Window::Last90Days,
        Window::Last6Months,
        Window::LastYear,
    ];

    pub fn days(self) -> i64 {
        match self {
            Window::Last7Days => 7,
            Window::Last30Days => 30,
            Window::Last90Days => 90,
            Window::Last6Months => 180,
            Window::LastYear => 365,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Window::Last7Days => "Last 7 Days",
            Window::Last30Days => "Last 30 Days",
            Window::Last90Days => "Last 90 Days",
            Window::Last6Months => "Last 6 Months",
            Window::LastYear => "Last Year",
        }
    }

    pub fn ending(self, end: NaiveDate) -> DateRange {
        DateRange::new(end - Duration::days(self.days()), end)
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|w| *w == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|w| *w == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}
