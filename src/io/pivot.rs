//! Wide "dates × series" table built from long `(date, series, value)` rows.
//!
//! - rows are sorted newest first
//! - columns appear in the order series are first seen
//! - for a repeated `(date, series)` pair the first numeric value wins
//! - `NaN` values count as missing

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::domain::SeriesBatch;

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub date: NaiveDate,
    /// One cell per column; `None` where the series has no value on this date.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotTable {
    columns: Vec<String>,
    rows: Vec<PivotRow>,
}

impl PivotTable {
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, S, f64)>,
        S: AsRef<str>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut by_date: BTreeMap<NaiveDate, HashMap<usize, f64>> = BTreeMap::new();

        for (date, series, value) in rows {
            if value.is_nan() {
                continue;
            }
            let series = series.as_ref();
            let col = match columns.iter().position(|c| c == series) {
                Some(i) => i,
                None => {
                    columns.push(series.to_string());
                    columns.len() - 1
                }
            };
            by_date.entry(date).or_default().entry(col).or_insert(value);
        }

        let rows = by_date
            .into_iter()
            .rev()
            .map(|(date, cells)| PivotRow {
                date,
                values: (0..columns.len()).map(|i| cells.get(&i).copied()).collect(),
            })
            .collect();

        Self { columns, rows }
    }

    pub fn from_batch(batch: &SeriesBatch) -> Self {
        Self::from_rows(
            batch
                .iter()
                .flat_map(|(name, result)| result.points().iter().map(move |p| (p.date, name, p.value))),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[PivotRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
