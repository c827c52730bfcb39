//! Formatted terminal output: registry listing, statistics, and the price table.
//!
//! We keep formatting code in one place so:
//! - the client and statistics code stays clean and testable
//! - output changes are localized

use crate::domain::{DateRange, SeriesBatch, SeriesDefinition};
use crate::io::pivot::PivotTable;
use crate::report::stats::SeriesStats;

/// Format the registry as a table.
pub fn format_series_list(defs: &[SeriesDefinition]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<34} {:<8} {:<20} {:<26} {}",
            "name", "freq", "route", "series", "description"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<34} {:-<8} {:-<20} {:-<26} {:-<11}", "", "", "", "", "").trim_end());
    out.push('\n');

    for def in defs {
        out.push_str(
            format!(
                "{:<34} {:<8} {:<20} {:<26} {}",
                def.name,
                def.frequency.as_str(),
                def.route,
                def.series_id,
                def.description
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Header printed above a fetch report.
pub fn format_run_header(range: &DateRange, frequency: &str, batch: &SeriesBatch) -> String {
    let rows: usize = batch.iter().map(|(_, r)| r.len()).sum();
    format!(
        "=== eia - EIA energy prices ===\nWindow: {range} | frequency: {frequency} | series: {} | rows: {rows}\n",
        batch.len()
    )
}

/// Statistics block for every series in the batch.
pub fn format_statistics(batch: &SeriesBatch) -> String {
    let mut out = String::new();
    for (name, result) in batch.iter() {
        out.push_str(&format!("\n### {name}\n"));
        match SeriesStats::from_result(result) {
            None => out.push_str(&format!("No data available for {name}\n")),
            Some(stats) => {
                out.push_str(&format!("  Current Price : {}\n", fmt_price(stats.current)));
                out.push_str(&format!(
                    "  Period Change : {} ({})\n",
                    fmt_signed_price(stats.change),
                    fmt_change_pct(stats.change_pct)
                ));
                out.push_str(&format!("  Minimum       : {}\n", fmt_price(stats.min)));
                out.push_str(&format!("  Maximum       : {}\n", fmt_price(stats.max)));
                out.push_str(&format!("  Average       : {}\n", fmt_price(stats.mean)));
                out.push_str(&format!("  Observations  : {}\n", stats.observations));
                if let (Some(first), Some(last)) = (result.first_date(), result.last_date()) {
                    out.push_str(&format!("  Period        : {first} to {last}\n"));
                }
            }
        }
    }
    out
}

/// Fixed-width price table, at most `max_rows` rows.
pub fn format_pivot_table(table: &PivotTable, max_rows: usize) -> String {
    if table.is_empty() {
        return "No data available to display.\n".to_string();
    }

    let widths: Vec<usize> = table
        .columns()
        .iter()
        .map(|c| c.chars().count().clamp(10, 24))
        .collect();

    let mut out = String::new();
    let mut header = format!("{:<10}", "date");
    for (col, w) in table.columns().iter().zip(&widths) {
        header.push_str(&format!(" {:>w$}", truncate(col, *w), w = *w));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    for row in table.rows().iter().take(max_rows) {
        let mut line = format!("{:<10}", row.date.format("%Y-%m-%d"));
        for (v, w) in row.values.iter().zip(&widths) {
            let cell = v.map(fmt_price).unwrap_or_else(|| "-".to_string());
            line.push_str(&format!(" {:>w$}", cell, w = *w));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    if table.len() > max_rows {
        out.push_str(&format!("... {} more row(s)\n", table.len() - max_rows));
    }
    out
}

pub fn fmt_price(v: f64) -> String {
    if v.is_nan() {
        return "N/A".to_string();
    }
    format!("${v:.2}")
}

pub fn fmt_signed_price(v: f64) -> String {
    if v < 0.0 {
        format!("-${:.2}", v.abs())
    } else {
        format!("+${v:.2}")
    }
}

pub fn fmt_change_pct(pct: Option<f64>) -> String {
    match pct {
        Some(p) => format!("{p:+.2}%"),
        None => "N/A".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
