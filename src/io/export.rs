//! Export the pivoted price table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! a `date` column followed by one column per series, newest rows first.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::DateRange;
use crate::error::AppError;
use crate::io::pivot::PivotTable;

/// `eia_prices_<start>_<end>.csv`, dates as `YYYYMMDD`.
pub fn default_file_name(range: &DateRange) -> String {
    format!(
        "eia_prices_{}_{}.csv",
        range.start.format("%Y%m%d"),
        range.end.format("%Y%m%d")
    )
}

/// Resolve an export target: a directory receives the default file name.
pub fn resolve_export_path(target: &Path, range: &DateRange) -> PathBuf {
    if target.is_dir() {
        target.join(default_file_name(range))
    } else {
        target.to_path_buf()
    }
}

/// Write the table as CSV into any writer.
pub fn write_pivot_csv<W: Write>(writer: W, table: &PivotTable) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(table.columns().len() + 1);
    header.push("date");
    header.extend(table.columns().iter().map(String::as_str));
    wtr.write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for row in table.rows() {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.date.format("%Y-%m-%d").to_string());
        record.extend(row.values.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
        wtr.write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Render the table as a CSV string.
pub fn pivot_csv_string(table: &PivotTable) -> Result<String, AppError> {
    let mut buf = Vec::new();
    write_pivot_csv(&mut buf, table)?;
    String::from_utf8(buf).map_err(|e| AppError::new(4, format!("Export CSV is not UTF-8: {e}")))
}

/// Write the table to `path`.
pub fn write_pivot_csv_file(path: &Path, table: &PivotTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_pivot_csv(file, table)
}
