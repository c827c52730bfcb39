//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - initializes logging
//! - fetches EIA series
//! - prints reports/plots
//! - writes optional exports

use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::info;

use crate::cli::{Command, FetchArgs};
use crate::data::SeriesClient;
use crate::data::registry::{self, DEFAULT_SELECTION};
use crate::domain::{DateRange, Window};
use crate::error::{AppError, SeriesError};
use crate::io::pivot::PivotTable;
use crate::logging::{LogTarget, LoggingConfig, init_logging};

pub mod session;

/// Entry point for the `eia` binary.
pub fn run() -> Result<(), AppError> {
    // We want `eia` and `eia -s WTI` to behave like `eia tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let logging = LoggingConfig::from_env();

    match cli.command {
        Command::List => {
            init_logging(&logging, LogTarget::Stderr)?;
            handle_list()
        }
        Command::Fetch(args) => {
            init_logging(&logging, LogTarget::Stderr)?;
            handle_fetch(args)
        }
        Command::Tui(args) => {
            init_logging(&logging, LogTarget::FileOnly)?;
            crate::tui::run(args)
        }
    }
}

fn handle_list() -> Result<(), AppError> {
    print!("{}", crate::report::format_series_list(registry::all()));
    Ok(())
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let client = SeriesClient::from_env()?;
    let range = resolve_range(args.start, args.end, args.window, Local::now().date_naive());
    let names = selected_series(&args.series);

    info!(series = ?names, %range, "fetching EIA series");
    let batch = client
        .fetch_many(&names, range.start, range.end, args.frequency.as_ref())
        .map_err(fetch_error)?;

    let frequency = args
        .frequency
        .as_ref()
        .map(|f| f.as_str().to_string())
        .unwrap_or_else(|| "series default".to_string());
    print!("{}", crate::report::format_run_header(&range, &frequency, &batch));
    print!("{}", crate::report::format_statistics(&batch));

    if args.plot {
        println!();
        print!("{}", crate::plot::render_series_plot(&batch, args.width, args.height));
    }

    let table = PivotTable::from_batch(&batch);
    if args.table {
        println!();
        print!("{}", crate::report::format_pivot_table(&table, args.rows));
    }

    if let Some(target) = &args.export {
        let path = crate::io::export::resolve_export_path(target, &range);
        crate::io::export::write_pivot_csv_file(&path, &table)?;
        println!("\nExported {} row(s) to {}", table.len(), path.display());
    }

    Ok(())
}

/// Requested series, or the default selection when none were given.
pub fn selected_series(requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        DEFAULT_SELECTION.iter().map(|s| s.to_string()).collect()
    } else {
        requested.to_vec()
    }
}

/// Resolve the fetch window.
///
/// `end` defaults to `today`; `start` defaults to `end` minus the window.
/// An inverted range is passed through unchanged.
pub fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    window: Window,
    today: NaiveDate,
) -> DateRange {
    let end = end.unwrap_or(today);
    let start = start.unwrap_or_else(|| window.ending(end).start);
    DateRange::new(start, end)
}

/// Convert a client error for display, adding a hint for rejected requests.
pub fn fetch_error(err: SeriesError) -> AppError {
    if err.is_invalid_request() {
        return AppError::new(
            err.exit_code(),
            format!(
                "{err}\nTip: the selected frequency may not be available for these series; try 'daily' or 'monthly'."
            ),
        );
    }
    err.into()
}

/// Rewrite argv so `eia` defaults to `eia tui`.
///
/// Rules:
/// - `eia`                      -> `eia tui`
/// - `eia -s WTI ...`           -> `eia tui -s WTI ...`
/// - `eia --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "list" | "fetch" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
