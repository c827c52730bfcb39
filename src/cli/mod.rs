//! Command-line parsing for the EIA price client.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the client and presentation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{Frequency, FrequencyParam, Window};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "eia", version, about = "EIA energy price series client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every series the client knows about.
    List,
    /// Fetch series, print statistics, and optionally plot/tabulate/export.
    Fetch(FetchArgs),
    /// Launch the interactive TUI.
    Tui(TuiArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// Series to fetch (repeatable). Defaults to WTI and Brent.
    #[arg(short = 's', long = "series", value_name = "NAME")]
    pub series: Vec<String>,

    /// First date of the window (YYYY-MM-DD). Defaults to `end - window`.
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last date of the window (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Lookback window used when `--start` is omitted.
    #[arg(short = 'w', long, value_enum, default_value_t = Window::Last90Days)]
    pub window: Window,

    /// Sampling frequency sent upstream (daily, weekly, monthly, annual, ...).
    ///
    /// Defaults to each series' own frequency.
    #[arg(short = 'f', long, value_name = "FREQ")]
    pub frequency: Option<FrequencyParam>,

    /// Render an ASCII plot of the fetched series.
    #[arg(long)]
    pub plot: bool,

    /// Print the price table (dates × series, newest first).
    #[arg(long)]
    pub table: bool,

    /// Maximum rows shown by `--table`.
    #[arg(long, default_value_t = 20)]
    pub rows: usize,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the price table to CSV (a directory receives the default file name).
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Series selected at startup (repeatable). Defaults to WTI and Brent.
    #[arg(short = 's', long = "series", value_name = "NAME")]
    pub series: Vec<String>,

    /// Initial lookback window.
    #[arg(short = 'w', long, value_enum, default_value_t = Window::Last90Days)]
    pub window: Window,

    /// Initial frequency.
    #[arg(short = 'f', long, value_enum, default_value_t = Frequency::Daily)]
    pub frequency: Frequency,
}
