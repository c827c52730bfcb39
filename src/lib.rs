//! `eia-prices` library crate.
//!
//! The binary (`eia`) is a thin wrapper around this library so that:
//!
//! - the client is testable without spawning processes
//! - the series client can be embedded in other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod tui;

pub use data::{ClientConfig, SeriesClient};
pub use domain::{Frequency, FrequencyParam, SeriesBatch, SeriesResult, TimePoint};
pub use error::SeriesError;
