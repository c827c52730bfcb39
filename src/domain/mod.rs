//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - series metadata (`Frequency`, `FrequencyParam`, `SeriesDefinition`)
//! - normalized observations (`TimePoint`, `SeriesResult`, `SeriesBatch`)
//! - date windows (`DateRange`, `Window`)

pub mod types;

pub use types::*;
