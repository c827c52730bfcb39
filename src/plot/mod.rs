//! Terminal plots for the `fetch --plot` output.

pub mod ascii;

pub use ascii::render_series_plot;
