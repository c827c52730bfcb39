//! Input/output helpers.
//!
//! - wide table pivot (`pivot`)
//! - CSV export (`export`)

pub mod export;
pub mod pivot;

pub use export::*;
pub use pivot::*;
