//! Input/output helpers.
//!
//! - object manifest ingest (`manifest`)
//! - light-curve discovery + ingest (`lightcurve`)
//! - folded curve CSV read/write (`curve`)
//! - batch report JSON export (`export`)
//! - calendar → Julian Date conversion (`dates`)

pub mod curve;
pub mod dates;
pub mod export;
pub mod lightcurve;
pub mod manifest;
pub mod table;

pub use curve::*;
pub use dates::*;
pub use export::*;
pub use lightcurve::*;
pub use manifest::*;
pub use table::RowError;
