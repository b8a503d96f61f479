//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw observations (`Sample`, `TimeSeries`)
//! - epoch provenance (`Epoch`, `EpochSource`, `PeakFit`)
//! - folding outputs (`FoldedSample`, `OutputCurve`)
//! - manifest rows and run configuration (`ObjectRecord`, `FoldConfig`)

pub mod types;

pub use types::*;
