//! Phase Folder / Normalizer.
//!
//! Turns `(TimeSeries, Period, Epoch)` into the canonical `OutputCurve`:
//! unit-interval phases, min–max normalized flux, ascending stable phase order.

pub mod curve;
pub mod normalize;
pub mod phase;

pub use curve::*;
pub use normalize::*;
pub use phase::*;
