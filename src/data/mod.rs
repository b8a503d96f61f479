//! Synthetic data generation.
//!
//! Produces manifests and light curves with known eclipse epochs, for demos and
//! for checking the epoch estimator end to end.

pub mod synth;

pub use synth::*;
