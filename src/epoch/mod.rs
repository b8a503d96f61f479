//! Epoch Estimator.
//!
//! Responsibilities:
//!
//! - pass through a finite catalog epoch untouched
//! - otherwise select an eclipse window and fit a Gaussian peak to the
//!   inverted flux (bounded Levenberg–Marquardt)

pub mod estimator;
pub mod window;

pub use estimator::*;
pub use window::*;
