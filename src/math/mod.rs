//! Mathematical utilities: robust statistics, damped least squares, and the
//! Levenberg–Marquardt driver.

pub mod lm;
pub mod ols;
pub mod stats;

pub use lm::*;
pub use ols::*;
pub use stats::*;
