//! `lc-fold` library crate.
//!
//! The binary (`lcfold`) is a thin wrapper around this library so that:
//!
//! - the epoch estimator and folder are testable without spawning processes
//! - the engine (`epoch`, `fold`) is usable on in-memory series
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod epoch;
pub mod error;
pub mod fold;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
