//! Eclipse peak model.
//!
//! Implemented as small, pure functions so that fitting code can stay generic.

pub mod model;

pub use model::*;
