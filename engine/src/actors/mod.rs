//! module for all actors in `Engine`.
//!

pub use stats::*;

mod stats;
