//! Definition of the data formats
//!
//! This module has everything needed to go from what the field devices send to what the rest of
//! the pipeline works on:
//!
//! - `edge` decodes the packed binary report of the flight computer into a `TelemetryFix`,
//! - `rockblock` is the satellite modem envelope around it,
//! - `report` is the JSON tracking point every source ends up as, grouped into `Track`s,
//! - `station` is the reference navigation aid dataset.
//!

pub use edge::*;
pub use error::*;
pub use format::*;
pub use report::*;
pub use rockblock::*;
pub use station::*;

mod edge;
mod error;
mod format;
mod report;
mod rockblock;
mod station;

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
