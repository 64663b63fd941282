//! This library is there to share some common code amongst all skytrack modules.
//!
//! - `geo` has the great-circle distance and bearing used everywhere a fix is compared to a
//!   reference point,
//! - `config` finds and loads the versioned HCL configuration files,
//! - `logging` sets up `tracing` the same way for every binary.
//!

mod config;
mod geo;
mod logging;
mod macros;

use clap::{crate_name, crate_version};
pub use config::*;
pub use geo::*;
pub use logging::*;

const NAME: &str = crate_name!();
const VERSION: &str = crate_version!();

pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}
