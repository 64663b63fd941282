//! Library part of the `trackctl` utility.
//!
//! Every sub-command is a function in `cmds` taking the engine configuration and its own options,
//! `main.rs` only does the plumbing (logging, configuration, output).
//!

pub use cli::*;
pub use cmds::*;
pub use error::*;

mod cli;
mod cmds;
mod error;
