use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use eyre::Result;

pub use decode::*;
pub use ingest::*;
pub use list::*;
pub use rank::*;

mod decode;
mod ingest;
mod list;
mod rank;

/// Open the input file, `-` or nothing means stdin.
///
pub(crate) fn open_input(fname: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match fname {
        Some(p) if p != Path::new("-") => Ok(Box::new(BufReader::new(File::open(p)?))),
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}
