//! Error module
//!

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Status {
    #[error("No station dataset, use -s or set `stations` in the configuration file")]
    NoStations,
    #[error("Format {0} can not be used here")]
    UnsupportedFormat(String),
    #[error("Empty input")]
    EmptyInput,
}
