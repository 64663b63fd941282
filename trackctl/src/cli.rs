//! Module describing all possible commands and sub-commands to the `trackctl` main driver
//!
//! We have these main commands:
//!
//! - `decode` turns an EDGE packet (bare hex or inside a RockBLOCK delivery) into readable JSON,
//! - `rank` lists the stations closest to a given point,
//! - `ingest` feeds reports through the whole pipeline and prints every event the clients would
//!   get as JSON lines,
//! - `list` shows what formats and units are supported.
//!
//! `completion` is here just to configure the various shells completion system.
//!

use std::path::PathBuf;

use clap::{
    crate_authors, crate_description, crate_name, crate_version, Parser, Subcommand, ValueEnum,
};
use clap_complete::shells::Shell;

use skytrack_common::Unit;
use skytrack_formats::Format;

/// CLI options
#[derive(Parser)]
#[command(disable_version_flag = true)]
#[clap(name = crate_name!(), about = crate_description!())]
#[clap(version = crate_version!(), author = crate_authors!())]
pub struct Opts {
    /// configuration file.
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Hierarchical logging output.
    #[clap(short = 'T', long)]
    pub tree: bool,
    /// Also log into hourly files in this directory.
    #[clap(short = 'L', long)]
    pub log_dir: Option<String>,
    /// Verbose mode.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Sub-commands (see below).
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

// ------

/// All sub-commands:
///
/// `completion SHELL`
/// `decode [-F format] [DATA]`
/// `ingest [-F format] [-s FILE] [--flight NAME] [--snapshot] [FILE]`
/// `list (formats|units)`
/// `rank [-s FILE] [-S state] [-n count] [-u unit] LAT LON`
/// `version`
///
#[derive(Debug, Subcommand)]
pub enum SubCommand {
    /// Generate Completion stuff
    Completion(ComplOpts),
    /// Decode one packet
    Decode(DecodeOpts),
    /// Run reports through the pipeline
    Ingest(IngestOpts),
    /// List formats or units
    List(ListOpts),
    /// Closest stations to a point
    Rank(RankOpts),
    /// List all package versions
    Version,
}

// ------

/// Options for `decode`.
///
#[derive(Debug, Parser)]
pub struct DecodeOpts {
    /// Input format, `edge` (hex) or `rockblock` (JSON delivery).
    #[clap(short = 'F', long, default_value = "edge")]
    pub format: Format,
    /// Output a tracking report for this device instead of the bare fix (edge only).
    #[clap(short = 'i', long)]
    pub edge_id: Option<String>,
    /// Packet or delivery, read from stdin if absent or `-`.
    pub data: Option<String>,
}

// ------

/// Options for `rank`.
///
#[derive(Debug, Parser)]
pub struct RankOpts {
    /// Station dataset (CSV), overrides the configuration.
    #[clap(short = 's', long)]
    pub stations: Option<PathBuf>,
    /// Only stations from this state.
    #[clap(short = 'S', long)]
    pub state: Option<String>,
    /// How many stations, all of them if not given.
    #[clap(short = 'n', long)]
    pub count: Option<usize>,
    /// Distance unit, configuration default if not given.
    #[clap(short = 'u', long)]
    pub unit: Option<Unit>,
    /// Output JSON instead of a table.
    #[clap(short = 'J', long)]
    pub json: bool,
    /// Latitude, decimal degrees.
    #[clap(allow_hyphen_values = true)]
    pub latitude: f64,
    /// Longitude, decimal degrees.
    #[clap(allow_hyphen_values = true)]
    pub longitude: f64,
}

// ------

/// Options for `ingest`.
///
#[derive(Debug, Parser)]
pub struct IngestOpts {
    /// Input format, one record per line.
    #[clap(short = 'F', long, default_value = "report")]
    pub format: Format,
    /// Device id for bare `edge` packets.
    #[clap(short = 'i', long, default_value = "EDGE")]
    pub edge_id: String,
    /// Station dataset (CSV), overrides the configuration.
    #[clap(short = 's', long)]
    pub stations: Option<PathBuf>,
    /// Start a flight with this name before ingesting.
    #[clap(long)]
    pub flight: Option<String>,
    /// Emit the current tracks at the end, as a new client would get them.
    #[clap(long)]
    pub snapshot: bool,
    /// Input file, stdin if absent or `-`.
    pub input: Option<PathBuf>,
}

// ------

/// Options to generate completion files at runtime
///
#[derive(Debug, Parser)]
pub struct ComplOpts {
    #[clap(value_parser)]
    pub shell: Shell,
}

// ------

/// All `list` sub-commands:
///
/// `list formats`
/// `list units`
///
#[derive(Debug, Parser)]
pub struct ListOpts {
    #[clap(value_parser)]
    pub cmd: ListSubCommand,
}

/// These are the sub-commands for `list`
///
#[derive(Clone, Copy, Debug, Ord, PartialOrd, Eq, PartialEq, ValueEnum)]
pub enum ListSubCommand {
    /// List all input formats
    Formats,
    /// List all distance units
    Units,
}
