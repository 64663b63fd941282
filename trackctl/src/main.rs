use std::io;
use std::sync::Arc;

use clap::{crate_authors, crate_description, crate_version, CommandFactory, Parser};
use clap_complete::generate;
use eyre::Result;
use tracing::{info, trace};

use skytrack_common::{init_logging, ConfigError, ConfigFile};
use skytrack_engine::{EngineConfig, StdoutEmitter};
use trackctl::{
    decode_packet, ingest_from, list_formats, list_units, rank_stations, ListSubCommand, Opts,
    SubCommand,
};

/// Binary name, using a different binary name
pub const NAME: &str = env!("CARGO_BIN_NAME");
/// Binary version
pub const VERSION: &str = crate_version!();
/// Authors
pub const AUTHORS: &str = crate_authors!();

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();

    // Initialise logging.
    //
    init_logging(NAME, opts.tree, opts.log_dir.clone())?;

    // Banner
    //
    if opts.verbose > 0 {
        banner()?;
    }

    let cfg = load_config(&opts)?;
    handle_subcmd(&cfg, &opts.subcmd).await
}

/// Load the configuration, falling back to defaults when there is no file at all.
///
fn load_config(opts: &Opts) -> Result<EngineConfig> {
    match ConfigFile::<EngineConfig>::load(opts.config.as_deref()) {
        Ok(cfg) => {
            trace!("config from {:?}", cfg.path());
            Ok(cfg.into_inner())
        }
        Err(e) => match e.downcast_ref::<ConfigError>() {
            Some(ConfigError::NotFound(..)) if opts.config.is_none() => {
                trace!("no config file, using defaults");
                Ok(EngineConfig::default())
            }
            _ => Err(e),
        },
    }
}

pub async fn handle_subcmd(cfg: &EngineConfig, subcmd: &SubCommand) -> Result<()> {
    match subcmd {
        // Handle `decode`
        //
        SubCommand::Decode(dopts) => {
            trace!("decode");

            println!("{}", decode_packet(dopts)?);
        }

        // Handle `rank lat lon`
        //
        SubCommand::Rank(ropts) => {
            trace!("rank");

            println!("{}", rank_stations(cfg, ropts)?);
        }

        // Handle `ingest [file]`, events go to stdout and the summary to stderr
        //
        SubCommand::Ingest(iopts) => {
            trace!("ingest");

            let stats = ingest_from(cfg, iopts, Arc::new(StdoutEmitter)).await?;
            eprintln!("{stats}");
        }

        // Standalone completion generation
        //
        // NOTE: you can generate UNIX shells completion on Windows and vice-versa.  Not worth
        //       trying to limit depending on the OS.
        //
        SubCommand::Completion(copts) => {
            let generator = copts.shell;
            generate(generator, &mut Opts::command(), NAME, &mut io::stdout());
        }

        // Standalone `list` command
        //
        SubCommand::List(lopts) => match lopts.cmd {
            ListSubCommand::Formats => {
                info!("Listing all formats:");

                eprintln!("{}", list_formats()?);
            }
            ListSubCommand::Units => {
                info!("Listing all units:");

                eprintln!("{}", list_units()?);
            }
        },

        // Standalone `version` command
        //
        SubCommand::Version => {
            eprintln!("{}", version());
            eprintln!("Modules: ");
            eprintln!("\t{}", skytrack_common::version());
            eprintln!("\t{}", skytrack_formats::version());
            eprintln!("\t{}", skytrack_engine::version());
        }
    }
    Ok(())
}

/// Return our version number
///
#[inline]
pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}

/// Display banner
///
fn banner() -> Result<()> {
    Ok(eprintln!(
        r##"
{}/{} by {}
{}
"##,
        NAME,
        VERSION,
        AUTHORS,
        crate_description!()
    ))
}
