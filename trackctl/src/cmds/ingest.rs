//! This is the module handling the `ingest` sub-command.
//!
//! Records are read one per line and pushed through the full pipeline: validation, storage,
//! publication and consumers.  Every event sent to the clients ends up as a JSON line on the
//! emitter.
//!

use std::io::BufRead;
use std::sync::Arc;

use chrono::Utc;
use eyre::Result;
use serde_json::Value;
use tracing::{info, trace, warn};

use skytrack_engine::{
    Emitter, Engine, EngineConfig, Ingestor, MemStore, Stats, EVENTS_NS, POINTS_EVENT,
};
use skytrack_formats::{load_stations, Flight, Format, RockBlock};

use crate::{open_input, IngestOpts, Status};

/// Source tag for bare packets.
const EDGE: &str = "edge";

/// Read all records and return the final statistics.
///
#[tracing::instrument(skip(cfg, emitter))]
pub async fn ingest_from(
    cfg: &EngineConfig,
    iopts: &IngestOpts,
    emitter: Arc<dyn Emitter>,
) -> Result<Stats> {
    if !matches!(
        iopts.format,
        Format::Edge | Format::RockBlock | Format::Report
    ) {
        return Err(Status::UnsupportedFormat(iopts.format.to_string()).into());
    }

    let store = Arc::new(MemStore::new());
    if let Some(fname) = iopts.stations.as_ref().or(cfg.stations.as_ref()) {
        store.load_stations(load_stations(fname)?);
    } else {
        warn!("no station dataset, nothing will be sent on /vor");
    }

    let engine = Engine::new(cfg, store, emitter.clone()).await?;

    if let Some(name) = &iopts.flight {
        engine.ingestor().start_flight(&Flight {
            name: name.clone(),
            begin: Utc::now().timestamp(),
            ..Default::default()
        })?;
    }

    let input = open_input(iopts.input.as_deref())?;
    let mut lines = 0usize;
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        lines += 1;

        if let Err(e) = ingest_line(engine.ingestor(), iopts, line) {
            warn!("line {lines}: {e}");
        }
    }
    info!("{lines} records read");

    if iopts.snapshot {
        let tracks = engine.ingestor().snapshot()?;
        emitter.emit(EVENTS_NS, POINTS_EVENT, &serde_json::to_string(&tracks)?)?;
    }

    let (stats, pool) = engine.shutdown().await?;
    info!("pool: {pool}");
    Ok(stats)
}

fn ingest_line(ingestor: &Ingestor, iopts: &IngestOpts, line: &str) -> Result<()> {
    let id = match iopts.format {
        Format::Report => {
            let value: Value = serde_json::from_str(line)?;
            ingestor.receive(value)?
        }
        Format::RockBlock => {
            let rb: RockBlock = serde_json::from_str(line)?;
            ingestor.receive_rockblock(&rb)?
        }
        Format::Edge => ingestor.receive_packet(line, &iopts.edge_id, EDGE)?,
        _ => return Err(Status::UnsupportedFormat(iopts.format.to_string()).into()),
    };
    trace!("stored as {id}");
    Ok(())
}
