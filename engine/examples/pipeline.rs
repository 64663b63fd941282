//! Feed a few reports through a full `Engine` and print what the clients would get.
//!

use std::sync::Arc;

use eyre::Result;
use serde_json::json;

use skytrack_common::{init_logging, Coordinate};
use skytrack_engine::{ChannelEmitter, Engine, EngineConfig, MemStore};
use skytrack_formats::Station;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("pipeline", false, None)?;

    let stations = [("DEN", 39.8123, -104.6609), ("BJC", 39.9193, -105.1381)]
        .into_iter()
        .map(|(call, lat, lon)| {
            Ok(Station {
                state: "CO".into(),
                call: call.into(),
                kind: "VOR/DME".into(),
                frequency: 115.0,
                elevation: 5400.,
                position: Coordinate::new(lat, lon)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let em = ChannelEmitter::new(32);
    let mut rx = em.subscribe();
    let store = Arc::new(MemStore::with_stations(stations));
    let engine = Engine::new(&EngineConfig::default(), store, Arc::new(em)).await?;

    for (i, alt) in [1600.0, 2100.0, 2650.0].into_iter().enumerate() {
        engine.ingestor().receive(json!({
            "edge_id": "EDGE-1",
            "latitude": 39.7 + i as f64 * 0.01,
            "longitude": -104.9,
            "altitude": alt,
            "speed": 5.0,
            "time": 1_706_783_445 + i as i64 * 60,
            "source": "aprs",
        }))?;
    }

    let (stats, pool) = engine.shutdown().await?;
    while let Ok(msg) = rx.try_recv() {
        println!("{} {} {}", msg.namespace, msg.event, msg.payload);
    }
    println!("{stats}\n{pool}");
    Ok(())
}
