//! Ingestion and fan-out engine.
//!
//! Reports come in through the `Ingestor`, are stored in a `Store` and published on the point
//! topic of a `Hub`.  Consumers subscribed to that topic turn each new point into events for the
//! real-time clients through an `Emitter`:
//!
//! ```text
//! JSON / RockBLOCK ─> Ingestor ─> Store
//!                        │
//!                        └─> Hub ─┬─> TrackerConsumer  (inline)     ─> /events
//!                                 ├─> NavaidConsumer   (background) ─> /vor
//!                                 └─> PredictConsumer  (inline)     ─> /predict
//! ```
//!
//! `Engine` wires all of it from an `EngineConfig`.
//!

pub use actors::*;
pub use config::*;
pub use consumers::*;
pub use emit::*;
pub use engine::*;
pub use error::*;
pub use hub::*;
pub use ingest::*;
pub use ranker::*;
pub use stats::*;
pub use store::*;

mod actors;
mod config;
mod consumers;
mod emit;
mod engine;
mod error;
mod hub;
mod ingest;
mod ranker;
mod stats;
mod store;

const NAME: &str = env!("CARGO_PKG_NAME");
const EVERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> String {
    format!("{}/{}", NAME, EVERSION)
}
