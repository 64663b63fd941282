//! Entry point for everything the field devices send us.
//!
//! A report goes through validation, gets its receipt time, is stored and finally published as a
//! single-point `Track` on the point topic.  Once stored a report is accepted: not being able to
//! publish it is logged but does not undo anything.
//!

use std::sync::Arc;

use chrono::Utc;
use ractor::ActorRef;
use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use skytrack_formats::{decode_hex, Flight, Report, RockBlock, Track};

use crate::{Hub, IngestError, StatsMsg, Store};

/// Default topic for new points.
pub const POINT_TOPIC: &str = "point_received";

pub struct Ingestor {
    store: Arc<dyn Store>,
    hub: Arc<Hub<Track>>,
    topic: String,
    stats: Option<ActorRef<StatsMsg>>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn Store>, hub: Arc<Hub<Track>>, topic: &str) -> Self {
        Ingestor {
            store,
            hub,
            topic: topic.to_owned(),
            stats: None,
        }
    }

    /// Report counters to a `StatsActor`.
    ///
    pub fn with_stats(mut self, stats: ActorRef<StatsMsg>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Take one JSON report, returns the id it was stored as.
    ///
    #[tracing::instrument(skip(self, value))]
    pub fn receive(&self, value: Value) -> Result<String, IngestError> {
        let report = Report::from_value(value).inspect_err(|e| {
            warn!("rejected: {e}");
            self.tally(StatsMsg::Rejected);
        })?;
        self.accept(report)
    }

    /// Same as `receive()` for an already typed report.
    ///
    #[tracing::instrument(skip(self, report), fields(edge_id = %report.edge_id))]
    pub fn receive_report(&self, report: Report) -> Result<String, IngestError> {
        report.check().inspect_err(|e| {
            warn!("rejected: {e}");
            self.tally(StatsMsg::Rejected);
        })?;
        self.accept(report)
    }

    /// Decode a RockBLOCK delivery and ingest the point it carries.
    ///
    #[tracing::instrument(skip(self, envelope), fields(imei = %envelope.imei, momsn = envelope.momsn))]
    pub fn receive_rockblock(&self, envelope: &RockBlock) -> Result<String, IngestError> {
        let report = envelope.to_report().inspect_err(|e| {
            warn!("bad payload: {e}");
            self.tally(StatsMsg::Rejected);
        })?;
        self.receive_report(report)
    }

    /// Decode a bare hex EDGE packet and ingest it on behalf of `edge_id`.
    ///
    #[tracing::instrument(skip(self, packet))]
    pub fn receive_packet(
        &self,
        packet: &str,
        edge_id: &str,
        source: &str,
    ) -> Result<String, IngestError> {
        let fix = decode_hex(packet).inspect_err(|e| {
            warn!("bad packet: {e}");
            self.tally(StatsMsg::Rejected);
        })?;
        self.receive_report(Report::from_fix(&fix, edge_id, source))
    }

    fn accept(&self, mut report: Report) -> Result<String, IngestError> {
        report.receipt_time = Some(Utc::now().timestamp());

        let id = self.store.save_point(&report).map_err(|e| {
            warn!("not stored: {e}");
            self.tally(StatsMsg::Conflict);
            IngestError::Conflict(e)
        })?;
        report.id = Some(id.clone());
        self.tally(StatsMsg::Accepted);
        debug!("accepted {} as {id}", report.edge_id);

        match self.hub.publish(&self.topic, Track::single(report)) {
            Ok(d) => {
                trace!("delivery: {d}");
                self.tally(StatsMsg::Published);
                if d.failed > 0 {
                    self.tally(StatsMsg::Failed(d.failed as u32));
                }
                if d.dropped > 0 {
                    self.tally(StatsMsg::Dropped(d.dropped as u32));
                }
            }
            Err(e) => error!("point {id} stored but not published: {e}"),
        }
        Ok(id)
    }

    /// Tracks of the current flight, what a newly connected client gets first.
    ///
    /// Points belong to the flight when we received them after it started, whatever time the
    /// device put in them.  Without any flight recorded, every stored point is used.
    ///
    #[tracing::instrument(skip(self))]
    pub fn snapshot(&self) -> Result<Vec<Track>, IngestError> {
        let points = match self.store.latest_flight()? {
            Some(flight) => {
                trace!("current flight {} since {}", flight.name, flight.begin);
                self.store.points_received_since(flight.begin)?
            }
            None => self.store.points_since(i64::MIN)?,
        };
        Ok(Track::group(points))
    }

    /// Record the start of a flight.
    ///
    #[tracing::instrument(skip(self))]
    pub fn start_flight(&self, flight: &Flight) -> Result<String, IngestError> {
        let id = self.store.save_flight(flight)?;
        info!("flight {} starts at {}", flight.name, flight.begin);
        Ok(id)
    }

    fn tally(&self, msg: StatsMsg) {
        if let Some(stats) = &self.stats {
            if let Err(e) = stats.cast(msg) {
                trace!("stats gone: {e}");
            }
        }
    }
}
