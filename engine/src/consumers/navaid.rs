//! Position of the latest point relative to the closest navigation aids.
//!
//! Loading and ranking the whole station dataset is the slow part of handling a point, so this
//! one runs in the background.
//!

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use skytrack_common::Unit;
use skytrack_formats::{RankedStation, Report, StationFilter, Track};

use crate::{rank_with, Dispatch, Emitter, RankError, Store, Subscriber, POINT_EVENT, VOR_NS};

/// Default number of stations sent to clients.
pub const DEF_NEAREST: usize = 2;

/// What clients get for each station.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NavaidView {
    pub call: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance: f64,
    pub bearing: f64,
}

impl From<&RankedStation> for NavaidView {
    fn from(r: &RankedStation) -> Self {
        NavaidView {
            call: r.station.call.clone(),
            latitude: r.station.position.lat(),
            longitude: r.station.position.lon(),
            distance: r.distance,
            bearing: r.bearing,
        }
    }
}

#[derive(Debug, Serialize)]
struct NavaidUpdate<'a> {
    vors: Vec<NavaidView>,
    point: &'a Report,
}

pub struct NavaidConsumer {
    store: Arc<dyn Store>,
    emitter: Arc<dyn Emitter>,
    nearest: usize,
    unit: Unit,
    filter: StationFilter,
}

impl NavaidConsumer {
    pub fn new(store: Arc<dyn Store>, emitter: Arc<dyn Emitter>) -> Self {
        NavaidConsumer {
            store,
            emitter,
            nearest: DEF_NEAREST,
            unit: Unit::default(),
            filter: StationFilter::default(),
        }
    }

    pub fn nearest(mut self, nearest: usize) -> Self {
        self.nearest = nearest;
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn filter(mut self, filter: StationFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl Subscriber<Track> for NavaidConsumer {
    fn name(&self) -> &str {
        "navaid"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Background
    }

    #[tracing::instrument(skip(self, track), fields(track = %track.id))]
    fn handle(&self, track: &Track) -> eyre::Result<()> {
        let Some(point) = track.last() else {
            debug!("empty track");
            return Ok(());
        };
        let origin = point.position()?;
        let stations = self.store.stations(&self.filter)?;

        let ranked = match rank_with(&origin, &stations, Some(self.nearest), self.unit.radius()) {
            Ok(ranked) => ranked,
            Err(RankError::InsufficientCandidates(n, _)) => {
                debug!("only {n} stations, nothing to send");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let update = NavaidUpdate {
            vors: ranked.iter().map(NavaidView::from).collect(),
            point,
        };
        let payload = serde_json::to_string(&update)?;
        self.emitter.emit(VOR_NS, POINT_EVENT, &payload)
    }
}
