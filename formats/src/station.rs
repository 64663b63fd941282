//! Reference stations (VOR and friends) used to give a position relative to navigation aids.
//!
//! The reference dataset is a CSV file with the following columns:
//!
//! `State,Call,Type,Frequency,Elevation,Latitude,Longitude`
//!

use std::fs::File;
use std::io::Read;
use std::path::Path;

use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use skytrack_common::{Coordinate, GeoError};

/// One navigation aid.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Station {
    /// State code, e.g. `CO`
    pub state: String,
    /// Call sign, e.g. `DEN`
    pub call: String,
    /// Station type, e.g. `VOR/DME`
    #[serde(rename = "type")]
    pub kind: String,
    /// Frequency in MHz
    pub frequency: f64,
    /// Elevation in feet
    pub elevation: f64,
    pub position: Coordinate,
}

/// CSV row as found in the dataset.
///
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StationRecord {
    state: String,
    call: String,
    #[serde(rename = "Type")]
    kind: String,
    frequency: f64,
    elevation: f64,
    latitude: f64,
    longitude: f64,
}

impl TryFrom<StationRecord> for Station {
    type Error = GeoError;

    fn try_from(rec: StationRecord) -> Result<Self, Self::Error> {
        Ok(Station {
            position: Coordinate::new(rec.latitude, rec.longitude)?,
            state: rec.state,
            call: rec.call,
            kind: rec.kind,
            frequency: rec.frequency,
            elevation: rec.elevation,
        })
    }
}

/// A station seen from a given point.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedStation {
    pub station: Station,
    /// Great-circle distance, unit depends on the radius used
    pub distance: f64,
    /// Initial bearing from the point to the station, degrees
    pub bearing: f64,
}

/// Selection criteria applied to the reference dataset before ranking.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct StationFilter {
    /// Only this state (case-insensitive)
    pub state: Option<String>,
}

impl StationFilter {
    pub fn state(state: &str) -> Self {
        StationFilter {
            state: Some(state.to_owned()),
        }
    }

    pub fn matches(&self, station: &Station) -> bool {
        match &self.state {
            Some(state) => station.state.eq_ignore_ascii_case(state),
            None => true,
        }
    }
}

/// Read stations from CSV, rows with a bad position are skipped.
///
#[tracing::instrument(skip(rdr))]
pub fn read_stations<R: Read>(rdr: R) -> Result<Vec<Station>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);

    let mut stations = vec![];
    for rec in rdr.deserialize::<StationRecord>() {
        let rec = rec?;
        let call = rec.call.clone();
        match Station::try_from(rec) {
            Ok(st) => stations.push(st),
            Err(e) => warn!("skipping station {call}: {e}"),
        }
    }
    debug!("{} stations loaded", stations.len());
    Ok(stations)
}

/// Load the station dataset from a file.
///
#[tracing::instrument]
pub fn load_stations(fname: &Path) -> Result<Vec<Station>> {
    let fh = File::open(fname)?;
    read_stations(fh)
}
