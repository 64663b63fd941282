//! Tracking points as they come in and go out.
//!
//! Anything trackable (balloon, chase car, APRS beacon, …) is received as a JSON `Report`,
//! stored as-is and sent to the clients grouped by device as a `Track`.
//!

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use skytrack_common::{Coordinate, GeoError};

use crate::{ReportError, TelemetryFix};

/// Fields every report must carry, non-null and non-empty.
pub const REQUIRED: [&str; 7] = [
    "edge_id",
    "latitude",
    "longitude",
    "altitude",
    "speed",
    "time",
    "source",
];

/// One tracking point.
///
/// Fields we do not know about are kept in `extra` and travel along untouched.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Report {
    /// Storage id, given by the store
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Device id (IMEI, call sign, …), used to correlate points
    pub edge_id: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters
    pub altitude: f64,
    /// Speed in m/s
    pub speed: f64,
    /// Time of report, UTC seconds since epoch
    pub time: i64,
    /// Where it came from (satcom, aprs, …)
    pub source: String,
    /// Time we got it, UTC seconds since epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_time: Option<i64>,
    /// Everything else
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Report {
    /// Check that all required fields are there and neither null nor an empty string.
    ///
    pub fn validate(value: &Value) -> Result<(), ReportError> {
        let obj = value.as_object().ok_or(ReportError::NotAnObject)?;

        for key in REQUIRED {
            match obj.get(key) {
                None => return Err(ReportError::MissingField(key)),
                Some(Value::Null) => return Err(ReportError::EmptyField(key)),
                Some(Value::String(s)) if s.is_empty() => {
                    return Err(ReportError::EmptyField(key))
                }
                _ => (),
            }
        }
        Ok(())
    }

    /// Validate then convert a raw JSON value into a `Report`.
    ///
    #[tracing::instrument(skip(value))]
    pub fn from_value(value: Value) -> Result<Report, ReportError> {
        Report::validate(&value)?;

        let report: Report =
            serde_json::from_value(value).map_err(|e| ReportError::Invalid(e.to_string()))?;
        report.check()?;
        trace!("report = {report:?}");
        Ok(report)
    }

    /// Build a report out of a decoded fix.
    ///
    /// Heading, age and header do not have a place of their own so they go into `extra`.
    ///
    pub fn from_fix(fix: &TelemetryFix, edge_id: &str, source: &str) -> Report {
        let mut extra = Map::new();
        extra.insert("heading".into(), fix.heading.into());
        extra.insert("age".into(), fix.age.into());
        if let Some(hdr) = &fix.header {
            extra.insert("header".into(), hdr.clone().into());
        }

        Report {
            id: None,
            edge_id: edge_id.to_owned(),
            latitude: fix.position.lat(),
            longitude: fix.position.lon(),
            altitude: fix.altitude,
            speed: fix.speed,
            time: fix.utc(),
            source: source.to_owned(),
            receipt_time: None,
            extra,
        }
    }

    pub fn position(&self) -> Result<Coordinate, GeoError> {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// The typed counterpart of `validate()`: identifiers not empty, position within range.
    ///
    pub fn check(&self) -> Result<(), ReportError> {
        if self.edge_id.is_empty() {
            return Err(ReportError::EmptyField("edge_id"));
        }
        if self.source.is_empty() {
            return Err(ReportError::EmptyField("source"));
        }
        self.position()
            .map_err(|_| ReportError::InvalidCoordinate(self.latitude, self.longitude))?;
        Ok(())
    }
}

/// What the clients get: all (or the latest) points of one device.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Track {
    /// Correlation id, the `edge_id` of the points
    pub id: String,
    pub points: Vec<Report>,
}

impl Track {
    /// A track made of a single new point.
    ///
    pub fn single(report: Report) -> Self {
        Track {
            id: report.edge_id.clone(),
            points: vec![report],
        }
    }

    /// Most recent point, points are kept in arrival order.
    ///
    pub fn last(&self) -> Option<&Report> {
        self.points.last()
    }

    /// Group points per device, tracks come out in the order their first point was seen.
    ///
    pub fn group(points: Vec<Report>) -> Vec<Track> {
        let mut tracks: Vec<Track> = vec![];

        for point in points {
            match tracks.iter_mut().find(|t| t.id == point.edge_id) {
                Some(track) => track.points.push(point),
                None => tracks.push(Track::single(point)),
            }
        }
        tracks
    }
}

/// A flight (generally named after the EDGE mission number).
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Flight {
    /// Storage id, given by the store
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human readable name
    pub name: String,
    /// Start of flight, UTC seconds since epoch
    pub begin: i64,
    /// End of flight, UTC seconds since epoch
    pub end: Option<i64>,
    /// Anything noteworthy
    pub description: Option<String>,
}
