//! Great-circle helpers.
//!
//! Everything here works on a sphere, which is plenty for ranking navigation aids a few tens of
//! nautical miles away from a balloon.  The radius is a parameter so the very same formula gives
//! nautical miles, kilometers or statute miles.
//!
use serde::{Deserialize, Serialize};
use strum::{EnumString, VariantNames};
use thiserror::Error;

/// Radius of the Earth in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3443.89849;
/// Radius of the Earth in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6378.137;
/// Radius of the Earth in statute miles.
pub const EARTH_RADIUS_MI: f64 = 3963.191;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("invalid coordinate ({0}, {1})")]
    InvalidCoordinate(f64, f64),
    #[error("invalid radius {0}")]
    InvalidRadius(f64),
}

/// Distance units we know the Earth radius for.
///
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    EnumString,
    PartialEq,
    Serialize,
    strum::Display,
    VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Unit {
    /// Nautical miles
    #[default]
    Nm,
    /// Kilometers
    Km,
    /// Statute miles
    Mi,
}

impl Unit {
    /// Earth radius expressed in this unit.
    ///
    pub fn radius(&self) -> f64 {
        match self {
            Unit::Nm => EARTH_RADIUS_NM,
            Unit::Km => EARTH_RADIUS_KM,
            Unit::Mi => EARTH_RADIUS_MI,
        }
    }
}

/// A latitude/longitude pair in decimal degrees.
///
/// The only way to get one is through `Coordinate::new()` (or deserialisation, which goes through
/// it) so both components are always finite and within ±90/±180.
///
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "LatLon", into = "LatLon")]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

/// Wire shape of a `Coordinate`.
///
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
struct LatLon {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<LatLon> for Coordinate {
    type Error = GeoError;

    fn try_from(value: LatLon) -> Result<Self, Self::Error> {
        Coordinate::new(value.latitude, value.longitude)
    }
}

impl From<Coordinate> for LatLon {
    fn from(value: Coordinate) -> Self {
        LatLon {
            latitude: value.lat,
            longitude: value.lon,
        }
    }
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90. || lon.abs() > 180. {
            return Err(GeoError::InvalidCoordinate(lat, lon));
        }
        Ok(Coordinate { lat, lon })
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Distance in nautical miles to `other`.
    ///
    #[inline]
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine(self, other, EARTH_RADIUS_NM)
    }

    /// Initial bearing in degrees to `other`.
    ///
    #[inline]
    pub fn bearing_to(&self, other: &Coordinate) -> f64 {
        bearing(self, other)
    }
}

#[inline]
fn haversine(a: &Coordinate, b: &Coordinate, radius: f64) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let h = (d_lat / 2.).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.).sin().powi(2);

    // rounding can push h a hair above 1 for antipodal points
    2. * radius * h.sqrt().min(1.).asin()
}

/// Great-circle distance between `a` and `b` on a sphere of radius `radius`.
///
/// The result is in whatever unit `radius` is expressed in, see `Unit::radius()`.
///
pub fn distance(a: &Coordinate, b: &Coordinate, radius: f64) -> Result<f64, GeoError> {
    if !radius.is_finite() || radius <= 0. {
        return Err(GeoError::InvalidRadius(radius));
    }
    Ok(haversine(a, b, radius))
}

/// Initial forward azimuth from `a` to `b`, clockwise from true north, in `[0, 360)`.
///
pub fn bearing(a: &Coordinate, b: &Coordinate) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lon = (b.lon - a.lon).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    let deg = y.atan2(x).to_degrees().rem_euclid(360.);
    if deg >= 360. {
        0.
    } else {
        deg
    }
}
