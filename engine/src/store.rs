//! Persistence of points, flights and the station dataset.
//!
//! `MemStore` keeps everything in memory, which is what `trackctl` and the tests use.  Anything
//! else (a document database for example) only has to implement `Store`.
//!

use std::sync::{PoisonError, RwLock};

use tracing::{debug, trace};
use uuid::Uuid;

use skytrack_formats::{Flight, Report, Station, StationFilter};

use crate::StoreError;

pub trait Store: Send + Sync {
    /// Store a point and return its new id, a second point from the same device at the same
    /// time is refused.
    fn save_point(&self, report: &Report) -> Result<String, StoreError>;
    fn point_exists(&self, edge_id: &str, time: i64) -> bool;
    /// Points with `time > begin`, oldest first.
    fn points_since(&self, begin: i64) -> Result<Vec<Report>, StoreError>;
    /// Points whose `receipt_time` is at or after `begin`, oldest fix first.
    fn points_received_since(&self, begin: i64) -> Result<Vec<Report>, StoreError>;
    fn save_flight(&self, flight: &Flight) -> Result<String, StoreError>;
    /// Flight with the most recent `begin`.
    fn latest_flight(&self) -> Result<Option<Flight>, StoreError>;
    fn stations(&self, filter: &StationFilter) -> Result<Vec<Station>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemStore {
    points: RwLock<Vec<Report>>,
    flights: RwLock<Vec<Flight>>,
    stations: RwLock<Vec<Station>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stations(stations: Vec<Station>) -> Self {
        MemStore {
            stations: RwLock::new(stations),
            ..Default::default()
        }
    }

    /// Replace the station dataset.
    ///
    #[tracing::instrument(skip(self, stations), fields(n = stations.len()))]
    pub fn load_stations(&self, stations: Vec<Station>) {
        *self.stations.write().unwrap_or_else(PoisonError::into_inner) = stations;
    }

    pub fn len(&self) -> usize {
        self.points
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

impl Store for MemStore {
    #[tracing::instrument(skip(self, report), fields(edge_id = %report.edge_id, time = report.time))]
    fn save_point(&self, report: &Report) -> Result<String, StoreError> {
        let mut points = self.points.write().unwrap_or_else(PoisonError::into_inner);

        if points
            .iter()
            .any(|p| p.edge_id == report.edge_id && p.time == report.time)
        {
            return Err(StoreError::Duplicate(report.edge_id.clone(), report.time));
        }

        let id = new_id();
        let mut point = report.clone();
        point.id = Some(id.clone());
        points.push(point);
        trace!("saved as {id}");
        Ok(id)
    }

    fn point_exists(&self, edge_id: &str, time: i64) -> bool {
        self.points
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|p| p.edge_id == edge_id && p.time == time)
    }

    fn points_since(&self, begin: i64) -> Result<Vec<Report>, StoreError> {
        let points = self.points.read().unwrap_or_else(PoisonError::into_inner);

        let mut found: Vec<_> = points.iter().filter(|p| p.time > begin).cloned().collect();
        found.sort_by_key(|p| p.time);
        Ok(found)
    }

    fn points_received_since(&self, begin: i64) -> Result<Vec<Report>, StoreError> {
        let points = self.points.read().unwrap_or_else(PoisonError::into_inner);

        let mut found: Vec<_> = points
            .iter()
            .filter(|p| p.receipt_time.is_some_and(|t| t >= begin))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.time);
        Ok(found)
    }

    #[tracing::instrument(skip(self))]
    fn save_flight(&self, flight: &Flight) -> Result<String, StoreError> {
        let id = new_id();
        let mut flight = flight.clone();
        flight.id = Some(id.clone());

        self.flights
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(flight);
        debug!("flight saved as {id}");
        Ok(id)
    }

    fn latest_flight(&self) -> Result<Option<Flight>, StoreError> {
        let flights = self.flights.read().unwrap_or_else(PoisonError::into_inner);
        // Last one wins on equal `begin`.
        Ok(flights.iter().max_by_key(|f| f.begin).cloned())
    }

    fn stations(&self, filter: &StationFilter) -> Result<Vec<Station>, StoreError> {
        let stations = self.stations.read().unwrap_or_else(PoisonError::into_inner);
        Ok(stations
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skytrack_common::Coordinate;

    fn point(edge_id: &str, time: i64) -> Report {
        Report::from_value(json!({
            "edge_id": edge_id,
            "latitude": 39.7,
            "longitude": -104.9,
            "altitude": 1600.0,
            "speed": 10.0,
            "time": time,
            "source": "test",
        }))
        .unwrap()
    }

    fn flight(name: &str, begin: i64) -> Flight {
        Flight {
            name: name.into(),
            begin,
            ..Default::default()
        }
    }

    #[test]
    fn test_save_point() {
        let st = MemStore::new();
        let id = st.save_point(&point("E1", 100)).unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        assert!(st.point_exists("E1", 100));
        assert!(!st.point_exists("E1", 101));
        assert_eq!(1, st.len());
    }

    #[test]
    fn test_save_point_duplicate() {
        let st = MemStore::new();
        st.save_point(&point("E1", 100)).unwrap();
        st.save_point(&point("E2", 100)).unwrap();
        assert_eq!(
            Err(StoreError::Duplicate("E1".into(), 100)),
            st.save_point(&point("E1", 100))
        );
        assert_eq!(2, st.len());
    }

    #[test]
    fn test_points_since() {
        let st = MemStore::new();
        for t in [300, 100, 200] {
            st.save_point(&point("E1", t)).unwrap();
        }
        let p = st.points_since(100).unwrap();
        assert_eq!(vec![200, 300], p.iter().map(|p| p.time).collect::<Vec<_>>());
        assert!(p.iter().all(|p| p.id.is_some()));
    }

    #[test]
    fn test_points_received_since() {
        let st = MemStore::new();
        for (t, rx) in [(300, Some(1000)), (100, Some(2000)), (200, Some(999)), (50, None)] {
            let mut p = point("E1", t);
            p.receipt_time = rx;
            st.save_point(&p).unwrap();
        }
        let p = st.points_received_since(1000).unwrap();
        assert_eq!(vec![100, 300], p.iter().map(|p| p.time).collect::<Vec<_>>());
    }

    #[test]
    fn test_latest_flight() {
        let st = MemStore::new();
        assert_eq!(Ok(None), st.latest_flight());

        st.save_flight(&flight("EDGE-5", 500)).unwrap();
        st.save_flight(&flight("EDGE-4", 100)).unwrap();
        let f = st.latest_flight().unwrap().unwrap();
        assert_eq!("EDGE-5", f.name);
        assert!(f.id.is_some());
    }

    #[test]
    fn test_stations_filter() {
        let mk = |state: &str, call: &str| Station {
            state: state.into(),
            call: call.into(),
            kind: "VOR".into(),
            frequency: 110.0,
            elevation: 0.,
            position: Coordinate::new(40., -105.).unwrap(),
        };
        let st = MemStore::with_stations(vec![mk("CO", "DEN"), mk("WY", "CYS")]);
        assert_eq!(2, st.stations(&StationFilter::default()).unwrap().len());

        let wy = st.stations(&StationFilter::state("wy")).unwrap();
        assert_eq!(1, wy.len());
        assert_eq!("CYS", wy[0].call);

        st.load_stations(vec![]);
        assert!(st.stations(&StationFilter::default()).unwrap().is_empty());
    }
}
