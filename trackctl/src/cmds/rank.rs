//! This is the module handling the `rank` sub-command.
//!

use eyre::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::{debug, info};

use skytrack_common::{Coordinate, Unit};
use skytrack_engine::{rank_with, EngineConfig};
use skytrack_formats::{load_stations, RankedStation, StationFilter};

use crate::{RankOpts, Status};

/// Rank the stations around the given point, as a table or JSON.
///
#[tracing::instrument(skip(cfg))]
pub fn rank_stations(cfg: &EngineConfig, ropts: &RankOpts) -> Result<String> {
    let fname = ropts
        .stations
        .as_ref()
        .or(cfg.stations.as_ref())
        .ok_or(Status::NoStations)?;
    let origin = Coordinate::new(ropts.latitude, ropts.longitude)?;
    let unit = ropts.unit.unwrap_or(cfg.unit);

    let filter = match ropts.state.as_ref().or(cfg.state.as_ref()) {
        Some(state) => StationFilter::state(state),
        None => StationFilter::default(),
    };

    let stations: Vec<_> = load_stations(fname)?
        .into_iter()
        .filter(|s| filter.matches(s))
        .collect();
    debug!("{} candidates", stations.len());

    let ranked = rank_with(&origin, &stations, ropts.count, unit.radius())?;
    info!("{} stations ranked", ranked.len());

    if ropts.json {
        Ok(serde_json::to_string_pretty(&ranked)?)
    } else {
        Ok(table(&ranked, unit))
    }
}

fn table(ranked: &[RankedStation], unit: Unit) -> String {
    let mut builder = Builder::default();
    builder.push_record(vec![
        "Call".to_string(),
        "Type".to_string(),
        "State".to_string(),
        "Frequency".to_string(),
        format!("Distance ({unit})"),
        "Bearing".to_string(),
    ]);

    ranked.iter().for_each(|r| {
        builder.push_record(vec![
            r.station.call.clone(),
            r.station.kind.clone(),
            r.station.state.clone(),
            format!("{:.2}", r.station.frequency),
            format!("{:.2}", r.distance),
            format!("{:.1}", r.bearing),
        ]);
    });
    builder.build().with(Style::modern()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    const VORS: &str = "\
State,Call,Type,Frequency,Elevation,Latitude,Longitude
CO,DEN,VOR/DME,117.9,5431,39.8123,-104.6609
CO,BJC,VOR/DME,115.0,5480,39.9193,-105.1381
WY,CYS,VORTAC,113.1,6090,41.2105,-104.7722
";

    fn dataset(name: &str) -> PathBuf {
        let fname = std::env::temp_dir().join(name);
        fs::write(&fname, VORS).unwrap();
        fname
    }

    fn opts(stations: Option<PathBuf>) -> RankOpts {
        RankOpts {
            stations,
            state: None,
            count: Some(2),
            unit: None,
            json: false,
            latitude: 39.7,
            longitude: -104.9,
        }
    }

    #[test]
    fn test_rank_table() {
        let cfg = EngineConfig::default();
        let s = rank_stations(&cfg, &opts(Some(dataset("trackctl-rank-table.csv")))).unwrap();
        assert!(s.contains("DEN"));
        assert!(s.contains("BJC"));
        assert!(!s.contains("CYS"));
        assert!(s.contains("Distance (nm)"));
    }

    #[test]
    fn test_rank_json_state() {
        let cfg = EngineConfig {
            stations: Some(dataset("trackctl-rank-json.csv")),
            ..Default::default()
        };
        let mut ro = opts(None);
        ro.json = true;
        ro.count = None;
        ro.state = Some("co".into());

        let s = rank_stations(&cfg, &ro).unwrap();
        let v: Vec<serde_json::Value> = serde_json::from_str(&s).unwrap();
        assert_eq!(2, v.len());
        assert_eq!("DEN", v[0]["station"]["call"]);
    }

    #[test]
    fn test_rank_no_stations() {
        let err = rank_stations(&EngineConfig::default(), &opts(None)).unwrap_err();
        assert_eq!(Some(&Status::NoStations), err.downcast_ref::<Status>());
    }
}
