//! Rank reference stations by great-circle distance from a point.
//!
//! Only the retained stations get a bearing, computing it for the whole dataset is wasted work.
//!

use tracing::trace;

use skytrack_common::{bearing, distance, Coordinate, EARTH_RADIUS_NM};
use skytrack_formats::{RankedStation, Station};

use crate::RankError;

/// Below this, "closest stations" does not mean much.
pub const MIN_CANDIDATES: usize = 2;

/// Rank `candidates` by distance (nautical miles) from `origin` and keep at most `limit` of them,
/// `None` means all.
///
pub fn rank(
    origin: &Coordinate,
    candidates: &[Station],
    limit: Option<usize>,
) -> Result<Vec<RankedStation>, RankError> {
    rank_with(origin, candidates, limit, EARTH_RADIUS_NM)
}

/// Same as `rank()` with a specific sphere radius, distances come out in the unit of `radius`.
///
/// Ties keep the input order.
///
#[tracing::instrument(skip(candidates), fields(candidates = candidates.len()))]
pub fn rank_with(
    origin: &Coordinate,
    candidates: &[Station],
    limit: Option<usize>,
    radius: f64,
) -> Result<Vec<RankedStation>, RankError> {
    // Check the radius once, everything below would fail the same way.
    //
    distance(origin, origin, radius)?;

    let mut usable: Vec<(&Station, f64)> = candidates
        .iter()
        .filter_map(|st| match distance(origin, &st.position, radius) {
            Ok(d) if d.is_finite() => Some((st, d)),
            _ => {
                trace!("skipping {}", st.call);
                None
            }
        })
        .collect();

    if usable.len() < MIN_CANDIDATES {
        return Err(RankError::InsufficientCandidates(
            usable.len(),
            MIN_CANDIDATES,
        ));
    }

    // `sort_by` is stable.
    //
    usable.sort_by(|a, b| a.1.total_cmp(&b.1));
    usable.truncate(limit.unwrap_or(usize::MAX));

    let ranked = usable
        .into_iter()
        .map(|(st, d)| RankedStation {
            station: st.clone(),
            distance: d,
            bearing: bearing(origin, &st.position),
        })
        .collect();
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use skytrack_common::{GeoError, EARTH_RADIUS_KM};

    fn station(call: &str, lat: f64, lon: f64) -> Station {
        Station {
            state: "CO".into(),
            call: call.into(),
            kind: "VOR".into(),
            frequency: 110.0,
            elevation: 0.,
            position: Coordinate::new(lat, lon).unwrap(),
        }
    }

    fn stations() -> Vec<Station> {
        vec![
            station("FAR", 10., 10.),
            station("NEAR", 0., 1.),
            station("MID", 0., 5.),
            station("NORTH", 2., 0.),
        ]
    }

    fn origin() -> Coordinate {
        Coordinate::new(0., 0.).unwrap()
    }

    #[rstest]
    #[case(Some(1), vec!["NEAR"])]
    #[case(Some(2), vec!["NEAR", "NORTH"])]
    #[case(Some(3), vec!["NEAR", "NORTH", "MID"])]
    #[case(Some(10), vec!["NEAR", "NORTH", "MID", "FAR"])]
    #[case(None, vec!["NEAR", "NORTH", "MID", "FAR"])]
    fn test_rank_limit(#[case] limit: Option<usize>, #[case] calls: Vec<&str>) {
        let r = rank(&origin(), &stations(), limit).unwrap();
        let got: Vec<_> = r.iter().map(|s| s.station.call.as_str()).collect();
        assert_eq!(calls, got);
    }

    #[test_pretty_log::test]
    fn test_rank_sorted() {
        let r = rank(&origin(), &stations(), None).unwrap();
        assert!(r.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!((r[0].distance - 60.107).abs() < 1e-3);
    }

    #[test]
    fn test_rank_bearing() {
        let r = rank(&origin(), &stations(), Some(2)).unwrap();
        assert!((r[0].bearing - 90.).abs() < 1e-9);
        assert!(r[1].bearing.abs() < 1e-9);
    }

    #[test]
    fn test_rank_ties_keep_order() {
        let st = vec![
            station("A", 0., 1.),
            station("B", 0., -1.),
            station("C", 1., 0.),
        ];
        let r = rank(&origin(), &st, None).unwrap();
        let got: Vec<_> = r.iter().map(|s| s.station.call.as_str()).collect();
        assert_eq!(vec!["A", "B"], got[..2]);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn test_rank_insufficient(#[case] n: usize) {
        let st: Vec<_> = stations().into_iter().take(n).collect();
        assert_eq!(
            Err(RankError::InsufficientCandidates(n, MIN_CANDIDATES)),
            rank(&origin(), &st, Some(5))
        );
    }

    #[test]
    fn test_rank_with_km() {
        let nm = rank(&origin(), &stations(), Some(1)).unwrap();
        let km = rank_with(&origin(), &stations(), Some(1), EARTH_RADIUS_KM).unwrap();
        assert_eq!(nm[0].station, km[0].station);
        assert!(km[0].distance > nm[0].distance);
    }

    #[test]
    fn test_rank_bad_radius() {
        assert_eq!(
            Err(RankError::Geo(GeoError::InvalidRadius(-1.))),
            rank_with(&origin(), &stations(), None, -1.)
        );
    }

    #[test]
    fn test_rank_candidates_untouched() {
        let st = stations();
        let before = st.clone();
        let _ = rank(&origin(), &st, Some(2)).unwrap();
        assert_eq!(before, st);
    }
}
