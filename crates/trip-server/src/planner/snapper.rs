//! Snap proposed waypoints onto the routable network.

use thiserror::Error;
use trip_core::{haversine_meters, LonLat, PlanningRules, TripType, WaypointSet};

use crate::providers::RoadSnapper;

#[derive(Debug, Error)]
#[error("too few routable points after snapping (best {best} of {requested}, need {min})")]
pub struct SnapError {
    pub requested: usize,
    pub best: usize,
    pub min: usize,
}

/// Drop empty or non-finite slots and points no further than
/// `min_separation_m` from one already kept.
pub fn dedupe_snapped(raw: Vec<Option<LonLat>>, min_separation_m: f64) -> Vec<LonLat> {
    let mut kept: Vec<LonLat> = Vec::with_capacity(raw.len());
    for point in raw.into_iter().flatten() {
        if !point[0].is_finite() || !point[1].is_finite() {
            continue;
        }
        if kept
            .iter()
            .any(|existing| haversine_meters(*existing, point) <= min_separation_m)
        {
            continue;
        }
        kept.push(point);
    }
    kept
}

/// Try each snap radius in order and return the first usable point set.
pub async fn snap_waypoints(
    snapper: &dyn RoadSnapper,
    waypoints: &WaypointSet,
    trip_type: TripType,
    rules: &PlanningRules,
) -> Result<Vec<LonLat>, SnapError> {
    let locations = waypoints.lon_lats();
    let profile = trip_type.profile();
    let mut best = 0;

    for &radius in &rules.snap_radii_m {
        let raw = match snapper.snap(profile, &locations, radius).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(radius, error = %err, "snap request failed, trying next radius");
                continue;
            }
        };

        let snapped = dedupe_snapped(raw, rules.snap_dedup_m);
        if snapped.len() >= rules.min_snapped_points {
            tracing::info!(radius, kept = snapped.len(), of = locations.len(), "waypoints snapped");
            return Ok(snapped);
        }
        tracing::debug!(radius, kept = snapped.len(), "not enough snapped points");
        best = best.max(snapped.len());
    }

    Err(SnapError {
        requested: locations.len(),
        best,
        min: rules.min_snapped_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use crate::testing::{barcelona_lon_lats, MockSnapper, BARCELONA_LOOP};
    use trip_core::Waypoint;

    fn barcelona_set() -> WaypointSet {
        let waypoints = BARCELONA_LOOP
            .iter()
            .map(|(lat, lng)| Waypoint::new(*lat, *lng, ""))
            .collect();
        WaypointSet::validate(waypoints, &PlanningRules::default()).unwrap()
    }

    #[test]
    fn dedupe_drops_nulls_nan_and_near_duplicates() {
        let raw = vec![
            Some([2.1734, 41.3851]),
            None,
            Some([2.17341, 41.38511]),
            Some([f64::NAN, 41.0]),
            Some([2.1656, 41.3968]),
        ];
        let kept = dedupe_snapped(raw, 30.0);
        assert_eq!(kept, vec![[2.1734, 41.3851], [2.1656, 41.3968]]);
    }

    #[test]
    fn dedupe_drops_point_exactly_at_separation() {
        let start = [2.1734, 41.3851];
        let next = [2.1734, 41.3854];
        let gap = haversine_meters(start, next);
        assert_eq!(dedupe_snapped(vec![Some(start), Some(next)], gap), vec![start]);
        assert_eq!(dedupe_snapped(vec![Some(start), Some(next)], gap - 0.01).len(), 2);
    }

    #[tokio::test]
    async fn escalates_radius_until_enough_points() {
        let coords = barcelona_lon_lats();
        let snapper = MockSnapper::scripted(vec![
            Ok(vec![Some(coords[0]), None, None]),
            Err(ProviderError::Timeout),
            Ok(coords.iter().copied().map(Some).collect()),
        ]);

        let snapped = snap_waypoints(&snapper, &barcelona_set(), TripType::Hiking, &PlanningRules::default())
            .await
            .unwrap();
        assert_eq!(snapped.len(), 9);
        assert_eq!(snapper.radii(), vec![200.0, 400.0, 800.0]);
    }

    #[tokio::test]
    async fn fails_when_no_radius_yields_three_points() {
        let coords = barcelona_lon_lats();
        let two = || Ok(vec![Some(coords[0]), Some(coords[3])]);
        let snapper = MockSnapper::scripted(vec![two(), two(), two()]);

        let err = snap_waypoints(&snapper, &barcelona_set(), TripType::Cycling, &PlanningRules::default())
            .await
            .unwrap_err();
        assert_eq!(err.best, 2);
        assert_eq!(err.min, 3);
    }
}
