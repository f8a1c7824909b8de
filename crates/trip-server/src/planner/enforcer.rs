//! Bring a routed feature within the activity's distance bounds and shape
//! it into per-day itineraries.
//!
//! Overlong routes are shrunk by rebuilding from progressively smaller
//! coordinate sets. Cycling decimates and then splits into two days. Hiking
//! decimates, then slices a prefix of the snapped points, then falls back to
//! a minimal out-and-back loop.

use std::f64::consts::PI;

use thiserror::Error;
use trip_core::spatial::{cumulative_meters, pick_index_by_radius, prefix_end_index};
use trip_core::{
    decimate, ensure_loop, single_day_route, split_two_days, LonLat, PlanningRules, RouteFeature,
    SplitError, TripRoute, TripType,
};

use super::builder::{RouteBuilder, RouteError};

#[derive(Debug, Error)]
pub enum EnforceError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("cycling route is {distance_km:.1} km, over the {max_km} km limit")]
    CyclingTooLong { distance_km: f64, max_km: f64 },

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("hiking route is {distance_km:.1} km, outside {min_km}-{max_km} km")]
    HikingOutOfRange {
        distance_km: f64,
        min_km: f64,
        max_km: f64,
    },
}

pub struct ConstraintEnforcer<'a> {
    builder: &'a RouteBuilder<'a>,
    rules: &'a PlanningRules,
}

impl<'a> ConstraintEnforcer<'a> {
    pub fn new(builder: &'a RouteBuilder<'a>, rules: &'a PlanningRules) -> Self {
        Self { builder, rules }
    }

    /// `snapped` are the un-looped snapped coordinates; `feature` is the
    /// route first built from them.
    pub async fn enforce(
        &self,
        trip_type: TripType,
        snapped: &[LonLat],
        feature: RouteFeature,
    ) -> Result<TripRoute, EnforceError> {
        match trip_type {
            TripType::Cycling => self.enforce_cycling(snapped, feature).await,
            TripType::Hiking => self.enforce_hiking(snapped, feature).await,
        }
    }

    async fn rebuild(&self, label: &str, coordinates: &[LonLat]) -> Result<RouteFeature, RouteError> {
        let feature = self.builder.build(coordinates).await?;
        tracing::info!(
            strategy = label,
            points = coordinates.len(),
            km = feature.distance_km(),
            "route rebuilt"
        );
        Ok(feature)
    }

    async fn enforce_cycling(
        &self,
        snapped: &[LonLat],
        mut feature: RouteFeature,
    ) -> Result<TripRoute, EnforceError> {
        let max_km = self.rules.cycling_max_total_km();

        if feature.distance_km() > max_km {
            tracing::warn!(km = feature.distance_km(), max_km, "cycling route too long, decimating");
            for &step in &self.rules.decimation_steps {
                feature = self.rebuild("decimate", &decimate(snapped, step)).await?;
                if feature.distance_km() <= max_km {
                    break;
                }
            }
        }

        if feature.distance_km() > max_km {
            return Err(EnforceError::CyclingTooLong {
                distance_km: feature.distance_km(),
                max_km,
            });
        }

        Ok(split_two_days(&feature, self.rules)?)
    }

    async fn enforce_hiking(
        &self,
        snapped: &[LonLat],
        mut feature: RouteFeature,
    ) -> Result<TripRoute, EnforceError> {
        let rules = self.rules;
        let max_km = rules.hiking_max_km;
        let max_m = max_km * 1000.0;

        if feature.distance_km() > max_km {
            tracing::warn!(km = feature.distance_km(), max_km, "hiking loop too long, decimating");
            let closed = ensure_loop(snapped.to_vec(), rules.loop_close_m);
            for &step in &rules.decimation_steps {
                let coords = ensure_loop(decimate(&closed, step), rules.loop_close_m);
                feature = self.rebuild("decimate", &coords).await?;
                if feature.distance_km() <= max_km {
                    break;
                }
            }
        }

        if feature.distance_km() > max_km && snapped.len() >= 2 {
            let cumulative = cumulative_meters(snapped);
            for &fraction in &rules.hiking_prefix_fractions {
                let end = prefix_end_index(&cumulative, max_m * fraction).min(snapped.len() - 1);
                let coords = ensure_loop(snapped[..=end].to_vec(), rules.loop_close_m);
                feature = self.rebuild("prefix", &coords).await?;
                if feature.distance_km() <= max_km {
                    break;
                }
            }
        }

        if feature.distance_km() > max_km && snapped.len() >= 2 {
            let start = snapped[0];
            let radius_m = rules.minimal_loop_factor * max_m / (2.0 * PI);
            let mid = snapped[pick_index_by_radius(snapped, start, radius_m)];
            let coords = ensure_loop(vec![start, mid], rules.loop_close_m);
            feature = self.rebuild("minimal-loop", &coords).await?;
        }

        let distance_km = feature.distance_km();
        if distance_km < rules.hiking_min_km || distance_km > max_km {
            return Err(EnforceError::HikingOutOfRange {
                distance_km,
                min_km: rules.hiking_min_km,
                max_km,
            });
        }

        Ok(single_day_route(&feature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{barcelona_lon_lats, MockDirections};
    use trip_core::haversine_meters;

    fn feature(geometry: Vec<LonLat>, meters: f64) -> RouteFeature {
        RouteFeature {
            geometry,
            total_meters: meters,
            total_seconds: meters / 1.2,
        }
    }

    #[tokio::test]
    async fn hiking_within_bounds_is_untouched() {
        let directions = MockDirections::with_distances(vec![]);
        let builder = RouteBuilder::new(&directions, TripType::Hiking);
        let rules = PlanningRules::default();
        let enforcer = ConstraintEnforcer::new(&builder, &rules);

        let snapped = barcelona_lon_lats();
        let closed = ensure_loop(snapped.clone(), rules.loop_close_m);
        let route = enforcer
            .enforce(TripType::Hiking, &snapped, feature(closed, 9_000.0))
            .await
            .unwrap();
        assert_eq!(route.daily_routes.len(), 1);
        assert!((route.total_distance_km - 9.0).abs() < 1e-9);
        assert!(directions.requests().is_empty());
    }

    #[tokio::test]
    async fn hiking_falls_through_to_prefix_slice() {
        // decimate 2, decimate 3 still too long; first prefix fits
        let directions = MockDirections::with_distances(vec![17_000.0, 16_000.0, 12_000.0]);
        let builder = RouteBuilder::new(&directions, TripType::Hiking);
        let rules = PlanningRules::default();
        let enforcer = ConstraintEnforcer::new(&builder, &rules);

        let snapped = barcelona_lon_lats();
        let closed = ensure_loop(snapped.clone(), rules.loop_close_m);
        let route = enforcer
            .enforce(TripType::Hiking, &snapped, feature(closed, 20_000.0))
            .await
            .unwrap();

        assert!((route.total_distance_km - 12.0).abs() < 1e-9);
        let requests = directions.requests();
        assert_eq!(requests.len(), 3);
        for request in &requests {
            let first = request.coordinates[0];
            let last = request.coordinates[request.coordinates.len() - 1];
            assert!(haversine_meters(first, last) <= rules.loop_close_m);
        }
        let prefix = &requests[2].coordinates;
        assert_eq!(prefix[..prefix.len() - 1], snapped[..prefix.len() - 1]);
    }

    #[tokio::test]
    async fn hiking_minimal_loop_is_last_resort() {
        let directions =
            MockDirections::with_distances(vec![19_000.0, 18_000.0, 17_000.0, 16_000.0, 15_500.0, 6_000.0]);
        let builder = RouteBuilder::new(&directions, TripType::Hiking);
        let rules = PlanningRules::default();
        let enforcer = ConstraintEnforcer::new(&builder, &rules);

        let snapped = barcelona_lon_lats();
        let route = enforcer
            .enforce(TripType::Hiking, &snapped, feature(snapped.clone(), 20_000.0))
            .await
            .unwrap();

        assert!((route.total_distance_km - 6.0).abs() < 1e-9);
        let requests = directions.requests();
        assert_eq!(requests.len(), 6);
        let minimal = &requests[5].coordinates;
        assert_eq!(minimal.len(), 3);
        assert_eq!(minimal[0], snapped[0]);
        assert_eq!(minimal[2], snapped[0]);
    }

    #[tokio::test]
    async fn hiking_decimates_the_closed_loop() {
        let directions = MockDirections::with_distances(vec![17_000.0, 14_000.0]);
        let builder = RouteBuilder::new(&directions, TripType::Hiking);
        let rules = PlanningRules::default();
        let enforcer = ConstraintEnforcer::new(&builder, &rules);

        // last waypoint is ~570 m short of the start
        let snapped = barcelona_lon_lats();
        assert!(haversine_meters(snapped[0], snapped[8]) > rules.loop_close_m);
        let closed = ensure_loop(snapped.clone(), rules.loop_close_m);
        enforcer
            .enforce(TripType::Hiking, &snapped, feature(closed.clone(), 20_000.0))
            .await
            .unwrap();

        let requests = directions.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].coordinates, decimate(&closed, 2));
        assert_eq!(
            requests[1].coordinates,
            vec![snapped[0], snapped[3], snapped[6], snapped[0]]
        );
    }

    #[tokio::test]
    async fn hiking_still_too_long_after_every_fallback_fails() {
        let directions = MockDirections::with_distances(vec![19_000.0; 6]);
        let builder = RouteBuilder::new(&directions, TripType::Hiking);
        let rules = PlanningRules::default();
        let enforcer = ConstraintEnforcer::new(&builder, &rules);

        let snapped = barcelona_lon_lats();
        let err = enforcer
            .enforce(TripType::Hiking, &snapped, feature(snapped.clone(), 20_000.0))
            .await
            .unwrap_err();

        match err {
            EnforceError::HikingOutOfRange { distance_km, max_km, .. } => {
                assert!((distance_km - 19.0).abs() < 1e-9);
                assert_eq!(max_km, 15.0);
            }
            other => panic!("unexpected error: {other}"),
        }
        // decimate x2, prefix x3, minimal loop
        assert_eq!(directions.requests().len(), 6);
    }

    #[tokio::test]
    async fn hiking_too_short_is_rejected() {
        let directions = MockDirections::with_distances(vec![]);
        let builder = RouteBuilder::new(&directions, TripType::Hiking);
        let rules = PlanningRules::default();
        let enforcer = ConstraintEnforcer::new(&builder, &rules);

        let snapped = barcelona_lon_lats();
        let err = enforcer
            .enforce(TripType::Hiking, &snapped, feature(snapped.clone(), 2_500.0))
            .await
            .unwrap_err();
        assert!(matches!(err, EnforceError::HikingOutOfRange { .. }));
        assert!(err.to_string().contains("2.5 km"));
    }

    #[tokio::test]
    async fn cycling_decimates_then_splits() {
        let directions = MockDirections::with_distances(vec![130_000.0, 100_000.0]);
        let builder = RouteBuilder::new(&directions, TripType::Cycling);
        let rules = PlanningRules::default();
        let enforcer = ConstraintEnforcer::new(&builder, &rules);

        // every third point is ~10.6km apart
        let snapped: Vec<LonLat> = (0..31).map(|i| [2.0, 41.0 + 0.0317 * i as f64]).collect();
        let route = enforcer
            .enforce(TripType::Cycling, &snapped, feature(snapped.clone(), 140_000.0))
            .await
            .unwrap();

        let requests = directions.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].coordinates, decimate(&snapped, 2));
        assert_eq!(requests[1].coordinates, decimate(&snapped, 3));
        assert_eq!(route.daily_routes.len(), 2);
        assert!((route.total_distance_km - 100.0).abs() < 1e-9);
        for day in &route.daily_routes {
            assert!(day.distance_km <= 60.1);
        }
    }

    #[tokio::test]
    async fn cycling_still_too_long_after_decimation_fails() {
        let directions = MockDirections::with_distances(vec![150_000.0]);
        let builder = RouteBuilder::new(&directions, TripType::Cycling);
        let rules = PlanningRules::default();
        let enforcer = ConstraintEnforcer::new(&builder, &rules);

        let snapped: Vec<LonLat> = (0..6).map(|i| [2.0, 41.0 + 0.2 * i as f64]).collect();
        let err = enforcer
            .enforce(TripType::Cycling, &snapped, feature(snapped.clone(), 150_000.0))
            .await
            .unwrap_err();
        assert!(matches!(err, EnforceError::CyclingTooLong { .. }));
    }
}
