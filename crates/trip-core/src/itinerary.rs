//! Turn a routed feature into per-day itineraries.

use thiserror::Error;

use crate::models::{DailyRoute, LineString, RouteFeature, RoutePoint, TripRoute};
use crate::rules::PlanningRules;
use crate::spatial::cumulative_meters;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    #[error("route geometry has {0} points, need at least 2 to split")]
    TooFewPoints(usize),
    #[error("cycling day distance exceeded {limit_km} km (day1={day1_km:.1}, day2={day2_km:.1})")]
    DayTooLong {
        day1_km: f64,
        day2_km: f64,
        limit_km: f64,
    },
}

/// Day-one distance target for a two-day trip.
///
/// Half the total, capped at the daily maximum, and raised when the second
/// day would otherwise exceed the maximum. Never negative.
pub fn day_one_target_km(total_km: f64, max_per_day_km: f64) -> f64 {
    let mut target = total_km / 2.0;
    if target > max_per_day_km {
        target = max_per_day_km;
    }
    if total_km - target > max_per_day_km {
        target = total_km - max_per_day_km;
    }
    target.max(0.0)
}

/// First index (from 1) whose cumulative distance reaches `target_m`.
pub fn split_index(cumulative: &[f64], target_m: f64) -> usize {
    cumulative
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, distance)| **distance >= target_m)
        .map(|(idx, _)| idx)
        .unwrap_or(1)
}

fn tag_points(feature: &RouteFeature, day_of: impl Fn(usize) -> u32) -> Vec<RoutePoint> {
    feature
        .geometry
        .iter()
        .enumerate()
        .map(|(order, [lon, lat])| RoutePoint {
            lat: *lat,
            lng: *lon,
            day: day_of(order),
            order,
        })
        .collect()
}

/// Single-day itinerary (hiking).
pub fn single_day_route(feature: &RouteFeature) -> TripRoute {
    let points = tag_points(feature, |_| 1);
    let total_distance_km = feature.total_meters / 1000.0;
    let total_duration_hours = feature.total_seconds / 3600.0;
    TripRoute {
        geometry: LineString::new(feature.geometry.clone()),
        daily_routes: vec![DailyRoute {
            day: 1,
            distance_km: total_distance_km,
            duration_hours: total_duration_hours,
            points: points.clone(),
        }],
        points,
        total_distance_km,
        total_duration_hours,
    }
}

/// Two-day itinerary (cycling), split along cumulative distance.
pub fn split_two_days(feature: &RouteFeature, rules: &PlanningRules) -> Result<TripRoute, SplitError> {
    if feature.geometry.len() < 2 {
        return Err(SplitError::TooFewPoints(feature.geometry.len()));
    }

    let total_meters = feature.total_meters;
    let total_seconds = feature.total_seconds;
    let cumulative = cumulative_meters(&feature.geometry);

    let target_km = day_one_target_km(total_meters / 1000.0, rules.cycling_max_km_per_day);
    let split = split_index(&cumulative, target_km * 1000.0);

    let day1_meters = cumulative[split];
    let day2_meters = total_meters - day1_meters;
    let denominator = total_meters.max(1.0);

    let points = tag_points(feature, |order| if order <= split { 1 } else { 2 });
    let (day1_points, day2_points): (Vec<RoutePoint>, Vec<RoutePoint>) =
        points.iter().cloned().partition(|point| point.day == 1);

    let daily_routes = vec![
        DailyRoute {
            day: 1,
            distance_km: day1_meters / 1000.0,
            duration_hours: total_seconds * (day1_meters / denominator) / 3600.0,
            points: day1_points,
        },
        DailyRoute {
            day: 2,
            distance_km: day2_meters / 1000.0,
            duration_hours: total_seconds * (day2_meters / denominator) / 3600.0,
            points: day2_points,
        },
    ];

    let limit_km = rules.cycling_max_km_per_day + rules.cycling_day_tolerance_km;
    if daily_routes[0].distance_km > limit_km || daily_routes[1].distance_km > limit_km {
        return Err(SplitError::DayTooLong {
            day1_km: daily_routes[0].distance_km,
            day2_km: daily_routes[1].distance_km,
            limit_km: rules.cycling_max_km_per_day,
        });
    }

    Ok(TripRoute {
        geometry: LineString::new(feature.geometry.clone()),
        points,
        daily_routes,
        total_distance_km: total_meters / 1000.0,
        total_duration_hours: total_seconds / 3600.0,
    })
}
