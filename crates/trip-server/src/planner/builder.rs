//! Turn snapped coordinates into a routed feature.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use trip_core::{ensure_loop, LonLat, PlanningRules, RouteFeature, TripType};
use trip_core::spatial::path_length_m;

use crate::providers::{DirectionsProvider, DirectionsRequest, ProviderError, RoutedPath};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("directions service found no route")]
    NoRoute,

    #[error("need at least 2 coordinates to route, got {0}")]
    TooFewCoordinates(usize),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

fn unknown_option_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)unknown parameter.*(options|avoid_features)").expect("invalid unknown-option regex")
    })
}

/// True when the provider refused the request because it does not accept
/// the `options` block.
pub fn is_unknown_option_rejection(err: &ProviderError) -> bool {
    match err {
        ProviderError::Rejected { status: 400, message } => unknown_option_re().is_match(message),
        _ => false,
    }
}

/// Coordinates handed to the directions service: hiking loops are closed.
pub fn prepare_coordinates(snapped: &[LonLat], trip_type: TripType, rules: &PlanningRules) -> Vec<LonLat> {
    if trip_type.is_circular() {
        ensure_loop(snapped.to_vec(), rules.loop_close_m)
    } else {
        snapped.to_vec()
    }
}

/// Distance from the summary, or summed along the geometry when the summary
/// has none.
pub fn to_feature(path: RoutedPath) -> RouteFeature {
    let summary = path.summary.unwrap_or_default();
    let total_meters = match summary.distance_m {
        Some(distance) if distance.is_finite() && distance > 0.0 => distance,
        _ => path_length_m(&path.coordinates),
    };
    let total_seconds = summary
        .duration_s
        .filter(|duration| duration.is_finite() && *duration >= 0.0)
        .unwrap_or(0.0);
    RouteFeature {
        geometry: path.coordinates,
        total_meters,
        total_seconds,
    }
}

pub struct RouteBuilder<'a> {
    directions: &'a dyn DirectionsProvider,
    trip_type: TripType,
}

impl<'a> RouteBuilder<'a> {
    pub fn new(directions: &'a dyn DirectionsProvider, trip_type: TripType) -> Self {
        Self { directions, trip_type }
    }

    /// Route `coordinates` as given. Callers close hiking loops beforehand.
    pub async fn build(&self, coordinates: &[LonLat]) -> Result<RouteFeature, RouteError> {
        if coordinates.len() < 2 {
            return Err(RouteError::TooFewCoordinates(coordinates.len()));
        }

        let mut request = DirectionsRequest {
            profile: self.trip_type.profile(),
            coordinates: coordinates.to_vec(),
            avoid_ferries: true,
        };

        let answer = match self.directions.route(&request).await {
            Err(err) if is_unknown_option_rejection(&err) => {
                tracing::warn!(error = %err, "directions rejected options, retrying without them");
                request.avoid_ferries = false;
                self.directions.route(&request).await
            }
            other => other,
        };

        let path = answer?.ok_or(RouteError::NoRoute)?;
        if path.coordinates.len() < 2 {
            return Err(RouteError::NoRoute);
        }

        let feature = to_feature(path);
        tracing::debug!(
            profile = %request.profile,
            waypoints = coordinates.len(),
            vertices = feature.geometry.len(),
            km = feature.distance_km(),
            "route built"
        );
        Ok(feature)
    }
}
