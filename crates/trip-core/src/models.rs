//! Core data models for trip planning.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `[lon, lat]` coordinate pair, the order used by routing providers and GeoJSON.
pub type LonLat = [f64; 2];

/// Activity a trip is planned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    /// One-day closed loop.
    Hiking,
    /// Two-day point-to-point journey.
    Cycling,
}

impl TripType {
    /// Routing network profile used for snapping and directions.
    pub fn profile(self) -> RoutingProfile {
        match self {
            TripType::Hiking => RoutingProfile::FootHiking,
            TripType::Cycling => RoutingProfile::CyclingRegular,
        }
    }

    /// Whether the route must start and end at the same place.
    pub fn is_circular(self) -> bool {
        matches!(self, TripType::Hiking)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TripType::Hiking => "hiking",
            TripType::Cycling => "cycling",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hiking" => Ok(TripType::Hiking),
            "cycling" => Ok(TripType::Cycling),
            other => Err(format!("unknown trip type '{}'", other)),
        }
    }
}

/// Routing network type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutingProfile {
    #[serde(rename = "foot-hiking")]
    FootHiking,
    #[serde(rename = "cycling-regular")]
    CyclingRegular,
}

impl RoutingProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            RoutingProfile::FootHiking => "foot-hiking",
            RoutingProfile::CyclingRegular => "cycling-regular",
        }
    }
}

impl fmt::Display for RoutingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate stop proposed by the language model. Untrusted until validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub name: String,
}

impl Waypoint {
    pub fn new(lat: f64, lng: f64, name: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            name: name.into(),
        }
    }

    pub fn lon_lat(&self) -> LonLat {
        [self.lng, self.lat]
    }
}

/// The JSON object the model is asked to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointPayload {
    pub waypoints: Vec<Waypoint>,
}

/// A routed path returned by the directions provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteFeature {
    pub geometry: Vec<LonLat>,
    pub total_meters: f64,
    pub total_seconds: f64,
}

impl RouteFeature {
    pub fn distance_km(&self) -> f64 {
        self.total_meters / 1000.0
    }
}

/// GeoJSON LineString geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<LonLat>,
}

impl LineString {
    pub fn new(coordinates: Vec<LonLat>) -> Self {
        Self {
            kind: "LineString".to_string(),
            coordinates,
        }
    }
}

/// A geometry vertex tagged with its travel day and position in the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
    pub day: u32,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRoute {
    pub day: u32,
    pub distance_km: f64,
    pub duration_hours: f64,
    pub points: Vec<RoutePoint>,
}

/// Final output of a planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRoute {
    pub geometry: LineString,
    pub points: Vec<RoutePoint>,
    pub daily_routes: Vec<DailyRoute>,
    pub total_distance_km: f64,
    pub total_duration_hours: f64,
}
