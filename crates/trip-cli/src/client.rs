//! Blocking HTTP client for the trip planning API.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fmt::Write as _;
use std::time::Duration;
use trip_core::{TripRoute, TripType};

#[derive(Debug, Deserialize)]
pub struct PlanImage {
    pub url: String,
    pub alt: String,
    #[serde(default)]
    pub credit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlanData {
    pub route: TripRoute,
    pub image: PlanImage,
}

/// Envelope returned by `POST /v1/trips/plan`.
#[derive(Debug, Deserialize)]
pub struct PlanResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<PlanData>,
}

pub struct PlanClient {
    client: Client,
    base_url: String,
}

impl PlanClient {
    /// Planning chains several retries, so the timeout is generous.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn plan(&self, name: &str, lat: f64, lng: f64, trip_type: TripType) -> Result<PlanData> {
        let body = serde_json::json!({
            "location": { "name": name, "lat": lat, "lng": lng },
            "tripType": trip_type,
        });

        let response = self
            .client
            .post(format!("{}/v1/trips/plan", self.base_url))
            .json(&body)
            .send()
            .with_context(|| format!("failed to reach {}", self.base_url))?;

        let status = response.status();
        let payload: PlanResponse = response
            .json()
            .with_context(|| format!("unexpected response (HTTP {status})"))?;

        match payload {
            PlanResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            PlanResponse { message, .. } => bail!(
                "planning failed (HTTP {}): {}",
                status,
                message.unwrap_or_else(|| "no message".to_string())
            ),
        }
    }
}

/// Human-readable per-day breakdown of a planned route.
pub fn summarize(route: &TripRoute) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Total: {:.1} km, {:.1} h, {} points",
        route.total_distance_km,
        route.total_duration_hours,
        route.points.len()
    );
    for day in &route.daily_routes {
        let _ = writeln!(
            out,
            "  Day {}: {:.1} km, {:.1} h, {} points",
            day.day,
            day.distance_km,
            day.duration_hours,
            day.points.len()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_failure_envelope() {
        let payload: PlanResponse =
            serde_json::from_str(r#"{"success":false,"message":"Failed to plan trip"}"#).unwrap();
        assert!(!payload.success);
        assert!(payload.data.is_none());
        assert_eq!(payload.message.as_deref(), Some("Failed to plan trip"));
    }

    #[test]
    fn summary_lists_each_day() {
        let raw = r#"{
            "geometry": {"type": "LineString", "coordinates": [[2.0, 41.0], [2.0, 41.5], [2.0, 42.0]]},
            "points": [
                {"lat": 41.0, "lng": 2.0, "day": 1, "order": 0},
                {"lat": 41.5, "lng": 2.0, "day": 1, "order": 1},
                {"lat": 42.0, "lng": 2.0, "day": 2, "order": 2}
            ],
            "dailyRoutes": [
                {"day": 1, "distanceKm": 55.6, "durationHours": 3.0, "points": []},
                {"day": 2, "distanceKm": 55.6, "durationHours": 3.0, "points": []}
            ],
            "totalDistanceKm": 111.2,
            "totalDurationHours": 6.0
        }"#;
        let route: TripRoute = serde_json::from_str(raw).unwrap();
        let text = summarize(&route);
        assert!(text.starts_with("Total: 111.2 km, 6.0 h, 3 points"));
        assert!(text.contains("Day 2: 55.6 km"));
    }
}
