//! OpenRouteService snap and directions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use trip_core::{LonLat, RoutingProfile};

use super::{
    error_message, DirectionsProvider, DirectionsRequest, ProviderError, RoadSnapper, RouteSummary,
    RoutedPath,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

#[derive(Debug, Clone)]
pub struct OpenRouteService {
    client: Client,
    base_url: String,
    api_key: String,
    snap_timeout: Duration,
    directions_timeout: Duration,
}

impl OpenRouteService {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        snap_timeout: Duration,
        directions_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            snap_timeout,
            directions_timeout,
        }
    }

    async fn post_json(
        &self,
        url: String,
        body: serde_json::Value,
        timeout: Duration,
    ) -> Result<reqwest::Response, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured("OPENROUTESERVICE_API_KEY"));
        }

        // ORS expects the bare key, not a bearer token
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json, application/geo+json")
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        Ok(response)
    }
}

#[derive(Debug, Deserialize)]
struct SnapResponse {
    #[serde(default)]
    locations: Vec<Option<SnappedLocation>>,
}

#[derive(Debug, Deserialize)]
struct SnappedLocation {
    location: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    #[serde(default)]
    properties: Option<FeatureProperties>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    // elevation may ride along as a third value
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    summary: Option<SummaryBody>,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    distance: Option<f64>,
    duration: Option<f64>,
}

fn to_lon_lat(raw: &[f64]) -> Option<LonLat> {
    match raw {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some([*lon, *lat]),
        _ => None,
    }
}

pub(crate) fn directions_body(request: &DirectionsRequest) -> serde_json::Value {
    let mut body = json!({
        "coordinates": request.coordinates,
        "instructions": true,
        "extra_info": ["waytype", "steepness", "surface"],
        "geometry_simplify": false,
    });
    if request.avoid_ferries {
        body["options"] = json!({ "avoid_features": ["ferries"] });
    }
    body
}

#[async_trait]
impl RoadSnapper for OpenRouteService {
    async fn snap(
        &self,
        profile: RoutingProfile,
        locations: &[LonLat],
        radius_m: f64,
    ) -> Result<Vec<Option<LonLat>>, ProviderError> {
        let url = format!("{}/v2/snap/{}/json", self.base_url, profile);
        let body = json!({ "locations": locations, "radius": radius_m });
        let response = self.post_json(url, body, self.snap_timeout).await?;
        let payload: SnapResponse = response.json().await.map_err(ProviderError::from_reqwest)?;

        Ok(payload
            .locations
            .into_iter()
            .map(|entry| entry.and_then(|snapped| snapped.location).and_then(|raw| to_lon_lat(&raw)))
            .collect())
    }
}

#[async_trait]
impl DirectionsProvider for OpenRouteService {
    async fn route(&self, request: &DirectionsRequest) -> Result<Option<RoutedPath>, ProviderError> {
        let url = format!("{}/v2/directions/{}/geojson", self.base_url, request.profile);
        let response = self
            .post_json(url, directions_body(request), self.directions_timeout)
            .await?;
        let payload: FeatureCollection = response.json().await.map_err(ProviderError::from_reqwest)?;

        let Some(feature) = payload.features.into_iter().next() else {
            return Ok(None);
        };
        let coordinates: Vec<LonLat> = feature
            .geometry
            .coordinates
            .iter()
            .filter_map(|raw| to_lon_lat(raw))
            .collect();
        let summary = feature
            .properties
            .and_then(|props| props.summary)
            .map(|summary| RouteSummary {
                distance_m: summary.distance,
                duration_s: summary.duration,
            });

        Ok(Some(RoutedPath { coordinates, summary }))
    }
}
