//! In-memory provider doubles shared by planner and router tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use trip_core::{LonLat, RoutingProfile};

use crate::providers::images::{DestinationImage, ImageLookup};
use crate::providers::{
    CompletionRequest, DirectionsProvider, DirectionsRequest, ProviderError, RoadSnapper, RouteSummary,
    RoutedPath, WaypointModel,
};

pub const BARCELONA_LOOP: [(f64, f64); 9] = [
    (41.3851, 2.1734),
    (41.3942, 2.1734),
    (41.3968, 2.1656),
    (41.4036, 2.1744),
    (41.4145, 2.1527),
    (41.4087, 2.1390),
    (41.3950, 2.1420),
    (41.3870, 2.1560),
    (41.3800, 2.1700),
];

pub fn barcelona_loop_json() -> String {
    let waypoints: Vec<serde_json::Value> = BARCELONA_LOOP
        .iter()
        .enumerate()
        .map(|(idx, (lat, lng))| serde_json::json!({ "lat": lat, "lng": lng, "name": format!("Stop {idx}") }))
        .collect();
    serde_json::json!({ "waypoints": waypoints }).to_string()
}

pub fn barcelona_lon_lats() -> Vec<LonLat> {
    BARCELONA_LOOP.iter().map(|(lat, lng)| [*lng, *lat]).collect()
}

/// Plays back canned responses; answers `Empty` once the script runs out.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with the same text.
    pub fn repeating(text: &str, times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(text.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl WaypointModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::Empty))
    }
}

/// Returns scripted snap answers, then echoes the input locations.
pub struct MockSnapper {
    script: Mutex<VecDeque<Result<Vec<Option<LonLat>>, ProviderError>>>,
    radii: Mutex<Vec<f64>>,
}

impl MockSnapper {
    pub fn pass_through() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(script: Vec<Result<Vec<Option<LonLat>>, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            radii: Mutex::new(Vec::new()),
        }
    }

    pub fn radii(&self) -> Vec<f64> {
        self.radii.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoadSnapper for MockSnapper {
    async fn snap(
        &self,
        _profile: RoutingProfile,
        locations: &[LonLat],
        radius_m: f64,
    ) -> Result<Vec<Option<LonLat>>, ProviderError> {
        self.radii.lock().unwrap().push(radius_m);
        match self.script.lock().unwrap().pop_front() {
            Some(answer) => answer,
            None => Ok(locations.iter().copied().map(Some).collect()),
        }
    }
}

type DirectionsFn =
    dyn Fn(&DirectionsRequest, usize) -> Result<Option<RoutedPath>, ProviderError> + Send + Sync;

/// Directions double driven by a closure of (request, call index).
pub struct MockDirections {
    respond: Box<DirectionsFn>,
    requests: Mutex<Vec<DirectionsRequest>>,
}

impl MockDirections {
    pub fn new(
        respond: impl Fn(&DirectionsRequest, usize) -> Result<Option<RoutedPath>, ProviderError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Route along the requested coordinates with a fixed distance per call.
    pub fn with_distances(distances_m: Vec<f64>) -> Self {
        Self::new(move |request, call| {
            let distance = distances_m
                .get(call)
                .or(distances_m.last())
                .copied()
                .unwrap_or(0.0);
            Ok(Some(routed(request.coordinates.clone(), Some(distance), Some(distance / 1.2))))
        })
    }

    pub fn requests(&self) -> Vec<DirectionsRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectionsProvider for MockDirections {
    async fn route(&self, request: &DirectionsRequest) -> Result<Option<RoutedPath>, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };
        (self.respond)(request, call)
    }
}

pub fn routed(coordinates: Vec<LonLat>, distance_m: Option<f64>, duration_s: Option<f64>) -> RoutedPath {
    RoutedPath {
        coordinates,
        summary: Some(RouteSummary {
            distance_m,
            duration_s,
        }),
    }
}

pub struct StaticImages;

#[async_trait]
impl ImageLookup for StaticImages {
    async fn search(&self, location: &str) -> Result<Option<DestinationImage>, ProviderError> {
        Ok(Some(DestinationImage {
            url: format!("https://img.test/{}.jpg", location.to_lowercase()),
            alt: format!("{location} view"),
            credit: None,
            source: None,
        }))
    }
}
