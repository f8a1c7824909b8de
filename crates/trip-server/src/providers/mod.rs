//! External services the planner depends on.
//!
//! Each dependency sits behind an async trait so the pipeline can run
//! against the real HTTP clients or against in-memory doubles.

pub mod images;
pub mod llm;
pub mod ors;

use async_trait::async_trait;
use thiserror::Error;
use trip_core::{LonLat, RoutingProfile};

/// Errors from external provider calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not configured: {0}")]
    NotConfigured(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request timed out")]
    Timeout,

    #[error("provider rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("failed to decode provider response: {0}")]
    Decode(String),

    #[error("empty response from provider")]
    Empty,
}

impl ProviderError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Http(err.to_string())
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A single chat-style completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Language model that answers a prompt with free text.
#[async_trait]
pub trait WaypointModel: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Projects coordinates onto a routable network.
#[async_trait]
pub trait RoadSnapper: Send + Sync {
    /// Returns one entry per input location; `None` when nothing routable
    /// lies within `radius_m`.
    async fn snap(
        &self,
        profile: RoutingProfile,
        locations: &[LonLat],
        radius_m: f64,
    ) -> Result<Vec<Option<LonLat>>, ProviderError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    pub profile: RoutingProfile,
    pub coordinates: Vec<LonLat>,
    pub avoid_ferries: bool,
}

/// Summary block of a routed path. Either field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteSummary {
    pub distance_m: Option<f64>,
    pub duration_s: Option<f64>,
}

/// First feature of a directions answer.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    pub coordinates: Vec<LonLat>,
    pub summary: Option<RouteSummary>,
}

/// Directions service. `Ok(None)` means the provider found no route.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn route(&self, request: &DirectionsRequest) -> Result<Option<RoutedPath>, ProviderError>;
}

/// Pull a human-readable message out of a provider error body.
///
/// Handles `{"error": {"message": ".."}}`, `{"error": ".."}` and
/// `{"message": ".."}`; falls back to the raw text.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    let error = value.get("error");
    error
        .and_then(|err| err.get("message"))
        .and_then(|msg| msg.as_str())
        .or_else(|| error.and_then(|err| err.as_str()))
        .or_else(|| value.get("message").and_then(|msg| msg.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}
