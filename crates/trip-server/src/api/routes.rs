//! HTTP handlers for trip planning and destination images.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use trip_core::TripType;

use super::rate_limit::{throttle, RateLimiter};
use super::request_id::RequestId;
use crate::config::Config;
use crate::state::AppState;

const LOCATION_REQUIRED: &str = "Location with lat/lng is required";
const LOCATION_INVALID: &str = "Invalid location format";

pub fn create_router(config: &Config) -> Router<Arc<AppState>> {
    let limiter = RateLimiter::new(
        config.rate_limit_rps,
        config.rate_limit_enabled,
        config.trust_proxy,
    );

    Router::new()
        .route("/v1/trips/plan", post(plan_trip))
        .route("/v1/image", get(destination_image))
        .layer(middleware::from_fn_with_state(limiter, throttle))
}

type ApiResponse = (StatusCode, Json<Value>);

fn failure(status: StatusCode, message: &str) -> ApiResponse {
    (status, Json(json!({ "success": false, "message": message })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTripBody {
    pub location: Option<Value>,
    pub trip_type: Option<String>,
}

/// A validated destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Accept the location either as an object or as that object encoded in a
/// JSON string.
pub fn resolve_location(raw: Option<Value>) -> Result<Destination, &'static str> {
    let value = match raw {
        None | Some(Value::Null) => return Err(LOCATION_REQUIRED),
        Some(Value::String(encoded)) => {
            serde_json::from_str::<Value>(&encoded).map_err(|_| LOCATION_INVALID)?
        }
        Some(value) => value,
    };
    if !value.is_object() {
        return Err(LOCATION_INVALID);
    }

    let name = value
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let lat = value.get("lat").and_then(coordinate);
    let lng = value.get("lng").and_then(coordinate);

    match (name, lat, lng) {
        (Some(name), Some(lat), Some(lng)) => Ok(Destination {
            name: name.to_string(),
            lat,
            lng,
        }),
        _ => Err(LOCATION_REQUIRED),
    }
}

/// A finite number, given either as a JSON number or a numeric string.
fn coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}

async fn plan_trip(
    State(state): State<Arc<AppState>>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<PlanTripBody>, JsonRejection>,
) -> ApiResponse {
    let request_id = request_id
        .map(|Extension(id)| id.to_string())
        .unwrap_or_default();

    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(%request_id, error = %rejection.body_text(), "unreadable plan request");
            return failure(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    let destination = match resolve_location(body.location) {
        Ok(destination) => destination,
        Err(message) => return failure(StatusCode::BAD_REQUEST, message),
    };
    let trip_type = match body.trip_type.as_deref().map(str::parse::<TripType>) {
        Some(Ok(trip_type)) => trip_type,
        _ => return failure(StatusCode::BAD_REQUEST, "tripType must be 'hiking' or 'cycling'"),
    };

    tracing::info!(
        %request_id,
        location = %destination.name,
        lat = destination.lat,
        lng = destination.lng,
        %trip_type,
        "planning trip"
    );

    let (planned, image) = tokio::join!(
        state.planner().plan_route(&destination.name, trip_type),
        state.images().image_for(&destination.name),
    );

    match planned {
        Ok(route) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "route": route,
                    "image": image,
                    "tripType": trip_type,
                    "generatedAt": chrono::Utc::now(),
                }
            })),
        ),
        Err(err) => {
            tracing::error!(%request_id, location = %destination.name, error = %err, "trip planning failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to plan trip")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub location: Option<String>,
}

async fn destination_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImageQuery>,
) -> ApiResponse {
    let Some(location) = query
        .location
        .as_deref()
        .map(str::trim)
        .filter(|location| !location.is_empty())
    else {
        return failure(StatusCode::BAD_REQUEST, "Location is required");
    };

    let image = state.images().image_for(location).await;
    (StatusCode::OK, Json(json!({ "success": true, "image": image })))
}
