//! API routes for the trip planning server.

pub mod rate_limit;
pub mod request_id;
mod routes;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::state::AppState;

pub use routes::{resolve_location, Destination, PlanTripBody};

pub fn routes(config: &Config) -> Router<Arc<AppState>> {
    routes::create_router(config)
}

/// Complete application: API routes, health check, request ids, tracing and CORS.
pub fn app(state: Arc<AppState>) -> Router {
    let api = routes(state.config());
    api.route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(middleware::from_fn(request_id::tag_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
