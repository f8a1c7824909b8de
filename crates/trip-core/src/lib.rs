//! Core logic for AI-assisted trip planning: data models, geodesy,
//! waypoint parsing/validation and itinerary shaping. No I/O.

pub mod itinerary;
pub mod models;
pub mod rules;
pub mod spatial;
pub mod waypoints;

pub use itinerary::{day_one_target_km, single_day_route, split_index, split_two_days, SplitError};
pub use models::{
    DailyRoute, LineString, LonLat, RouteFeature, RoutePoint, RoutingProfile, TripRoute, TripType,
    Waypoint, WaypointPayload,
};
pub use rules::PlanningRules;
pub use spatial::{cumulative_meters, decimate, ensure_loop, haversine_meters};
pub use waypoints::{
    check_waypoints, is_waypoints_valid, parse_waypoint_payload, ParseOutcome, ParseStrategy,
    WaypointIssue, WaypointSet,
};
