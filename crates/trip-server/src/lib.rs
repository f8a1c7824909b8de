//! Trip planning server: model-proposed waypoints turned into routed,
//! distance-bounded itineraries.

pub mod api;
pub mod cache;
pub mod config;
pub mod planner;
pub mod providers;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
