//! Trip CLI - command line tools for the trip planning server.
//!
//! Binaries:
//! - plan_trip: request a plan and print the per-day breakdown

pub mod client;

pub use client::{PlanClient, PlanResponse};
