//! Distance bounds, retry budgets and timing for the planning pipeline.

use serde::{Deserialize, Serialize};

use crate::models::TripType;

/// Cycling trips always span two days.
pub const CYCLING_DAYS: u32 = 2;

/// Configuration for the planning pipeline.
///
/// Passed explicitly into the planner so tests can shrink delays and
/// budgets without touching the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRules {
    /// Maximum cycling distance for a single day (km)
    pub cycling_max_km_per_day: f64,
    /// Slack allowed on the per-day cycling limit after splitting (km)
    pub cycling_day_tolerance_km: f64,
    /// Minimum hiking loop length (km)
    pub hiking_min_km: f64,
    /// Maximum hiking loop length (km)
    pub hiking_max_km: f64,
    /// Endpoints closer than this form a closed loop (m)
    pub loop_close_m: f64,
    /// Snap search radii, tried in order (m)
    pub snap_radii_m: Vec<f64>,
    /// Snapped points closer than this to a kept point are dropped (m)
    pub snap_dedup_m: f64,
    /// Minimum usable points after snapping
    pub min_snapped_points: usize,
    /// Keep-every factors used when decimating an overlong route
    pub decimation_steps: Vec<usize>,
    /// Fractions of the hiking maximum used to slice the snapped prefix
    pub hiking_prefix_fractions: Vec<f64>,
    /// Share of the hiking maximum targeted by the minimal loop fallback
    pub minimal_loop_factor: f64,
    /// Minimum waypoints accepted from the model
    pub min_waypoints: usize,
    /// Maximum waypoints accepted from the model
    pub max_waypoints: usize,
    /// Points within this many degrees of (0, 0) on both axes are rejected
    pub origin_exclusion_deg: f64,
    /// Vertex angles above this count as "straight" (degrees)
    pub straight_angle_deg: f64,
    /// Reject a waypoint set when more than this share of angles is straight
    pub max_straight_fraction: f64,
    /// Full pipeline restarts before giving up
    pub max_pipeline_attempts: u32,
    /// Model calls per proposal before giving up
    pub max_proposal_attempts: u32,
    /// Pause after the model returned unusable waypoints (ms)
    pub proposal_retry_delay_ms: u64,
    /// Pause after snapping/routing/enforcement failed (ms)
    pub route_retry_delay_ms: u64,
    /// Pause between model calls inside one proposal (ms)
    pub model_retry_delay_ms: u64,
    /// Timeout for a language model call (s)
    pub model_timeout_s: u64,
    /// Timeout for a snap call (s)
    pub snap_timeout_s: u64,
    /// Timeout for a directions call (s)
    pub directions_timeout_s: u64,
}

impl Default for PlanningRules {
    fn default() -> Self {
        Self {
            cycling_max_km_per_day: 60.0,
            cycling_day_tolerance_km: 0.1,
            hiking_min_km: 5.0,
            hiking_max_km: 15.0,
            loop_close_m: 120.0,
            snap_radii_m: vec![200.0, 400.0, 800.0],
            snap_dedup_m: 30.0,
            min_snapped_points: 3,
            decimation_steps: vec![2, 3],
            hiking_prefix_fractions: vec![0.55, 0.45, 0.35],
            minimal_loop_factor: 0.9,
            min_waypoints: 3,
            max_waypoints: 15,
            origin_exclusion_deg: 0.5,
            straight_angle_deg: 170.0,
            max_straight_fraction: 0.7,
            max_pipeline_attempts: 6,
            max_proposal_attempts: 3,
            proposal_retry_delay_ms: 800,
            route_retry_delay_ms: 900,
            model_retry_delay_ms: 1000,
            model_timeout_s: 60,
            snap_timeout_s: 20,
            directions_timeout_s: 30,
        }
    }
}

impl PlanningRules {
    /// Total cycling budget over all days (km).
    pub fn cycling_max_total_km(&self) -> f64 {
        self.cycling_max_km_per_day * f64::from(CYCLING_DAYS)
    }

    /// Upper distance bound for a trip type (km).
    pub fn max_total_km(&self, trip_type: TripType) -> f64 {
        match trip_type {
            TripType::Hiking => self.hiking_max_km,
            TripType::Cycling => self.cycling_max_total_km(),
        }
    }

    /// Same rules with every pause set to zero.
    pub fn without_delays(mut self) -> Self {
        self.proposal_retry_delay_ms = 0;
        self.route_retry_delay_ms = 0;
        self.model_retry_delay_ms = 0;
        self
    }
}
