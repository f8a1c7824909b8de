//! Route generation pipeline.
//!
//! One planning request walks `Proposing -> Snapping -> Building ->
//! Enforcing -> Done`. Any stage failure consumes an attempt and sends the
//! pipeline back to `Proposing` (with the corrective prompt) after a fixed
//! pause, until the attempt budget runs out.

pub mod builder;
pub mod enforcer;
pub mod proposer;
pub mod snapper;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use trip_core::{LonLat, PlanningRules, RouteFeature, TripRoute, TripType, WaypointSet};

use crate::providers::{DirectionsProvider, RoadSnapper, WaypointModel};
use builder::{prepare_coordinates, RouteBuilder, RouteError};
use enforcer::{ConstraintEnforcer, EnforceError};
use proposer::{ProposalError, WaypointProposer};
use snapper::{snap_waypoints, SnapError};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("waypoint proposal failed: {0}")]
    Proposal(#[from] ProposalError),

    #[error("snapping failed: {0}")]
    Snap(#[from] SnapError),

    #[error("route build failed: {0}")]
    Routing(#[from] RouteError),

    #[error("route constraints not met: {0}")]
    Constraint(EnforceError),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<PlanError> },
}

impl From<EnforceError> for PlanError {
    fn from(err: EnforceError) -> Self {
        match err {
            EnforceError::Route(route) => PlanError::Routing(route),
            other => PlanError::Constraint(other),
        }
    }
}

enum Stage {
    Proposing,
    Snapping(WaypointSet),
    Building(Vec<LonLat>),
    Enforcing {
        snapped: Vec<LonLat>,
        feature: RouteFeature,
    },
    Done(TripRoute),
    Failed(PlanError),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Proposing => "proposing",
            Stage::Snapping(_) => "snapping",
            Stage::Building(_) => "building",
            Stage::Enforcing { .. } => "enforcing",
            Stage::Done(_) => "done",
            Stage::Failed(_) => "failed",
        };
        f.write_str(name)
    }
}

/// Holds the providers and rules; cheap to clone and share across requests.
#[derive(Clone)]
pub struct TripPlanner {
    model: Arc<dyn WaypointModel>,
    snapper: Arc<dyn RoadSnapper>,
    directions: Arc<dyn DirectionsProvider>,
    rules: PlanningRules,
}

impl TripPlanner {
    pub fn new(
        model: Arc<dyn WaypointModel>,
        snapper: Arc<dyn RoadSnapper>,
        directions: Arc<dyn DirectionsProvider>,
        rules: PlanningRules,
    ) -> Self {
        Self {
            model,
            snapper,
            directions,
            rules,
        }
    }

    /// Plan a route around `location_name`. Returns a finished itinerary or
    /// the last failure once every attempt is spent.
    pub async fn plan_route(&self, location_name: &str, trip_type: TripType) -> Result<TripRoute, PlanError> {
        let rules = &self.rules;
        let max_attempts = rules.max_pipeline_attempts.max(1);
        let proposer = WaypointProposer::new(self.model.as_ref(), rules);
        let builder = RouteBuilder::new(self.directions.as_ref(), trip_type);
        let enforcer = ConstraintEnforcer::new(&builder, rules);

        let mut attempt = 1;
        let mut stage = Stage::Proposing;

        loop {
            tracing::debug!(attempt, %stage, "pipeline stage");
            stage = match stage {
                Stage::Proposing => {
                    tracing::info!(attempt, max_attempts, location = location_name, %trip_type, "proposing waypoints");
                    match proposer.propose(location_name, trip_type, attempt > 1).await {
                        Ok(waypoints) => Stage::Snapping(waypoints),
                        Err(err) => {
                            self.next_attempt(&mut attempt, err.into(), rules.proposal_retry_delay_ms)
                                .await
                        }
                    }
                }
                Stage::Snapping(waypoints) => {
                    match snap_waypoints(self.snapper.as_ref(), &waypoints, trip_type, rules).await {
                        Ok(snapped) => Stage::Building(snapped),
                        Err(err) => {
                            self.next_attempt(&mut attempt, err.into(), rules.route_retry_delay_ms)
                                .await
                        }
                    }
                }
                Stage::Building(snapped) => {
                    let coordinates = prepare_coordinates(&snapped, trip_type, rules);
                    match builder.build(&coordinates).await {
                        Ok(feature) => Stage::Enforcing { snapped, feature },
                        Err(err) => {
                            self.next_attempt(&mut attempt, err.into(), rules.route_retry_delay_ms)
                                .await
                        }
                    }
                }
                Stage::Enforcing { snapped, feature } => {
                    match enforcer.enforce(trip_type, &snapped, feature).await {
                        Ok(route) => Stage::Done(route),
                        Err(err) => {
                            self.next_attempt(&mut attempt, err.into(), rules.route_retry_delay_ms)
                                .await
                        }
                    }
                }
                Stage::Done(route) => {
                    tracing::info!(
                        attempt,
                        km = route.total_distance_km,
                        days = route.daily_routes.len(),
                        "trip planned"
                    );
                    return Ok(route);
                }
                Stage::Failed(err) => return Err(err),
            };
        }
    }

    async fn next_attempt(&self, attempt: &mut u32, err: PlanError, pause_ms: u64) -> Stage {
        let max_attempts = self.rules.max_pipeline_attempts.max(1);
        tracing::warn!(attempt = *attempt, max_attempts, error = %err, "planning attempt failed");

        if *attempt >= max_attempts {
            tracing::error!(attempts = *attempt, "planning attempts exhausted");
            return Stage::Failed(PlanError::Exhausted {
                attempts: *attempt,
                last: Box::new(err),
            });
        }

        *attempt += 1;
        if pause_ms > 0 {
            tokio::time::sleep(Duration::from_millis(pause_ms)).await;
        }
        Stage::Proposing
    }
}
