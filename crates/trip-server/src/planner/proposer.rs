//! Ask the language model for candidate waypoints and vet them.

use std::fmt::Write as _;
use std::time::Duration;

use thiserror::Error;
use trip_core::{parse_waypoint_payload, ParseOutcome, PlanningRules, TripType, WaypointIssue, WaypointSet};

use crate::providers::{CompletionRequest, WaypointModel};

pub const SYSTEM_PROMPT: &str =
    "You are a JSON-only response assistant. Always respond with valid JSON only, no explanations.";

const TEMPERATURE: f64 = 0.1;
const MAX_TOKENS: u32 = 2000;

const GOOD_EXAMPLE: &str = r#"{"waypoints":[{"lat":41.3851,"lng":2.1734,"name":"Start - City Center"},{"lat":41.3942,"lng":2.1734,"name":"Viewpoint"},{"lat":41.3968,"lng":2.1656,"name":"Park Entrance"}]}"#;

#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("no parsable waypoints after {attempts} model calls")]
    Unparsable { attempts: u32 },

    #[error("waypoints rejected: {}", describe_issues(.0))]
    Rejected(Vec<WaypointIssue>),
}

fn describe_issues(issues: &[WaypointIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Prompt for one proposal. `is_retry` appends a corrective block after an
/// earlier pipeline attempt failed.
pub fn build_prompt(location: &str, trip_type: TripType, rules: &PlanningRules, is_retry: bool) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are a travel route planner. Generate waypoints for a {trip_type} route around {location}."
    );
    prompt.push_str(
        "\nREQUIREMENTS (critical):\n\
         - Generate 8-15 waypoints (logical stops/turns)\n\
         - Each waypoint MUST be on accessible streets/paths (no water/lakes/rivers/buildings)\n\
         - Spread out logically across the area (NOT a straight line)\n\
         - Each consecutive waypoint must vary in lat/lng (no uniform increments)\n\
         - Return **JSON only** with the exact fields: {\"waypoints\":[{\"lat\":<num>,\"lng\":<num>,\"name\":\"...\"}]}\n",
    );

    match trip_type {
        TripType::Cycling => {
            let _ = write!(
                prompt,
                "\nFor CYCLING:\n\
                 - A **2-day** city-to-city journey (start and end should be **different** areas/cities)\n\
                 - **Not circular**\n\
                 - Up to **{} km per day** (max {} km total)\n",
                rules.cycling_max_km_per_day,
                rules.cycling_max_total_km()
            );
        }
        TripType::Hiking => {
            let _ = write!(
                prompt,
                "\nFor HIKING:\n\
                 - **1-day CIRCULAR** route (must end where it started)\n\
                 - Total distance **{}-{} km**\n",
                rules.hiking_min_km, rules.hiking_max_km
            );
        }
    }

    let _ = write!(prompt, "\nExample of GOOD waypoints (varied, realistic):\n{GOOD_EXAMPLE}\n");

    if is_retry {
        prompt.push_str(
            "\n!!! PREVIOUS ATTEMPT HAD ISSUES. FIX THEM NOW:\n\
             - Do NOT produce a straight line\n\
             - Do NOT place points over water or off-network\n\
             - Ensure spread-out, realistic points\n\
             - For cycling: start and end different cities/areas; for hiking: circular\n",
        );
    }
    prompt
}

pub struct WaypointProposer<'a> {
    model: &'a dyn WaypointModel,
    rules: &'a PlanningRules,
}

impl<'a> WaypointProposer<'a> {
    pub fn new(model: &'a dyn WaypointModel, rules: &'a PlanningRules) -> Self {
        Self { model, rules }
    }

    /// Call the model until a response parses, then validate the waypoints.
    ///
    /// Validation failures are not retried here; the caller restarts the
    /// pipeline with `is_retry` set.
    pub async fn propose(
        &self,
        location: &str,
        trip_type: TripType,
        is_retry: bool,
    ) -> Result<WaypointSet, ProposalError> {
        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(location, trip_type, self.rules, is_retry),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let max_attempts = self.rules.max_proposal_attempts.max(1);
        let pause = Duration::from_millis(self.rules.model_retry_delay_ms);

        for attempt in 1..=max_attempts {
            tracing::debug!(attempt, max_attempts, %location, %trip_type, "requesting waypoints");

            match self.model.complete(&request).await {
                Ok(text) if text.trim().is_empty() => {
                    tracing::warn!(attempt, "empty model response");
                }
                Ok(text) => match parse_waypoint_payload(&text) {
                    ParseOutcome::Parsed { value, strategy } => {
                        tracing::debug!(attempt, %strategy, count = value.waypoints.len(), "waypoints parsed");
                        return WaypointSet::validate(value.waypoints, self.rules)
                            .map_err(ProposalError::Rejected);
                    }
                    ParseOutcome::Failed { errors } => {
                        for (strategy, err) in &errors {
                            tracing::debug!(attempt, %strategy, error = %err, "parse strategy failed");
                        }
                        tracing::warn!(attempt, "model response was not parsable");
                    }
                },
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "model call failed");
                }
            }

            if attempt < max_attempts && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        Err(ProposalError::Unparsable {
            attempts: max_attempts,
        })
    }
}
