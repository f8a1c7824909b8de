//! Defensive parsing and geometric validation of model-proposed waypoints.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::{LonLat, Waypoint, WaypointPayload};
use crate::rules::PlanningRules;
use crate::spatial::vertex_angle_deg;

/// Strategies tried, in order, to recover JSON from free model text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// The whole response is JSON.
    Direct,
    /// The first `{` through the last `}`.
    BraceBlock,
    /// Code fences and trailing commas stripped.
    Repaired,
}

impl ParseStrategy {
    pub const ORDER: [ParseStrategy; 3] = [
        ParseStrategy::Direct,
        ParseStrategy::BraceBlock,
        ParseStrategy::Repaired,
    ];

    fn candidate(self, text: &str) -> Option<String> {
        match self {
            ParseStrategy::Direct => Some(text.to_string()),
            ParseStrategy::BraceBlock => brace_block_re()
                .find(text)
                .map(|found| found.as_str().to_string()),
            ParseStrategy::Repaired => Some(repair_json(text)),
        }
    }
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParseStrategy::Direct => "direct",
            ParseStrategy::BraceBlock => "brace-block",
            ParseStrategy::Repaired => "repaired",
        };
        f.write_str(label)
    }
}

/// Result of running every strategy over a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed { value: T, strategy: ParseStrategy },
    Failed { errors: Vec<(ParseStrategy, String)> },
}

fn brace_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[\s\S]*\}").expect("invalid brace block regex"))
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json)?\s*").expect("invalid fence regex"))
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*([}\]])").expect("invalid trailing comma regex"))
}

fn repair_json(text: &str) -> String {
    let unfenced = fence_re().replace_all(text, "");
    trailing_comma_re().replace_all(&unfenced, "$1").into_owned()
}

/// Try each [`ParseStrategy`] in order and return the first value that
/// deserializes, or every strategy's error.
pub fn parse_with_fallbacks<T: DeserializeOwned>(text: &str) -> ParseOutcome<T> {
    let mut errors = Vec::new();
    for strategy in ParseStrategy::ORDER {
        let Some(candidate) = strategy.candidate(text) else {
            errors.push((strategy, "no JSON object found".to_string()));
            continue;
        };
        match serde_json::from_str::<T>(&candidate) {
            Ok(value) => return ParseOutcome::Parsed { value, strategy },
            Err(err) => errors.push((strategy, err.to_string())),
        }
    }
    ParseOutcome::Failed { errors }
}

/// Parse a `{"waypoints": [...]}` payload out of a model response.
pub fn parse_waypoint_payload(text: &str) -> ParseOutcome<WaypointPayload> {
    parse_with_fallbacks(text)
}

/// Why a proposed waypoint set was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WaypointIssue {
    #[error("too few waypoints ({count} < {min})")]
    TooFew { count: usize, min: usize },
    #[error("too many waypoints ({count} > {max})")]
    TooMany { count: usize, max: usize },
    #[error("waypoint {index} has out-of-range coordinates ({lat}, {lng})")]
    OutOfRange { index: usize, lat: f64, lng: f64 },
    #[error("waypoint {index} is a placeholder near (0, 0)")]
    NearOrigin { index: usize },
    #[error("waypoints form a near-straight line ({fraction:.2} of angles straight)")]
    StraightLine { fraction: f64 },
}

/// Share of interior angles wider than `straight_angle_deg`.
///
/// `None` when no angle could be measured.
pub fn straight_angle_fraction(waypoints: &[Waypoint], straight_angle_deg: f64) -> Option<f64> {
    let points: Vec<LonLat> = waypoints.iter().map(Waypoint::lon_lat).collect();
    let mut straight = 0usize;
    let mut total = 0usize;
    for triple in points.windows(3) {
        let Some(angle) = vertex_angle_deg(triple[0], triple[1], triple[2]) else {
            continue;
        };
        total += 1;
        if angle > straight_angle_deg {
            straight += 1;
        }
    }
    if total == 0 {
        None
    } else {
        Some(straight as f64 / total as f64)
    }
}

/// Collect every problem with a proposed waypoint set.
pub fn check_waypoints(waypoints: &[Waypoint], rules: &PlanningRules) -> Vec<WaypointIssue> {
    let mut issues = Vec::new();
    let count = waypoints.len();
    if count < rules.min_waypoints {
        issues.push(WaypointIssue::TooFew {
            count,
            min: rules.min_waypoints,
        });
        return issues;
    }
    if count > rules.max_waypoints {
        issues.push(WaypointIssue::TooMany {
            count,
            max: rules.max_waypoints,
        });
    }

    for (index, wp) in waypoints.iter().enumerate() {
        let in_range = wp.lat.is_finite()
            && wp.lng.is_finite()
            && wp.lat.abs() <= 90.0
            && wp.lng.abs() <= 180.0;
        if !in_range {
            issues.push(WaypointIssue::OutOfRange {
                index,
                lat: wp.lat,
                lng: wp.lng,
            });
            continue;
        }
        if wp.lat.abs() < rules.origin_exclusion_deg && wp.lng.abs() < rules.origin_exclusion_deg {
            issues.push(WaypointIssue::NearOrigin { index });
        }
    }

    if let Some(fraction) = straight_angle_fraction(waypoints, rules.straight_angle_deg) {
        if fraction > rules.max_straight_fraction {
            issues.push(WaypointIssue::StraightLine { fraction });
        }
    }

    issues
}

pub fn is_waypoints_valid(waypoints: &[Waypoint], rules: &PlanningRules) -> bool {
    check_waypoints(waypoints, rules).is_empty()
}

/// Waypoints that passed [`check_waypoints`].
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointSet(Vec<Waypoint>);

impl WaypointSet {
    pub fn validate(
        waypoints: Vec<Waypoint>,
        rules: &PlanningRules,
    ) -> Result<Self, Vec<WaypointIssue>> {
        let issues = check_waypoints(&waypoints, rules);
        if issues.is_empty() {
            Ok(Self(waypoints))
        } else {
            Err(issues)
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn lon_lats(&self) -> Vec<LonLat> {
        self.0.iter().map(Waypoint::lon_lat).collect()
    }
}
