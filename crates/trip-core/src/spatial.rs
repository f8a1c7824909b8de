//! Geodesy helpers for `[lon, lat]` polylines.
//!
//! Everything here is pure: distances, decimation, loop closure and the
//! cumulative-distance index used for prefix slicing and day splitting.

use crate::models::LonLat;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Endpoints closer than this are considered to already form a loop.
pub const LOOP_CLOSE_M: f64 = 120.0;

/// Great-circle distance in meters between two `[lon, lat]` points.
pub fn haversine_meters(a: LonLat, b: LonLat) -> f64 {
    let [lon1, lat1] = a;
    let [lon2, lat2] = b;
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Keep the first point, the last point and every `keep_every`-th index.
///
/// Polylines with two or fewer points are returned unchanged.
pub fn decimate(coords: &[LonLat], keep_every: usize) -> Vec<LonLat> {
    if coords.len() <= 2 || keep_every <= 1 {
        return coords.to_vec();
    }
    let last = coords.len() - 1;
    coords
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx == 0 || *idx == last || idx % keep_every == 0)
        .map(|(_, point)| *point)
        .collect()
}

/// Append the start point when the polyline does not already end within
/// `threshold_m` of it.
pub fn ensure_loop(mut coords: Vec<LonLat>, threshold_m: f64) -> Vec<LonLat> {
    if coords.len() < 2 {
        return coords;
    }
    let start = coords[0];
    let end = coords[coords.len() - 1];
    if haversine_meters(start, end) > threshold_m {
        coords.push(start);
    }
    coords
}

/// Running distance at each index; the first entry is always 0.
pub fn cumulative_meters(coords: &[LonLat]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(coords.len());
    if coords.is_empty() {
        return cumulative;
    }
    cumulative.push(0.0);
    for pair in coords.windows(2) {
        let previous = cumulative[cumulative.len() - 1];
        cumulative.push(previous + haversine_meters(pair[0], pair[1]));
    }
    cumulative
}

/// Total length of a polyline in meters.
pub fn path_length_m(coords: &[LonLat]) -> f64 {
    coords
        .windows(2)
        .map(|pair| haversine_meters(pair[0], pair[1]))
        .sum()
}

/// First index (from 1) whose cumulative distance reaches `max_m`.
///
/// Falls back to the last index when the polyline is shorter than `max_m`,
/// and never returns less than 1 so a prefix keeps at least two points.
pub fn prefix_end_index(cumulative: &[f64], max_m: f64) -> usize {
    let mut end = 1;
    for (idx, distance) in cumulative.iter().enumerate().skip(1) {
        end = idx;
        if *distance >= max_m {
            break;
        }
    }
    end
}

/// Index (from 1) of the point whose distance from `start` is closest to
/// `target_m`. Returns 1 for polylines with fewer than two points.
pub fn pick_index_by_radius(coords: &[LonLat], start: LonLat, target_m: f64) -> usize {
    let mut best_idx = 1;
    let mut best_diff = f64::INFINITY;
    for (idx, point) in coords.iter().enumerate().skip(1) {
        let diff = (haversine_meters(start, *point) - target_m).abs();
        if diff < best_diff {
            best_diff = diff;
            best_idx = idx;
        }
    }
    best_idx
}

/// Angle in degrees at `curr` between the segments towards `prev` and
/// `next`, measured in plain lat/lng space. A straight pass-through gives
/// 180°, a hairpin gives 0°. `None` when either segment has zero length.
pub fn vertex_angle_deg(prev: LonLat, curr: LonLat, next: LonLat) -> Option<f64> {
    let v1 = (prev[0] - curr[0], prev[1] - curr[1]);
    let v2 = (next[0] - curr[0], next[1] - curr[1]);
    let len1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let len2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if len1 == 0.0 || len2 == 0.0 {
        return None;
    }
    let cos_theta = (v1.0 * v2.0 + v1.1 * v2.1) / (len1 * len2);
    Some(cos_theta.clamp(-1.0, 1.0).acos().to_degrees())
}
