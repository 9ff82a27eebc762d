#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Catmull-Rom smoothing of tile-center waypoint chains.
//!
//! Pathfinding produces sequences of tile centers, which read as jagged
//! staircase motion when followed directly. This system interpolates a
//! Catmull-Rom spline through the chain so continuous movement follows a
//! curve instead. The spline passes through every input waypoint, so the
//! smoothed path never drifts away from the tiles the pathfinder validated.

use gridlock_core::WorldPoint;

/// Interpolates a Catmull-Rom spline through the provided waypoints.
///
/// Each consecutive waypoint pair becomes `subdivisions` curve samples; the
/// final waypoint is appended exactly so the path still terminates on the
/// goal tile center. Chains with fewer than two points pass through
/// unchanged, as does a `subdivisions` of zero.
#[must_use]
pub fn smooth(waypoints: &[WorldPoint], subdivisions: u32) -> Vec<WorldPoint> {
    if waypoints.len() < 2 || subdivisions == 0 {
        return waypoints.to_vec();
    }

    let last = waypoints.len() - 1;
    let mut curve = Vec::with_capacity(last * subdivisions as usize + 1);
    for segment in 0..last {
        // Endpoint segments clamp the control window by repeating the
        // boundary waypoint.
        let p0 = waypoints[segment.saturating_sub(1)];
        let p1 = waypoints[segment];
        let p2 = waypoints[segment + 1];
        let p3 = waypoints[(segment + 2).min(last)];

        for step in 0..subdivisions {
            let t = step as f32 / subdivisions as f32;
            curve.push(sample(p0, p1, p2, p3, t));
        }
    }
    curve.push(waypoints[last]);
    curve
}

fn sample(p0: WorldPoint, p1: WorldPoint, p2: WorldPoint, p3: WorldPoint, t: f32) -> WorldPoint {
    let t2 = t * t;
    let t3 = t2 * t;
    let point = p1 * 2.0
        + (p2 - p0) * t
        + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
        + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3;
    point * 0.5
}
