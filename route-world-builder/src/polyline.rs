/// Route polyline smoothing, thinning and arc-length resampling
use constants::geo::{COINCIDENT_EPSILON_SQ, DEGENERATE_LENGTH_M};
use glam::DVec3;
use tracing::debug;

/// Moving-average smoothing with a double buffer per pass.
/// Endpoints never move. No-op for `window < 1`, `iterations < 1` or fewer than 3 points.
pub fn smooth_polyline(points: &[DVec3], window: usize, iterations: usize) -> Vec<DVec3> {
    if window < 1 || iterations < 1 || points.len() < 3 {
        return points.to_vec();
    }

    let len = points.len();
    // Any window past the point count already spans the whole route.
    let window = window.min(len);
    let mut current = points.to_vec();
    let mut next = current.clone();

    for _ in 0..iterations {
        for i in 1..len - 1 {
            let start = i.saturating_sub(window);
            let end = (i + window + 1).min(len);
            let sum: DVec3 = current[start..end].iter().copied().sum();
            next[i] = sum / (end - start) as f64;
        }
        std::mem::swap(&mut current, &mut next);
    }

    current
}

/// Keep a point only once it is at least `min_step_m` (3D distance) from the last kept point.
/// The first point is always kept and the last point is forced in if it was dropped.
pub fn simplify_polyline(points: &[DVec3], min_step_m: f64) -> Vec<DVec3> {
    simplify_by(points, min_step_m, |a, b| (a - b).length_squared())
}

/// Planar variant of [`simplify_polyline`]: elevation is ignored when measuring steps.
pub fn simplify_polyline_xy(points: &[DVec3], min_step_m: f64) -> Vec<DVec3> {
    simplify_by(points, min_step_m, |a, b| (a - b).truncate().length_squared())
}

fn simplify_by(points: &[DVec3], min_step_m: f64, dist_sq: impl Fn(DVec3, DVec3) -> f64) -> Vec<DVec3> {
    if min_step_m <= 0.0 || points.len() <= 2 {
        return points.to_vec();
    }

    let min_step_sq = min_step_m * min_step_m;
    let mut out = vec![points[0]];
    let mut last = points[0];
    for &p in &points[1..] {
        if dist_sq(p, last) >= min_step_sq {
            out.push(p);
            last = p;
        }
    }

    let tail = points[points.len() - 1];
    if dist_sq(last, tail) > COINCIDENT_EPSILON_SQ {
        out.push(tail);
    }
    out
}

/// Cumulative planar arc length at each vertex, starting at 0.
pub fn cumulative_length_xy(points: &[DVec3]) -> Vec<f64> {
    let mut cum = Vec::with_capacity(points.len());
    let mut acc = 0.0;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            acc += (*p - points[i - 1]).truncate().length();
        }
        cum.push(acc);
    }
    cum
}

/// Thin a route to at most `max_points` vertices picked at uniform arc-length spacing.
/// First and last points are always kept; a route with no length collapses to its two ends.
pub fn resample_to_budget(points: &[DVec3], max_points: usize) -> Vec<DVec3> {
    let max_points = max_points.max(2);
    if points.len() <= max_points {
        return points.to_vec();
    }

    let n = points.len();
    let cum = cumulative_length_xy(points);
    let total = cum[n - 1];
    if total <= DEGENERATE_LENGTH_M {
        debug!("route has no planar length, collapsing to endpoints");
        return vec![points[0], points[n - 1]];
    }

    let step = total / (max_points - 1) as f64;
    let mut sampled = Vec::with_capacity(max_points);
    sampled.push(points[0]);

    let mut target = step;
    let mut j = 1;
    while sampled.len() < max_points - 1 && j < n - 1 {
        while j < n - 1 && cum[j] < target {
            j += 1;
        }
        if j >= n - 1 {
            break;
        }
        sampled.push(points[j]);
        // Skip targets this vertex already covers so it is never picked twice.
        while target <= cum[j] {
            target += step;
        }
        j += 1;
    }

    sampled.push(points[n - 1]);
    sampled
}
