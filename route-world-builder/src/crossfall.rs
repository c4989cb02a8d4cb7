/// Curvature-driven banking of the road ribbon
use crate::mesh::Mesh;
use constants::geo::DEGENERATE_LENGTH_M;
use constants::road::{BANK_DEADBAND, BANK_GAIN, MAX_BANK_SLOPE_M_PER_M};
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossfallParams {
    /// Bank never exceeds this slope, metres of drop per metre across.
    pub max_bank_slope_m_per_m: f64,
    /// Bank slope per unit of curvature (1/m).
    pub bank_gain: f64,
    /// Banks with smaller magnitude are flattened to zero.
    pub deadband: f64,
}

impl Default for CrossfallParams {
    fn default() -> Self {
        Self {
            max_bank_slope_m_per_m: MAX_BANK_SLOPE_M_PER_M,
            bank_gain: BANK_GAIN,
            deadband: BANK_DEADBAND,
        }
    }
}

/// Signed planar curvature at route point `i`, positive for a left turn.
///
/// Turn angle between the incoming and outgoing segments over their mean length. Endpoints
/// reuse themselves as the missing neighbour and therefore read as straight.
pub fn curvature_at(route: &[DVec3], i: usize) -> f64 {
    let n = route.len();
    let p0 = route[i.saturating_sub(1)];
    let p1 = route[i];
    let p2 = route[(i + 1).min(n - 1)];

    let a = DVec2::new(p1.x - p0.x, p1.y - p0.y);
    let b = DVec2::new(p2.x - p1.x, p2.y - p1.y);
    let (la, lb) = (a.length(), b.length());
    if la <= DEGENERATE_LENGTH_M || lb <= DEGENERATE_LENGTH_M {
        return 0.0;
    }

    let angle = a.perp_dot(b).atan2(a.dot(b));
    let s = 0.5 * (la + lb);
    if s <= DEGENERATE_LENGTH_M {
        return 0.0;
    }
    angle / s
}

/// Bank slope for a curvature value after gain, clamping and deadband.
pub fn bank_for_curvature(curvature: f64, params: &CrossfallParams) -> f64 {
    let max_bank = params.max_bank_slope_m_per_m.max(0.0);
    let bank = (curvature * params.bank_gain).clamp(-max_bank, max_bank);
    if bank.abs() < params.deadband {
        0.0
    } else {
        bank
    }
}

/// Tilt each cross-section of a road ribbon about its centre.
///
/// Expects the ribbon layout of [`crate::mesh::build_road_mesh`]: ring `i` has its left
/// vertex at `2i` and right vertex at `2i + 1`. The left edge drops by `bank * half_width`
/// and the right edge rises by the same amount, so the centre height is kept. Returns the
/// bank applied at each ring; an incompatible mesh is left untouched and yields zeros.
pub fn apply_crossfall(
    road: &mut Mesh,
    route: &[DVec3],
    road_width_m: f64,
    params: &CrossfallParams,
) -> Vec<f64> {
    let n = route.len();
    let mut banks = vec![0.0; n];
    if n < 2 {
        return banks;
    }
    if road.positions.len() < 2 * n {
        warn!(
            "Road mesh has {} vertices, expected at least {}; crossfall skipped",
            road.positions.len(),
            2 * n
        );
        return banks;
    }

    let half_w = road_width_m * 0.5;
    if half_w <= DEGENERATE_LENGTH_M {
        return banks;
    }

    for (i, bank_out) in banks.iter_mut().enumerate() {
        let bank = bank_for_curvature(curvature_at(route, i), params);
        let (li, ri) = (2 * i, 2 * i + 1);
        let z_avg = 0.5 * (road.positions[li].z + road.positions[ri].z);
        road.positions[li].z = z_avg - bank * half_w;
        road.positions[ri].z = z_avg + bank * half_w;
        *bank_out = bank;
    }

    let banked = banks.iter().filter(|b| **b != 0.0).count();
    debug!("Crossfall banked {}/{} road rings", banked, n);
    banks
}
