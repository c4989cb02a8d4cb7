/// Terrain adjustments around the finished road surface
use crate::bounds::Bounds2D;
use crate::math::{lerp, smoothstep};
use crate::mesh::Mesh;
use crate::raycast::{ClosestPoint, RaySurface};
use constants::road::{
    COUPLING_CLEARANCE_M, COUPLING_RAY_PAD_M, COUPLING_XY_MARGIN_M, TRANSITION_CLEARANCE_M,
    TRANSITION_FLAT_WIDTH_M, TRANSITION_WIDTH_M,
};
use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouplingParams {
    /// Terrain ends at least this far below the road surface.
    pub clearance_m: f64,
    /// Road bounding box grows by this much in X and Y before selecting vertices.
    pub xy_margin_m: f64,
}

impl Default for CouplingParams {
    fn default() -> Self {
        Self {
            clearance_m: COUPLING_CLEARANCE_M,
            xy_margin_m: COUPLING_XY_MARGIN_M,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionParams {
    pub enabled: bool,
    /// Terrain further than this from the road (planar) is untouched.
    pub transition_width_m: f64,
    /// Within this distance terrain follows the road fully.
    pub flat_width_m: f64,
    pub clearance_m: f64,
}

impl Default for TransitionParams {
    fn default() -> Self {
        Self {
            enabled: false,
            transition_width_m: TRANSITION_WIDTH_M,
            flat_width_m: TRANSITION_FLAT_WIDTH_M,
            clearance_m: TRANSITION_CLEARANCE_M,
        }
    }
}

/// Push terrain vertices under the road down to `road - clearance`.
///
/// Only vertices inside the road's XY bounding box (plus margin) are considered. Each casts a
/// ray down from above the road and one up from below it; the lower of the two surface hits
/// sets the target. Vertices are never raised and a missed downward ray leaves the vertex
/// alone. Returns the number of vertices moved.
pub fn lower_terrain_under_road<S: RaySurface + Sync>(
    terrain: &mut Mesh,
    road: &Mesh,
    surface: &S,
    params: &CouplingParams,
) -> usize {
    let Some((road_min, road_max)) = road.aabb() else {
        return 0;
    };
    if !(road_min.is_finite() && road_max.is_finite()) {
        return 0;
    }

    let footprint = Bounds2D::new(road_min.x, road_min.y, road_max.x, road_max.y)
        .expand(params.xy_margin_m.max(0.0));

    let clearance = params.clearance_m.max(0.0);
    let ray_pad = COUPLING_RAY_PAD_M + clearance;
    let origin_above_z = road_max.z + ray_pad;
    let origin_below_z = road_min.z - ray_pad;
    let ray_len = ((road_max.z - road_min.z) + 2.0 * ray_pad + 10.0).max(1.0);

    let moved: usize = terrain
        .positions
        .par_iter_mut()
        .map(|p| {
            if !footprint.contains_xy(p.x, p.y) {
                return 0;
            }
            let Some(top) =
                surface.ray_cast(DVec3::new(p.x, p.y, origin_above_z), DVec3::NEG_Z, ray_len)
            else {
                return 0;
            };
            let bottom =
                surface.ray_cast(DVec3::new(p.x, p.y, origin_below_z), DVec3::Z, ray_len);

            let ref_z = bottom.map_or(top.position.z, |b| top.position.z.min(b.position.z));
            let target_z = ref_z - clearance;
            if p.z > target_z {
                p.z = target_z;
                1
            } else {
                0
            }
        })
        .sum();

    debug!("Lowered {} terrain vertices under the road", moved);
    moved
}

/// Ease terrain near the road toward the road surface.
///
/// For every vertex within `transition_width_m` (planar) of its closest road point, height
/// blends toward `road_z - clearance` with weight 1 inside `flat_width_m`, falling off by
/// smoothstep to 0 at the transition width. Unlike coupling this can raise terrain. Returns
/// the number of vertices with a non-zero blend weight.
pub fn blend_terrain_to_road<S: ClosestPoint + Sync>(
    terrain: &mut Mesh,
    surface: &S,
    params: &TransitionParams,
) -> usize {
    let width = params.transition_width_m.max(0.0);
    let flat = params.flat_width_m.clamp(0.0, width);
    let clearance = params.clearance_m.max(0.0);

    let touched: usize = terrain
        .positions
        .par_iter_mut()
        .map(|p| {
            let Some(closest) = surface.closest_point(*p) else {
                return 0;
            };
            let d = (p.truncate() - closest.position.truncate()).length();
            if d > width {
                return 0;
            }
            let f = 1.0 - smoothstep(flat, width, d);
            if f <= 0.0 {
                return 0;
            }
            p.z = lerp(p.z, closest.position.z - clearance, f);
            1
        })
        .sum();

    debug!("Blended {} terrain vertices toward the road", touched);
    touched
}
