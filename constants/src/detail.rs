/// Detail tier tables: grid resolution, refinement and relaxation effort per level

/// Lowest supported detail level
pub const MIN_DETAIL: u8 = 1;

/// Highest supported detail level
pub const MAX_DETAIL: u8 = 5;

pub struct DetailTier {
    pub level: u8,
    /// Final heightmap edge length (cells)
    pub grid_resolution: usize,
    /// Number of coarse-to-fine synthesis stages
    pub multiscale_iterations: usize,
    /// Coarse grid edge = grid_resolution / divisor
    pub initial_scale_divisor: usize,
    pub slope_iterations: usize,
    pub smooth_iterations: usize,
    /// Planar min-step used to thin the terrain route (metres)
    pub route_simplify_step_m: f64,
    /// Vertex budget for the terrain route after simplification
    pub route_max_points: usize,
}

pub const DETAIL_TIERS: &[DetailTier] = &[
    DetailTier {
        level: 1,
        grid_resolution: 64,
        multiscale_iterations: 2,
        initial_scale_divisor: 32,
        slope_iterations: 20,
        smooth_iterations: 6,
        route_simplify_step_m: 10.0,
        route_max_points: 800,
    },
    DetailTier {
        level: 2,
        grid_resolution: 96,
        multiscale_iterations: 3,
        initial_scale_divisor: 32,
        slope_iterations: 30,
        smooth_iterations: 5,
        route_simplify_step_m: 7.0,
        route_max_points: 1500,
    },
    DetailTier {
        level: 3,
        grid_resolution: 128,
        multiscale_iterations: 3,
        initial_scale_divisor: 32,
        slope_iterations: 40,
        smooth_iterations: 4,
        route_simplify_step_m: 5.0,
        route_max_points: 2500,
    },
    DetailTier {
        level: 4,
        grid_resolution: 192,
        multiscale_iterations: 4,
        initial_scale_divisor: 16,
        slope_iterations: 50,
        smooth_iterations: 3,
        route_simplify_step_m: 3.0,
        route_max_points: 5000,
    },
    DetailTier {
        level: 5,
        grid_resolution: 256,
        multiscale_iterations: 5,
        initial_scale_divisor: 16,
        slope_iterations: 60,
        smooth_iterations: 2,
        route_simplify_step_m: 2.0,
        route_max_points: 8000,
    },
];

/// Look up the tier for a detail level, clamping out-of-range levels
pub fn get_detail_tier(level: u8) -> &'static DetailTier {
    let level = level.clamp(MIN_DETAIL, MAX_DETAIL);
    DETAIL_TIERS
        .iter()
        .find(|t| t.level == level)
        .unwrap_or(&DETAIL_TIERS[0])
}
