/// Generation parameters and the detail/style derivation of terrain tunables
use crate::coupling::{CouplingParams, TransitionParams};
use crate::crossfall::CrossfallParams;
use crate::error::{BuildError, Result};
use crate::heightmap::SynthesisParams;
use crate::relaxation::RelaxationParams;
use constants::detail::{MAX_DETAIL, MIN_DETAIL, get_detail_tier};
use constants::road::{DEFAULT_ROAD_OFFSET_M, DEFAULT_ROAD_WIDTH_M};
use constants::terrain::{
    CARVE_MARGIN_MIN_M, CARVE_MARGIN_WIDTH_FRACTION, DEFAULT_NOISE_SEED, MAX_SLOPE_M_PER_M,
    PIN_MARGIN_MIN_M, PIN_MARGIN_WIDTH_FRACTION, ROUTE_BLEND_EXTRA_M, SMOOTH_STRENGTH,
    UNDULATION_AMPLITUDE_M, UNDULATION_FREQUENCY,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Every user-facing option of a generation run. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Grid resolution and iteration tier, 1 (coarse) to 5 (fine).
    pub detail: u8,
    /// 0 = natural and flat, 1 = dramatic.
    pub style: f64,
    /// Undulation noise seed; 0 picks the built-in default.
    pub seed: u32,
    pub road_width_m: f64,
    /// Lift applied to the whole road after banking.
    pub road_offset_m: f64,
    /// Depth of the trench carved under the road into the terrain.
    pub road_embed_m: f64,
    /// Slab thickness below the road surface; 0 keeps a flat ribbon.
    pub road_thickness_m: f64,
    pub terrain_margin_m: f64,
    pub gpx_smoothing_window: usize,
    pub gpx_smoothing_iterations: usize,
    /// 3D min-step for the road route; 0 keeps every point.
    pub road_simplify_step_m: f64,
    pub create_route_curve: bool,
    pub create_road_mesh: bool,
    pub create_terrain: bool,
    pub crossfall: CrossfallParams,
    pub coupling: CouplingParams,
    pub transition: TransitionParams,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            detail: 3,
            style: 0.6,
            seed: DEFAULT_NOISE_SEED,
            road_width_m: DEFAULT_ROAD_WIDTH_M,
            road_offset_m: DEFAULT_ROAD_OFFSET_M,
            road_embed_m: 0.0,
            road_thickness_m: 0.0,
            terrain_margin_m: 200.0,
            gpx_smoothing_window: 0,
            gpx_smoothing_iterations: 0,
            road_simplify_step_m: 0.0,
            create_route_curve: true,
            create_road_mesh: true,
            create_terrain: true,
            crossfall: CrossfallParams::default(),
            coupling: CouplingParams::default(),
            transition: TransitionParams::default(),
        }
    }
}

impl GenerationConfig {
    /// Read a JSON config file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Clamp detail and style into range and reject unusable lengths.
    pub fn validate(mut self) -> Result<Self> {
        self.detail = self.detail.clamp(MIN_DETAIL, MAX_DETAIL);
        if !self.style.is_finite() {
            return Err(BuildError::InvalidConfig(format!("style must be finite, got {}", self.style)));
        }
        self.style = self.style.clamp(0.0, 1.0);

        let lengths = [
            ("road_width_m", self.road_width_m),
            ("road_embed_m", self.road_embed_m),
            ("road_thickness_m", self.road_thickness_m),
            ("terrain_margin_m", self.terrain_margin_m),
            ("road_simplify_step_m", self.road_simplify_step_m),
            ("crossfall.max_bank_slope_m_per_m", self.crossfall.max_bank_slope_m_per_m),
            ("coupling.clearance_m", self.coupling.clearance_m),
            ("coupling.xy_margin_m", self.coupling.xy_margin_m),
            ("transition.transition_width_m", self.transition.transition_width_m),
            ("transition.flat_width_m", self.transition.flat_width_m),
            ("transition.clearance_m", self.transition.clearance_m),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(BuildError::InvalidConfig(format!(
                    "{} must be a finite, non-negative number, got {}",
                    name, value
                )));
            }
        }

        let signed = [
            ("road_offset_m", self.road_offset_m),
            ("crossfall.bank_gain", self.crossfall.bank_gain),
            ("crossfall.deadband", self.crossfall.deadband),
        ];
        for (name, value) in signed {
            if !value.is_finite() {
                return Err(BuildError::InvalidConfig(format!("{} must be finite, got {}", name, value)));
            }
        }
        Ok(self)
    }

    pub fn effective_seed(&self) -> u32 {
        if self.seed == 0 { DEFAULT_NOISE_SEED } else { self.seed }
    }
}

/// Terrain tunables resolved from detail level, style and road width.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainParams {
    pub synthesis: SynthesisParams,
    pub relaxation: RelaxationParams,
    /// Planar min-step for thinning the terrain route.
    pub route_simplify_step_m: f64,
    /// Point budget for the thinned terrain route.
    pub route_max_points: usize,
}

impl TerrainParams {
    pub fn derive(config: &GenerationConfig) -> Self {
        let tier = get_detail_tier(config.detail);
        let style = config.style.clamp(0.0, 1.0);

        let width = config.road_width_m.max(0.0);
        let half_w = width * 0.5;
        let pin_r = half_w + PIN_MARGIN_MIN_M.max(PIN_MARGIN_WIDTH_FRACTION * width);
        let blend_r = pin_r + ROUTE_BLEND_EXTRA_M.at(style);
        let carve_r = pin_r.max(half_w + CARVE_MARGIN_MIN_M.max(CARVE_MARGIN_WIDTH_FRACTION * width));

        Self {
            synthesis: SynthesisParams {
                grid_resolution: tier.grid_resolution,
                multiscale_iterations: tier.multiscale_iterations,
                initial_scale_divisor: tier.initial_scale_divisor,
                pin_radius_m: pin_r,
                route_blend_radius_m: blend_r,
                undulation_amplitude_m: UNDULATION_AMPLITUDE_M.at(style),
                undulation_frequency: UNDULATION_FREQUENCY.at(style),
                seed: config.effective_seed(),
                carve_depth_m: config.road_embed_m.max(0.0),
                carve_radius_m: carve_r,
            },
            relaxation: RelaxationParams {
                max_slope_m_per_m: MAX_SLOPE_M_PER_M.at(style),
                slope_iterations: tier.slope_iterations,
                smooth_strength: SMOOTH_STRENGTH.at(style),
                smooth_iterations: tier.smooth_iterations,
            },
            route_simplify_step_m: tier.route_simplify_step_m,
            route_max_points: tier.route_max_points,
        }
    }
}
