/// Planar UV tile size for the terrain grid mesh (metres per UV unit)
pub const TERRAIN_UV_TILE_M: f64 = 5.0;

/// Smallest grid edge the multiscale synthesizer will work at
pub const MIN_GRID_SIZE: usize = 8;

/// Fallback noise seed when the caller passes zero
pub const DEFAULT_NOISE_SEED: u32 = 140_230;

/// Style-interpolated tuning pair: value at style 0 (natural) and style 1 (dramatic)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleRange {
    pub natural: f64,
    pub dramatic: f64,
}

impl StyleRange {
    /// Linear interpolation between the natural and dramatic endpoints
    pub fn at(&self, style: f64) -> f64 {
        let t = style.clamp(0.0, 1.0);
        self.natural + (self.dramatic - self.natural) * t
    }
}

/// Extra blend distance beyond the pin radius where the route profile fades out
pub const ROUTE_BLEND_EXTRA_M: StyleRange = StyleRange {
    natural: 25.0,
    dramatic: 10.0,
};

/// Undulation noise amplitude (metres)
pub const UNDULATION_AMPLITUDE_M: StyleRange = StyleRange {
    natural: 3.0,
    dramatic: 18.0,
};

/// Undulation noise frequency (cycles per metre)
pub const UNDULATION_FREQUENCY: StyleRange = StyleRange {
    natural: 0.0018,
    dramatic: 0.006,
};

/// Maximum terrain slope enforced by the slope limiter (m/m)
pub const MAX_SLOPE_M_PER_M: StyleRange = StyleRange {
    natural: 0.25,
    dramatic: 0.85,
};

/// Laplacian smoothing blend strength
pub const SMOOTH_STRENGTH: StyleRange = StyleRange {
    natural: 0.55,
    dramatic: 0.10,
};

/// Minimum pin margin added to the road half width (metres)
pub const PIN_MARGIN_MIN_M: f64 = 0.25;

/// Pin margin as a fraction of the road width
pub const PIN_MARGIN_WIDTH_FRACTION: f64 = 0.05;

/// Minimum carve margin added to the road half width (metres)
pub const CARVE_MARGIN_MIN_M: f64 = 1.0;

/// Carve margin as a fraction of the road width
pub const CARVE_MARGIN_WIDTH_FRACTION: f64 = 0.2;
