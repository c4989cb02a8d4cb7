/// Road UV tile size (metres per UV unit, both across and along the ribbon)
pub const ROAD_UV_TILE_M: f64 = 6.0;

/// Smallest UV tile size accepted before division
pub const MIN_UV_TILE_M: f64 = 0.001;

/// Default road width (metres)
pub const DEFAULT_ROAD_WIDTH_M: f64 = 6.0;

/// Default lift applied to the road ribbon to avoid z-fighting with terrain
pub const DEFAULT_ROAD_OFFSET_M: f64 = 0.05;

/// Crossfall: maximum bank as height change per metre of half width
pub const MAX_BANK_SLOPE_M_PER_M: f64 = 0.05;

/// Crossfall: multiplier from signed curvature (rad/m) to bank slope
pub const BANK_GAIN: f64 = 4.0;

/// Crossfall: banks with smaller magnitude are flattened to zero
pub const BANK_DEADBAND: f64 = 0.002;

/// Coupling: vertical gap kept between lowered terrain and the road underside
pub const COUPLING_CLEARANCE_M: f64 = 0.02;

/// Coupling: planar margin added to the road bounding box
pub const COUPLING_XY_MARGIN_M: f64 = 2.0;

/// Coupling: extra ray start distance above and below the road bounding box
pub const COUPLING_RAY_PAD_M: f64 = 10.0;

/// Transition: width of the blend band around the road
pub const TRANSITION_WIDTH_M: f64 = 10.0;

/// Transition: inner band snapped fully to the road surface
pub const TRANSITION_FLAT_WIDTH_M: f64 = 1.0;

/// Transition: clearance below the road surface
pub const TRANSITION_CLEARANCE_M: f64 = 0.02;
