/// WGS84 equatorial radius used by the local equirectangular projection (metres)
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Squared planar distance below which two route points count as coincident
pub const COINCIDENT_EPSILON_SQ: f64 = 1e-6;

/// Total arc length below which a route is treated as a single location
pub const DEGENERATE_LENGTH_M: f64 = 1e-6;
