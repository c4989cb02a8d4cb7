/// Geographic track points and the local planar projection
use constants::geo::EARTH_RADIUS_M;
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A single track sample in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Elevation in metres.
    pub elevation: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64, elevation: f64) -> Self {
        Self {
            lat,
            lon,
            elevation,
        }
    }
}

/// Project geographic points to local metres with an equirectangular approximation.
/// The first point is the anchor: it maps to (0, 0, elevation). Empty input yields an empty route.
pub fn project_to_local_meters(points: &[GeoPoint]) -> Vec<DVec3> {
    let Some(anchor) = points.first() else {
        return Vec::new();
    };

    let lat0 = anchor.lat.to_radians();
    let lon0 = anchor.lon.to_radians();
    let cos_lat0 = lat0.cos();

    points
        .iter()
        .map(|p| {
            let x = (p.lon.to_radians() - lon0) * cos_lat0 * EARTH_RADIUS_M;
            let y = (p.lat.to_radians() - lat0) * EARTH_RADIUS_M;
            DVec3::new(x, y, p.elevation)
        })
        .collect()
}
