/// Planar route bounds with margin expansion
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned XY rectangle in local metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2D {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds2D {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// XY extents of a point set. Empty input gives the zero box.
    pub fn from_points_xy(points: &[DVec3]) -> Self {
        if points.is_empty() {
            return Self::new(0.0, 0.0, 0.0, 0.0);
        }

        let mut bounds = Self::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for p in points {
            bounds.update(p.x, p.y);
        }
        bounds
    }

    /// Grow to include a point
    pub fn update(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// Grow all four edges by `margin`
    pub fn expand(&self, margin: f64) -> Self {
        self.expand_xy(margin, margin)
    }

    /// Grow the X and Y edges by separate margins
    pub fn expand_xy(&self, margin_x: f64, margin_y: f64) -> Self {
        Self::new(
            self.min_x - margin_x,
            self.min_y - margin_y,
            self.max_x + margin_x,
            self.max_y + margin_y,
        )
    }

    pub fn size_x(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn size_y(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// World XY of grid node (ix, iy) on a `size`×`size` lattice spanning the bounds
    pub fn grid_point(&self, ix: usize, iy: usize, size: usize) -> (f64, f64) {
        let denom = size.saturating_sub(1).max(1) as f64;
        let fx = ix as f64 / denom;
        let fy = iy as f64 / denom;
        (
            self.min_x + fx * self.size_x(),
            self.min_y + fy * self.size_y(),
        )
    }
}

/// Route bounds grown by a non-negative margin, as used to frame the terrain.
pub fn compute_route_bounds(points: &[DVec3], margin_m: f64) -> Bounds2D {
    Bounds2D::from_points_xy(points).expand(margin_m.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_points_give_zero_box() {
        assert_eq!(Bounds2D::from_points_xy(&[]), Bounds2D::new(0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn extents_and_margin() {
        let pts = [
            DVec3::new(-3.0, 2.0, 100.0),
            DVec3::new(5.0, -1.0, 0.0),
            DVec3::new(1.0, 7.0, 50.0),
        ];
        let b = Bounds2D::from_points_xy(&pts);
        assert_eq!(b, Bounds2D::new(-3.0, -1.0, 5.0, 7.0));

        let e = b.expand(10.0);
        assert_eq!(e, Bounds2D::new(-13.0, -11.0, 15.0, 17.0));

        let xy = b.expand_xy(1.0, 2.0);
        assert_eq!(xy, Bounds2D::new(-4.0, -3.0, 6.0, 9.0));
    }

    #[test]
    fn negative_route_margin_is_ignored() {
        let pts = [DVec3::ZERO, DVec3::new(10.0, 10.0, 0.0)];
        assert_eq!(compute_route_bounds(&pts, -5.0), Bounds2D::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn grid_points_span_bounds() {
        let b = Bounds2D::new(0.0, -10.0, 100.0, 10.0);
        assert_eq!(b.grid_point(0, 0, 11), (0.0, -10.0));
        assert_eq!(b.grid_point(10, 10, 11), (100.0, 10.0));
        assert_eq!(b.grid_point(5, 5, 11), (50.0, 0.0));
    }
}
