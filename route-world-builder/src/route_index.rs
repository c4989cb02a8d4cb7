/// Grid-bucketed nearest-point queries against the route polyline
use crate::math::lerp;
use glam::DVec3;

/// Upper bound on grid cells per axis; keeps ring walks for far-away queries cheap.
const MAX_CELLS_PER_AXIS: f64 = 64.0;
const MIN_CELL_SIZE_M: f64 = 0.5;
/// Slack on the ring lower bound, absorbs rounding at cell borders.
const BOUND_SLACK_M: f64 = 1e-6;

/// Nearest route point to a planar query position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSample {
    /// Planar distance to the nearest point on the route (metres).
    pub distance: f64,
    /// Route height at that point, interpolated along its segment.
    pub height: f64,
}

/// Spatial index over route segments.
///
/// Queries return exactly what a linear scan over every segment would return, including
/// tie-breaking towards the lowest segment index, so swapping the index in never changes
/// synthesized terrain.
pub struct RouteIndex<'a> {
    points: &'a [DVec3],
    origin_x: f64,
    origin_y: f64,
    cell: f64,
    inv_cell: f64,
    nx: i64,
    ny: i64,
    cells: Vec<Vec<u32>>,
}

impl<'a> RouteIndex<'a> {
    pub fn new(points: &'a [DVec3]) -> Self {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if points.is_empty() {
            (min_x, min_y, max_x, max_y) = (0.0, 0.0, 0.0, 0.0);
        }

        let extent = (max_x - min_x).max(max_y - min_y);
        let cell = (extent / MAX_CELLS_PER_AXIS).max(MIN_CELL_SIZE_M);
        let inv_cell = 1.0 / cell;
        let nx = (((max_x - min_x) * inv_cell).floor() as i64 + 1).max(1);
        let ny = (((max_y - min_y) * inv_cell).floor() as i64 + 1).max(1);

        let mut index = Self {
            points,
            origin_x: min_x,
            origin_y: min_y,
            cell,
            inv_cell,
            nx,
            ny,
            cells: vec![Vec::new(); (nx * ny) as usize],
        };

        for i in 0..points.len().saturating_sub(1) {
            let (a, b) = (points[i], points[i + 1]);
            let pad = BOUND_SLACK_M;
            let ix0 = index.cell_x(a.x.min(b.x) - pad);
            let ix1 = index.cell_x(a.x.max(b.x) + pad);
            let iy0 = index.cell_y(a.y.min(b.y) - pad);
            let iy1 = index.cell_y(a.y.max(b.y) + pad);
            for iy in iy0..=iy1 {
                for ix in ix0..=ix1 {
                    let slot = (iy * index.nx + ix) as usize;
                    index.cells[slot].push(i as u32);
                }
            }
        }

        index
    }

    fn cell_x(&self, x: f64) -> i64 {
        (((x - self.origin_x) * self.inv_cell).floor() as i64).clamp(0, self.nx - 1)
    }

    fn cell_y(&self, y: f64) -> i64 {
        (((y - self.origin_y) * self.inv_cell).floor() as i64).clamp(0, self.ny - 1)
    }

    /// Squared planar distance from (x, y) to segment `i` and the clamped segment parameter.
    #[inline]
    fn segment_distance_sq(&self, x: f64, y: f64, i: usize) -> (f64, f64) {
        let a = self.points[i];
        let b = self.points[i + 1];
        let abx = b.x - a.x;
        let aby = b.y - a.y;
        let denom = abx * abx + aby * aby;
        let mut t = 0.0;
        if denom > 1e-12 {
            t = (((x - a.x) * abx + (y - a.y) * aby) / denom).clamp(0.0, 1.0);
        }
        let dx = x - (a.x + abx * t);
        let dy = y - (a.y + aby * t);
        (dx * dx + dy * dy, t)
    }

    fn sample(&self, best: Option<(f64, usize, f64)>) -> RouteSample {
        match best {
            Some((d2, i, t)) => RouteSample {
                distance: d2.sqrt(),
                height: lerp(self.points[i].z, self.points[i + 1].z, t),
            },
            None => RouteSample {
                distance: f64::INFINITY,
                height: self.points.first().map_or(0.0, |p| p.z),
            },
        }
    }

    /// Linear scan over every segment. Reference behaviour for [`RouteIndex::nearest`].
    pub fn nearest_brute_force(&self, x: f64, y: f64) -> RouteSample {
        let mut best: Option<(f64, usize, f64)> = None;
        for i in 0..self.points.len().saturating_sub(1) {
            let (d2, t) = self.segment_distance_sq(x, y, i);
            if best.is_none_or(|(bd2, _, _)| d2 < bd2) {
                best = Some((d2, i, t));
            }
        }
        self.sample(best)
    }

    /// Nearest point on the route to (x, y), searching rings of cells outward from the
    /// query cell until no unvisited cell can hold anything closer.
    pub fn nearest(&self, x: f64, y: f64) -> RouteSample {
        if self.points.len() < 2 {
            return self.sample(None);
        }

        let cx = self.cell_x(x);
        let cy = self.cell_y(y);
        let mut best: Option<(f64, usize, f64)> = None;

        let mut r = 0i64;
        loop {
            self.visit_ring(x, y, cx, cy, r, &mut best);

            let left_done = cx - r <= 0;
            let right_done = cx + r >= self.nx - 1;
            let bottom_done = cy - r <= 0;
            let top_done = cy + r >= self.ny - 1;
            if left_done && right_done && bottom_done && top_done {
                break;
            }

            if let Some((d2, _, _)) = best {
                let mut bound = f64::INFINITY;
                if !left_done {
                    let edge = self.origin_x + (cx - r) as f64 * self.cell;
                    bound = bound.min((x - edge).max(0.0));
                }
                if !right_done {
                    let edge = self.origin_x + (cx + r + 1) as f64 * self.cell;
                    bound = bound.min((edge - x).max(0.0));
                }
                if !bottom_done {
                    let edge = self.origin_y + (cy - r) as f64 * self.cell;
                    bound = bound.min((y - edge).max(0.0));
                }
                if !top_done {
                    let edge = self.origin_y + (cy + r + 1) as f64 * self.cell;
                    bound = bound.min((edge - y).max(0.0));
                }
                if d2.sqrt() + BOUND_SLACK_M < bound {
                    break;
                }
            }
            r += 1;
        }

        self.sample(best)
    }

    fn visit_ring(&self, x: f64, y: f64, cx: i64, cy: i64, r: i64, best: &mut Option<(f64, usize, f64)>) {
        for iy in (cy - r)..=(cy + r) {
            if iy < 0 || iy >= self.ny {
                continue;
            }
            let full_row = iy == cy - r || iy == cy + r;
            let mut visit = |ix: i64| {
                if ix < 0 || ix >= self.nx {
                    return;
                }
                for &seg in &self.cells[(iy * self.nx + ix) as usize] {
                    let seg = seg as usize;
                    let (d2, t) = self.segment_distance_sq(x, y, seg);
                    let better = match *best {
                        None => true,
                        Some((bd2, bi, _)) => d2 < bd2 || (d2 == bd2 && seg < bi),
                    };
                    if better {
                        *best = Some((d2, seg, t));
                    }
                }
            };
            if full_row {
                for ix in (cx - r)..=(cx + r) {
                    visit(ix);
                }
            } else {
                visit(cx - r);
                visit(cx + r);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiggly_route() -> Vec<DVec3> {
        (0..300)
            .map(|i| {
                let s = i as f64;
                DVec3::new(s * 3.0, (s * 0.05).sin() * 120.0, s * 0.2 + (s * 0.3).cos())
            })
            .collect()
    }

    #[test]
    fn matches_brute_force_everywhere() {
        let route = wiggly_route();
        let index = RouteIndex::new(&route);
        for iy in -10..=40 {
            for ix in -10..=50 {
                let x = ix as f64 * 21.7 - 3.1;
                let y = iy as f64 * 9.3 - 160.0;
                assert_eq!(index.nearest(x, y), index.nearest_brute_force(x, y), "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn ties_resolve_to_first_segment() {
        // Out-and-back route: both legs are equidistant everywhere.
        let route = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(100.0, 0.0, 10.0),
            DVec3::new(0.0, 0.0, 50.0),
        ];
        let index = RouteIndex::new(&route);
        let s = index.nearest(25.0, 4.0);
        assert_eq!(s, index.nearest_brute_force(25.0, 4.0));
        assert!((s.height - 2.5).abs() < 1e-12);
        assert!((s.distance - 4.0).abs() < 1e-12);
    }

    #[test]
    fn height_interpolates_along_segment() {
        let route = vec![DVec3::new(0.0, 0.0, 10.0), DVec3::new(10.0, 0.0, 20.0)];
        let index = RouteIndex::new(&route);
        let s = index.nearest(3.0, -2.0);
        assert!((s.distance - 2.0).abs() < 1e-12);
        assert!((s.height - 13.0).abs() < 1e-12);
    }

    #[test]
    fn single_point_route_is_infinitely_far() {
        let route = vec![DVec3::new(5.0, 5.0, 7.0)];
        let index = RouteIndex::new(&route);
        let s = index.nearest(0.0, 0.0);
        assert!(s.distance.is_infinite());
        assert_eq!(s.height, 7.0);
    }
}
