/// Slope limiting and Laplacian smoothing over the finest heightmap
use crate::heightmap::Heightmap;
use crate::math::lerp;
use rayon::prelude::*;
use tracing::debug;

/// Cells within the pin radius of the route. Relaxation never writes to them.
#[derive(Debug, Clone, PartialEq)]
pub struct PinnedMask {
    pub size: usize,
    pub pinned: Vec<bool>,
}

impl PinnedMask {
    pub fn from_distances(size: usize, distances: &[f64], pin_radius_m: f64) -> Self {
        Self {
            size,
            pinned: distances.iter().map(|&d| d <= pin_radius_m).collect(),
        }
    }

    /// Mask with nothing pinned
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            pinned: vec![false; size * size],
        }
    }

    #[inline]
    pub fn is_pinned(&self, idx: usize) -> bool {
        self.pinned[idx]
    }

    pub fn count(&self) -> usize {
        self.pinned.iter().filter(|&&p| p).count()
    }
}

/// Tunables for [`relax`]; derived from detail level and style.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxationParams {
    pub max_slope_m_per_m: f64,
    pub slope_iterations: usize,
    pub smooth_strength: f64,
    pub smooth_iterations: usize,
}

/// Slope limiting followed by smoothing, both leaving pinned cells alone.
pub fn relax(heightmap: &mut Heightmap, mask: &PinnedMask, params: &RelaxationParams) {
    let passes = limit_slope(heightmap, mask, params.max_slope_m_per_m, params.slope_iterations);
    debug!("Slope limiter settled after {} pass(es)", passes);
    smooth_heights(heightmap, mask, params.smooth_strength, params.smooth_iterations);
}

/// Clamp each free cell into the band allowed by its axis neighbours, in place
/// (Gauss-Seidel order, row-major). Stops early once a full pass changes nothing.
/// Returns the number of passes run.
pub fn limit_slope(heightmap: &mut Heightmap, mask: &PinnedMask, max_slope_m_per_m: f64, iterations: usize) -> usize {
    let max_slope = max_slope_m_per_m.max(0.0);
    if iterations == 0 || max_slope <= 0.0 {
        return 0;
    }

    let size = heightmap.size;
    let (dx, dy) = heightmap.spacing();
    let max_dhx = max_slope * dx.max(1e-6);
    let max_dhy = max_slope * dy.max(1e-6);
    let h = &mut heightmap.heights;

    for pass in 0..iterations {
        let mut changed = false;
        for iy in 0..size {
            let row = iy * size;
            for ix in 0..size {
                let idx = row + ix;
                if mask.is_pinned(idx) {
                    continue;
                }

                let mut lo = f64::NEG_INFINITY;
                let mut hi = f64::INFINITY;
                let mut bound = |neighbour: f64, max_dh: f64| {
                    lo = lo.max(neighbour - max_dh);
                    hi = hi.min(neighbour + max_dh);
                };
                if ix > 0 {
                    bound(h[idx - 1], max_dhx);
                }
                if ix + 1 < size {
                    bound(h[idx + 1], max_dhx);
                }
                if iy > 0 {
                    bound(h[idx - size], max_dhy);
                }
                if iy + 1 < size {
                    bound(h[idx + size], max_dhy);
                }

                let current = h[idx];
                if current < lo {
                    h[idx] = lo;
                    changed = true;
                } else if current > hi {
                    h[idx] = hi;
                    changed = true;
                }
            }
        }
        if !changed {
            return pass + 1;
        }
    }
    iterations
}

/// Blend every free interior cell toward its 4-neighbour average by `strength`.
/// Each pass reads only the previous pass's buffer.
pub fn smooth_heights(heightmap: &mut Heightmap, mask: &PinnedMask, strength: f64, iterations: usize) {
    if strength <= 0.0 || iterations == 0 || heightmap.size < 3 {
        return;
    }

    let size = heightmap.size;
    let mut current = std::mem::take(&mut heightmap.heights);
    let mut next = current.clone();

    for _ in 0..iterations {
        let src = &current;
        next.par_chunks_mut(size)
            .enumerate()
            .filter(|(iy, _)| *iy > 0 && *iy < size - 1)
            .for_each(|(iy, row)| {
                let base = iy * size;
                for ix in 1..size - 1 {
                    let idx = base + ix;
                    if mask.is_pinned(idx) {
                        continue;
                    }
                    let avg = (src[idx - 1] + src[idx + 1] + src[idx - size] + src[idx + size]) * 0.25;
                    row[ix] = lerp(src[idx], avg, strength);
                }
            });
        std::mem::swap(&mut current, &mut next);
    }

    heightmap.heights = current;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds2D;

    fn flat(size: usize, spacing: f64) -> Heightmap {
        let extent = spacing * (size - 1) as f64;
        Heightmap::new(size, Bounds2D::new(0.0, 0.0, extent, extent), vec![0.0; size * size])
    }

    fn assert_slopes_bounded(hm: &Heightmap, mask: &PinnedMask, max_slope: f64) {
        let (dx, dy) = hm.spacing();
        let eps = 1e-9;
        for iy in 0..hm.size {
            for ix in 0..hm.size {
                let i = hm.index(ix, iy);
                if mask.is_pinned(i) {
                    continue;
                }
                if ix + 1 < hm.size && !mask.is_pinned(i + 1) {
                    assert!((hm.heights[i] - hm.heights[i + 1]).abs() <= max_slope * dx + eps);
                }
                if iy + 1 < hm.size && !mask.is_pinned(i + hm.size) {
                    assert!((hm.heights[i] - hm.heights[i + hm.size]).abs() <= max_slope * dy + eps);
                }
            }
        }
    }

    #[test]
    fn spike_and_pit_are_clamped() {
        let mut hm = flat(9, 2.0);
        let spike = hm.index(2, 2);
        let pit = hm.index(6, 6);
        hm.heights[spike] = 1.5;
        hm.heights[pit] = -1.5;
        let mask = PinnedMask::empty(9);

        let passes = limit_slope(&mut hm, &mask, 0.5, 10);
        assert_eq!(passes, 2);
        assert_eq!(hm.heights[spike], 1.0);
        assert_eq!(hm.heights[pit], -1.0);
        // Neighbours scanned before the extremes get pulled toward them
        assert_eq!(hm.heights[hm.index(2, 1)], 0.5);
        assert_eq!(hm.heights[hm.index(1, 2)], 0.5);
        assert_eq!(hm.heights[hm.index(6, 5)], -0.5);
        assert_eq!(hm.heights[hm.index(5, 6)], -0.5);
        assert_slopes_bounded(&hm, &mask, 0.5);
    }

    #[test]
    fn limiter_output_is_a_fixed_point() {
        let mut hm = flat(9, 2.0);
        let spike = hm.index(4, 4);
        hm.heights[spike] = 1.5;
        let mask = PinnedMask::empty(9);

        limit_slope(&mut hm, &mask, 0.5, 50);
        let settled = hm.clone();
        let passes = limit_slope(&mut hm, &mask, 0.5, 50);
        assert_eq!(passes, 1);
        assert_eq!(hm, settled);
    }

    #[test]
    fn pinned_cells_survive_relaxation() {
        let mut hm = flat(12, 1.0);
        for iy in 0..12 {
            for ix in 0..12 {
                let i = hm.index(ix, iy);
                hm.heights[i] = ((ix * 7 + iy * 13) % 11) as f64 * 3.0;
            }
        }
        let distances: Vec<f64> = (0..144).map(|i| if (i / 12) == 6 { 0.0 } else { 10.0 }).collect();
        let mask = PinnedMask::from_distances(12, &distances, 1.0);
        assert_eq!(mask.count(), 12);

        let before = hm.clone();
        relax(
            &mut hm,
            &mask,
            &RelaxationParams {
                max_slope_m_per_m: 0.4,
                slope_iterations: 40,
                smooth_strength: 0.5,
                smooth_iterations: 6,
            },
        );
        for i in 0..144 {
            if mask.is_pinned(i) {
                assert_eq!(hm.heights[i], before.heights[i]);
            }
        }
        assert_ne!(hm, before);
    }

    #[test]
    fn smoothing_pulls_toward_neighbour_average() {
        let mut hm = flat(3, 1.0);
        let centre = hm.index(1, 1);
        hm.heights[centre] = 8.0;
        smooth_heights(&mut hm, &PinnedMask::empty(3), 0.5, 1);
        assert_eq!(hm.heights[centre], 4.0);
        // Border cells are never smoothed
        assert_eq!(hm.heights[hm.index(0, 1)], 0.0);
    }

    #[test]
    fn smoothing_is_unbiased_by_scan_order() {
        let mut hm = flat(5, 1.0);
        let centre = hm.index(2, 2);
        hm.heights[centre] = 4.0;
        smooth_heights(&mut hm, &PinnedMask::empty(5), 1.0, 1);
        assert_eq!(hm.heights[hm.index(1, 2)], 1.0);
        assert_eq!(hm.heights[hm.index(3, 2)], 1.0);
        assert_eq!(hm.heights[hm.index(2, 1)], 1.0);
        assert_eq!(hm.heights[hm.index(2, 3)], 1.0);
        assert_eq!(hm.heights[centre], 0.0);
    }

    #[test]
    fn zero_strength_or_iterations_is_a_noop() {
        let mut hm = flat(4, 1.0);
        hm.heights[5] = 3.0;
        let before = hm.clone();
        smooth_heights(&mut hm, &PinnedMask::empty(4), 0.0, 5);
        smooth_heights(&mut hm, &PinnedMask::empty(4), 0.5, 0);
        assert_eq!(limit_slope(&mut hm, &PinnedMask::empty(4), 0.0, 10), 0);
        assert_eq!(hm, before);
    }
}
