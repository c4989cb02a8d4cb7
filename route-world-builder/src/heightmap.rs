/// Multiscale route-following heightmap synthesis
use crate::bounds::Bounds2D;
use crate::math::{lerp, smoothstep01};
use crate::route_index::RouteIndex;
use crate::undulation::UndulationNoise;
use constants::terrain::MIN_GRID_SIZE;
use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::debug;

/// Square row-major height grid spanning a planar bounds rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightmap {
    pub size: usize,
    pub bounds: Bounds2D,
    /// Heights in metres, index `ix + iy * size`.
    pub heights: Vec<f64>,
}

impl Heightmap {
    pub fn new(size: usize, bounds: Bounds2D, heights: Vec<f64>) -> Self {
        debug_assert_eq!(heights.len(), size * size);
        Self {
            size,
            bounds,
            heights,
        }
    }

    #[inline]
    pub fn index(&self, ix: usize, iy: usize) -> usize {
        ix + iy * self.size
    }

    pub fn get(&self, ix: usize, iy: usize) -> f64 {
        self.heights[self.index(ix, iy)]
    }

    /// Grid spacing along X and Y in metres
    pub fn spacing(&self) -> (f64, f64) {
        let cells = self.size.saturating_sub(1).max(1) as f64;
        (self.bounds.size_x() / cells, self.bounds.size_y() / cells)
    }

    /// Sample at world XY with bilinear interpolation, clamped to the grid edge.
    /// A zero-area bounds returns the first cell.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> f64 {
        let width = self.bounds.size_x();
        let depth = self.bounds.size_y();
        if width <= 1e-12 || depth <= 1e-12 {
            return self.heights.first().copied().unwrap_or(0.0);
        }

        let u = ((x - self.bounds.min_x) / width).clamp(0.0, 1.0);
        let v = ((y - self.bounds.min_y) / depth).clamp(0.0, 1.0);

        // Continuous cell space
        let sx = u * (self.size - 1) as f64;
        let sy = v * (self.size - 1) as f64;
        let ix = sx.floor() as usize;
        let iy = sy.floor() as usize;
        let tx = sx - ix as f64;
        let ty = sy - iy as f64;
        let ix1 = (ix + 1).min(self.size - 1);
        let iy1 = (iy + 1).min(self.size - 1);

        let h00 = self.get(ix, iy);
        let h10 = self.get(ix1, iy);
        let h01 = self.get(ix, iy1);
        let h11 = self.get(ix1, iy1);

        lerp(lerp(h00, h10, tx), lerp(h01, h11, tx), ty)
    }

    pub fn min_max(&self) -> (f64, f64) {
        self.heights
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }
}

/// Tunables for [`HeightmapSynthesizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisParams {
    /// Final grid edge length N.
    pub grid_resolution: usize,
    /// Maximum number of refinement stages K.
    pub multiscale_iterations: usize,
    /// Coarse grid edge is N / D.
    pub initial_scale_divisor: usize,
    pub pin_radius_m: f64,
    pub route_blend_radius_m: f64,
    pub undulation_amplitude_m: f64,
    pub undulation_frequency: f64,
    pub seed: u32,
    pub carve_depth_m: f64,
    pub carve_radius_m: f64,
}

/// Finished synthesis: the finest heightmap plus each cell's route distance.
pub struct SynthesisOutput {
    pub heightmap: Heightmap,
    /// Planar distance from every final-stage cell to the route (metres).
    pub route_distances: Vec<f64>,
}

/// Grid edge lengths for each stage: doubling from the coarse size, never more than
/// `stages` entries, and always ending at exactly `final_size`.
pub fn stage_sizes(final_size: usize, stages: usize, divisor: usize) -> Vec<usize> {
    let final_size = final_size.max(MIN_GRID_SIZE);
    let coarse = (final_size / divisor.max(1)).max(MIN_GRID_SIZE);
    let stages = stages.max(1);

    let mut sizes = vec![coarse];
    while sizes.len() < stages {
        let last = sizes[sizes.len() - 1];
        let next = final_size.min(last * 2);
        if next == last {
            break;
        }
        sizes.push(next);
    }

    let last = sizes.len() - 1;
    if sizes[last] != final_size {
        if sizes.len() == stages {
            sizes[last] = final_size;
        } else {
            sizes.push(final_size);
        }
    }
    sizes.dedup();
    sizes
}

/// Builds a terrain heightmap that follows the route profile near the road and blends
/// into noise-driven landscape further out, refining from a coarse grid to the final one.
pub struct HeightmapSynthesizer<'a> {
    route: &'a RouteIndex<'a>,
    bounds: Bounds2D,
    params: SynthesisParams,
}

impl<'a> HeightmapSynthesizer<'a> {
    pub fn new(route: &'a RouteIndex<'a>, bounds: Bounds2D, params: SynthesisParams) -> Self {
        Self {
            route,
            bounds,
            params,
        }
    }

    pub fn stage_sizes(&self) -> Vec<usize> {
        stage_sizes(
            self.params.grid_resolution,
            self.params.multiscale_iterations,
            self.params.initial_scale_divisor,
        )
    }

    /// Run every stage. `progress` advances by one per synthesized row.
    pub fn synthesize(&self, progress: &ProgressBar) -> SynthesisOutput {
        let sizes = self.stage_sizes();
        progress.set_length(sizes.iter().map(|&s| s as u64).sum());

        let p = &self.params;
        let pin_r = p.pin_radius_m.max(0.0);
        let blend_r = pin_r.max(p.route_blend_radius_m);
        let carve_r = p.carve_radius_m.max(0.0);
        let carve_d = p.carve_depth_m.max(0.0);
        let noise = UndulationNoise::new(p.seed, p.undulation_frequency);

        let mut previous: Option<Heightmap> = None;
        let mut distances = Vec::new();

        for &size in &sizes {
            debug!("Synthesizing {}x{} stage", size, size);
            let mut heights = vec![0.0; size * size];
            let mut stage_distances = vec![0.0; size * size];

            heights
                .par_chunks_mut(size)
                .zip(stage_distances.par_chunks_mut(size))
                .enumerate()
                .for_each(|(iy, (row, dist_row))| {
                    for ix in 0..size {
                        let (x, y) = self.bounds.grid_point(ix, iy, size);
                        let nearest = self.route.nearest(x, y);
                        let base_h = match &previous {
                            Some(prev) => prev.sample_bilinear(x, y),
                            None => nearest.height,
                        };

                        let nearest_d = nearest.distance;
                        let mut route_h = nearest.height;
                        if carve_d > 0.0 && carve_r > 0.0 && nearest_d < carve_r {
                            route_h -= carve_d * smoothstep01(1.0 - nearest_d / carve_r);
                        }

                        let mut h = base_h;
                        if nearest_d <= pin_r {
                            h = route_h;
                        } else if nearest_d <= blend_r {
                            let t = (nearest_d - pin_r) / (blend_r - pin_r).max(1e-6);
                            h = lerp(route_h, base_h, smoothstep01(t));
                        }

                        if p.undulation_amplitude_m > 0.0 && blend_r > 0.0 {
                            let fade = smoothstep01(((nearest_d - blend_r) / blend_r).clamp(0.0, 1.0));
                            h += noise.sample(x, y) * p.undulation_amplitude_m * fade;
                        }

                        row[ix] = h;
                        dist_row[ix] = nearest_d;
                    }
                    progress.inc(1);
                });

            previous = Some(Heightmap::new(size, self.bounds, heights));
            distances = stage_distances;
        }

        let heightmap = previous.unwrap_or_else(|| Heightmap::new(0, self.bounds, Vec::new()));
        SynthesisOutput {
            heightmap,
            route_distances: distances,
        }
    }
}
