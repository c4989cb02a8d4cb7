/// Route-to-world generation pipeline orchestrating terrain and road construction.
use crate::bounds::{Bounds2D, compute_route_bounds};
use crate::config::{GenerationConfig, TerrainParams};
use crate::coupling::{blend_terrain_to_road, lower_terrain_under_road};
use crate::crossfall::apply_crossfall;
use crate::error::{BuildError, Result};
use crate::geo::{GeoPoint, project_to_local_meters};
use crate::heightmap::{Heightmap, HeightmapSynthesizer};
use crate::mesh::{Mesh, RouteCurve, build_road_mesh, build_terrain_mesh, solidify_road};
use crate::polyline::{resample_to_budget, simplify_polyline, simplify_polyline_xy, smooth_polyline};
use crate::raycast::TriangleBvh;
use crate::relaxation::{PinnedMask, relax};
use crate::route_index::RouteIndex;
use glam::DVec3;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Counters describing what a build did, for logs and the manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BuildStats {
    pub pinned_cells: usize,
    pub lowered_vertices: usize,
    pub blended_vertices: usize,
}

/// Everything a generation run produces. Disabled outputs are `None`.
#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    /// Validated configuration the world was built with.
    pub config: GenerationConfig,
    /// Projected route before any smoothing or thinning.
    pub raw_route: Vec<DVec3>,
    /// Thinned route the terrain follows.
    pub terrain_route: Vec<DVec3>,
    /// Route the road ribbon and route curve are built on.
    pub road_route: Vec<DVec3>,
    pub bounds: Bounds2D,
    /// Final terrain heights, matching the terrain mesh vertex for vertex.
    pub heightmap: Option<Heightmap>,
    pub pinned: Option<PinnedMask>,
    pub terrain_mesh: Option<Mesh>,
    pub road_mesh: Option<Mesh>,
    pub route_curve: Option<RouteCurve>,
    /// Crossfall bank applied at each road ring.
    pub banks: Vec<f64>,
    pub stats: BuildStats,
}

/// Turns a geographic track into terrain, road and route geometry.
/// Holds no state between builds apart from its configuration.
pub struct WorldBuilder {
    config: GenerationConfig,
    show_progress: bool,
}

impl WorldBuilder {
    /// Create a builder; the configuration is validated up front.
    pub fn new(config: GenerationConfig) -> Result<Self> {
        Ok(Self {
            config: config.validate()?,
            show_progress: false,
        })
    }

    /// Draw terminal progress bars for the long-running stages.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Configuration after validation clamped it.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Run the full pipeline. Input errors abort before any geometry is built.
    pub fn build(&self, geo_points: &[GeoPoint]) -> Result<GeneratedWorld> {
        if geo_points.is_empty() {
            return Err(BuildError::EmptyTrack);
        }
        let raw_route = project_to_local_meters(geo_points);
        if raw_route.len() < 2 {
            return Err(BuildError::RouteTooShort {
                points: raw_route.len(),
            });
        }

        let config = &self.config;
        let params = TerrainParams::derive(config);
        info!(
            "Building world from {} track points (detail {}, style {:.2}, seed {})",
            raw_route.len(),
            config.detail,
            config.style,
            params.synthesis.seed
        );

        let smoothed = smooth_polyline(
            &raw_route,
            config.gpx_smoothing_window,
            config.gpx_smoothing_iterations,
        );
        let terrain_route = resample_to_budget(
            &simplify_polyline_xy(&smoothed, params.route_simplify_step_m),
            params.route_max_points,
        );
        let road_route = simplify_polyline(&smoothed, config.road_simplify_step_m);
        debug!(
            "Route points: raw {}, terrain {}, road {}",
            raw_route.len(),
            terrain_route.len(),
            road_route.len()
        );

        let bounds = compute_route_bounds(&raw_route, config.terrain_margin_m);
        info!(
            "Terrain bounds: X {:.2} to {:.2}, Y {:.2} to {:.2}",
            bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y
        );

        let mut stats = BuildStats::default();

        let mut terrain = if config.create_terrain {
            let (heightmap, mask) = self.build_heightmap(&terrain_route, bounds, &params);
            stats.pinned_cells = mask.count();
            let mesh = build_terrain_mesh(&heightmap);
            info!(
                "Terrain mesh: {} vertices, {} faces",
                mesh.vertex_count(),
                mesh.face_count()
            );
            Some((heightmap, mask, mesh))
        } else {
            None
        };

        let mut banks = Vec::new();
        let road_mesh = if config.create_road_mesh {
            let mut road = build_road_mesh(&road_route, config.road_width_m);
            banks = apply_crossfall(&mut road, &road_route, config.road_width_m, &config.crossfall);
            for p in &mut road.positions {
                p.z += config.road_offset_m;
            }
            solidify_road(&mut road, config.road_thickness_m);
            info!(
                "Road mesh: {} vertices, {} faces",
                road.vertex_count(),
                road.face_count()
            );
            Some(road)
        } else {
            None
        };

        if let (Some((heightmap, _, terrain_mesh)), Some(road)) = (terrain.as_mut(), road_mesh.as_ref()) {
            let bvh = TriangleBvh::build(road);
            debug!("Road BVH holds {} triangles", bvh.triangle_count());
            stats.lowered_vertices =
                lower_terrain_under_road(terrain_mesh, road, &bvh, &config.coupling);
            if config.transition.enabled {
                stats.blended_vertices =
                    blend_terrain_to_road(terrain_mesh, &bvh, &config.transition);
            }
            // Terrain mesh vertices are laid out exactly like heightmap cells
            for (h, p) in heightmap.heights.iter_mut().zip(&terrain_mesh.positions) {
                *h = p.z;
            }
            info!(
                "Terrain coupling: {} lowered, {} blended",
                stats.lowered_vertices, stats.blended_vertices
            );
        }

        let route_curve = config.create_route_curve.then(|| RouteCurve::new(&road_route));

        let (heightmap, pinned, terrain_mesh) = match terrain {
            Some((h, m, mesh)) => (Some(h), Some(m), Some(mesh)),
            None => (None, None, None),
        };

        Ok(GeneratedWorld {
            config: config.clone(),
            raw_route,
            terrain_route,
            road_route,
            bounds,
            heightmap,
            pinned,
            terrain_mesh,
            road_mesh,
            route_curve,
            banks,
            stats,
        })
    }

    /// Synthesize and relax the terrain heightmap along `route`.
    fn build_heightmap(
        &self,
        route: &[DVec3],
        bounds: Bounds2D,
        params: &TerrainParams,
    ) -> (Heightmap, PinnedMask) {
        let index = RouteIndex::new(route);
        let synthesizer = HeightmapSynthesizer::new(&index, bounds, params.synthesis.clone());

        let pb = self.progress_bar("[{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) {msg}");
        pb.set_message("Synthesizing terrain");
        let output = synthesizer.synthesize(&pb);
        pb.finish_with_message("Terrain synthesized");

        let mut heightmap = output.heightmap;
        let mask = PinnedMask::from_distances(
            heightmap.size,
            &output.route_distances,
            params.synthesis.pin_radius_m,
        );
        info!(
            "Heightmap {}x{}, {} cells pinned to the route",
            heightmap.size,
            heightmap.size,
            mask.count()
        );

        relax(&mut heightmap, &mask, &params.relaxation);
        let (lo, hi) = heightmap.min_max();
        debug!("Relaxed heights span {:.2} to {:.2} m", lo, hi);
        (heightmap, mask)
    }

    fn progress_bar(&self, template: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            pb.set_style(style.progress_chars("▉▊▋▌▍▎▏ "));
        }
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(n: usize) -> Vec<GeoPoint> {
        (0..n)
            .map(|i| GeoPoint::new(47.0, 8.0 + i as f64 * 0.0002, 500.0 + i as f64))
            .collect()
    }

    fn small_config() -> GenerationConfig {
        GenerationConfig {
            detail: 1,
            terrain_margin_m: 40.0,
            ..Default::default()
        }
    }

    #[test]
    fn empty_and_single_point_tracks_are_rejected() {
        let builder = WorldBuilder::new(small_config()).unwrap();
        assert!(matches!(builder.build(&[]), Err(BuildError::EmptyTrack)));
        assert!(matches!(
            builder.build(&track(1)),
            Err(BuildError::RouteTooShort { points: 1 })
        ));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = GenerationConfig {
            terrain_margin_m: -5.0,
            ..Default::default()
        };
        assert!(matches!(WorldBuilder::new(config), Err(BuildError::InvalidConfig(_))));
    }

    #[test]
    fn builder_exposes_the_validated_config() {
        let config = GenerationConfig {
            detail: 42,
            style: 3.0,
            ..small_config()
        };
        let builder = WorldBuilder::new(config).unwrap();
        assert_eq!(builder.config().detail, 5);
        assert_eq!(builder.config().style, 1.0);
    }

    #[test]
    fn builds_every_output() {
        let world = WorldBuilder::new(small_config()).unwrap().build(&track(12)).unwrap();
        let heightmap = world.heightmap.as_ref().unwrap();
        assert_eq!(heightmap.size, 64);
        let terrain = world.terrain_mesh.as_ref().unwrap();
        assert_eq!(terrain.vertex_count(), 64 * 64);
        for (h, p) in heightmap.heights.iter().zip(&terrain.positions) {
            assert_eq!(*h, p.z);
        }
        let road = world.road_mesh.as_ref().unwrap();
        assert_eq!(road.vertex_count(), 2 * world.road_route.len());
        assert_eq!(world.banks.len(), world.road_route.len());
        assert_eq!(world.route_curve.as_ref().unwrap().points, world.road_route);
    }

    #[test]
    fn disabled_outputs_are_skipped() {
        let config = GenerationConfig {
            create_terrain: false,
            create_route_curve: false,
            ..small_config()
        };
        let world = WorldBuilder::new(config).unwrap().build(&track(5)).unwrap();
        assert!(world.heightmap.is_none());
        assert!(world.terrain_mesh.is_none());
        assert!(world.route_curve.is_none());
        assert!(world.road_mesh.is_some());
        assert_eq!(world.stats.lowered_vertices, 0);
    }

    #[test]
    fn road_offset_lifts_the_ribbon() {
        let config = GenerationConfig {
            create_terrain: false,
            road_offset_m: 0.5,
            ..small_config()
        };
        let world = WorldBuilder::new(config).unwrap().build(&track(3)).unwrap();
        let road = world.road_mesh.unwrap();
        for (i, p) in world.road_route.iter().enumerate() {
            let mid = 0.5 * (road.positions[2 * i].z + road.positions[2 * i + 1].z);
            assert!((mid - (p.z + 0.5)).abs() < 1e-9);
        }
    }
}
