/// World manifest linking every exported file with the bounds and settings used to build it.
use crate::bounds::Bounds2D;
use crate::config::GenerationConfig;
use crate::error::Result;
use crate::pipeline::{BuildStats, GeneratedWorld};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Top-level description of an exported world.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorldManifest {
    pub name: String,
    /// Planar extent of the terrain in local metres.
    pub bounds: Bounds2D,
    pub heightmap: Option<HeightmapInfo>,
    pub terrain: Option<MeshInfo>,
    pub road: Option<MeshInfo>,
    pub route: Option<RouteInfo>,
    pub stats: ManifestStats,
    /// Effective configuration after validation.
    pub config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HeightmapInfo {
    pub size: usize,
    pub min_height: f64,
    pub max_height: f64,
    /// DDS texture file name.
    pub texture: String,
    /// DXGI format written, `R32_Float` or `R16_Float`.
    pub format: String,
    pub preview: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub file: String,
    pub vertex_count: usize,
    pub face_count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RouteInfo {
    pub file: String,
    pub point_count: usize,
    pub length_m: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ManifestStats {
    pub raw_route_points: usize,
    pub terrain_route_points: usize,
    pub road_route_points: usize,
    pub pinned_cells: usize,
    pub lowered_vertices: usize,
    pub blended_vertices: usize,
    pub max_bank_slope: f64,
}

impl ManifestStats {
    pub fn from_world(world: &GeneratedWorld) -> Self {
        let BuildStats {
            pinned_cells,
            lowered_vertices,
            blended_vertices,
        } = world.stats;
        Self {
            raw_route_points: world.raw_route.len(),
            terrain_route_points: world.terrain_route.len(),
            road_route_points: world.road_route.len(),
            pinned_cells,
            lowered_vertices,
            blended_vertices,
            max_bank_slope: world.banks.iter().fold(0.0, |m, b| m.max(b.abs())),
        }
    }
}

/// Writes `<name>_manifest.json` next to the exported assets.
pub struct ManifestGenerator {
    output_dir: PathBuf,
    output_name: String,
}

impl ManifestGenerator {
    pub fn new(output_dir: &Path, output_name: &str) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            output_name: output_name.to_string(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_manifest.json", self.output_name))
    }

    pub fn write(&self, manifest: &WorldManifest) -> Result<PathBuf> {
        let path = self.manifest_path();
        fs::write(&path, serde_json::to_string_pretty(manifest)?)?;
        info!("Generated manifest: {}", path.display());
        self.log_summary(manifest);
        Ok(path)
    }

    fn log_summary(&self, manifest: &WorldManifest) {
        let b = &manifest.bounds;
        info!(
            "  Bounds: ({:.2}, {:.2}) to ({:.2}, {:.2})",
            b.min_x, b.min_y, b.max_x, b.max_y
        );
        if let Some(h) = &manifest.heightmap {
            info!(
                "  Heightmap: {}x{}, heights {:.2} to {:.2} m",
                h.size, h.size, h.min_height, h.max_height
            );
        }
        if let Some(road) = &manifest.road {
            info!(
                "  Road: {} vertices, max bank {:.3}",
                road.vertex_count, manifest.stats.max_bank_slope
            );
        }
        if let Some(route) = &manifest.route {
            info!("  Route: {} points, {:.1} m", route.point_count, route.length_m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_is_written_as_json() {
        let dir = std::env::temp_dir().join(format!("rwb-manifest-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let manifest = WorldManifest {
            name: "AlpineLoop".to_string(),
            bounds: Bounds2D::new(-10.0, -10.0, 10.0, 10.0),
            heightmap: None,
            terrain: None,
            road: Some(MeshInfo {
                file: "AlpineLoop_road.obj".to_string(),
                vertex_count: 8,
                face_count: 3,
            }),
            route: None,
            stats: ManifestStats {
                raw_route_points: 4,
                terrain_route_points: 4,
                road_route_points: 4,
                pinned_cells: 0,
                lowered_vertices: 0,
                blended_vertices: 0,
                max_bank_slope: 0.05,
            },
            config: GenerationConfig::default(),
        };

        let generator = ManifestGenerator::new(&dir, "AlpineLoop");
        let path = generator.write(&manifest).unwrap();
        assert!(path.ends_with("AlpineLoop_manifest.json"));

        let parsed: WorldManifest = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.name, "AlpineLoop");
        assert_eq!(parsed.road, manifest.road);
        assert_eq!(parsed.bounds, manifest.bounds);
        assert_eq!(parsed.config.detail, 3);
        assert!(parsed.heightmap.is_none());
        fs::remove_dir_all(&dir).unwrap();
    }
}
