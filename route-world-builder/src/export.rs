/// File exporters: OBJ meshes, route JSON, heightmap textures and the manifest
use crate::dds_writer::{write_heightmap_dds, write_heightmap_dds_half};
use crate::error::Result;
use crate::heightmap::Heightmap;
use crate::manifest::{HeightmapInfo, ManifestGenerator, ManifestStats, MeshInfo, RouteInfo, WorldManifest};
use crate::mesh::{Mesh, RouteCurve};
use crate::pipeline::GeneratedWorld;
use image::{ImageBuffer, Luma};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Turn a snake_case stem into the CamelCase prefix used for every output file.
pub fn generate_programmatic_name(input: &str) -> String {
    input
        .split(['_', '-', ' '])
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Wavefront OBJ with one UV per face corner. Coordinates stay Z-up, in metres.
pub fn write_obj<W: Write>(writer: &mut W, mesh: &Mesh, object_name: &str) -> std::io::Result<()> {
    writeln!(writer, "# route-world-builder mesh, Z-up, metres")?;
    writeln!(writer, "o {}", object_name)?;
    for p in &mesh.positions {
        writeln!(writer, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }
    for uvs in &mesh.face_uvs {
        for uv in uvs {
            writeln!(writer, "vt {:.6} {:.6}", uv.x, uv.y)?;
        }
    }
    for (f, face) in mesh.faces.iter().enumerate() {
        let t = f * 4 + 1;
        writeln!(
            writer,
            "f {}/{} {}/{} {}/{} {}/{}",
            face[0] + 1,
            t,
            face[1] + 1,
            t + 1,
            face[2] + 1,
            t + 2,
            face[3] + 1,
            t + 3
        )?;
    }
    Ok(())
}

pub fn write_obj_file(path: &Path, mesh: &Mesh, object_name: &str) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_obj(&mut writer, mesh, object_name)?;
    writer.flush()?;
    Ok(())
}

pub fn write_route_json(path: &Path, curve: &RouteCurve) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(curve)?)?;
    Ok(())
}

/// 16-bit grayscale preview, heights normalized to the full range, north (max Y) at the top.
pub fn write_heightmap_preview(path: &Path, heightmap: &Heightmap) -> Result<()> {
    let size = heightmap.size as u32;
    let (lo, hi) = heightmap.min_max();
    let range = hi - lo;

    let img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_fn(size, size, |x, y| {
        let iy = heightmap.size - 1 - y as usize;
        let h = heightmap.get(x as usize, iy);
        let t = if range > 1e-12 { (h - lo) / range } else { 0.0 };
        Luma([(t.clamp(0.0, 1.0) * u16::MAX as f64).round() as u16])
    });
    img.save(path)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Write the DDS heightmap as R16_Float instead of R32_Float.
    pub half_heightmap: bool,
}

/// Write every generated output into `output_dir` under `name`, then the manifest.
pub fn export_world(
    world: &GeneratedWorld,
    output_dir: &Path,
    name: &str,
    options: ExportOptions,
) -> Result<WorldManifest> {
    fs::create_dir_all(output_dir)?;

    let heightmap = match &world.heightmap {
        Some(hm) => {
            let texture = format!("{0}_heightmap_{1}x{1}.dds", name, hm.size);
            let format = if options.half_heightmap {
                write_heightmap_dds_half(&output_dir.join(&texture), hm)?;
                "R16_Float"
            } else {
                write_heightmap_dds(&output_dir.join(&texture), hm)?;
                "R32_Float"
            };
            let preview = format!("{}_heightmap_preview.png", name);
            write_heightmap_preview(&output_dir.join(&preview), hm)?;
            info!("Saved {} ({}) and {}", texture, format, preview);

            let (min_height, max_height) = hm.min_max();
            Some(HeightmapInfo {
                size: hm.size,
                min_height,
                max_height,
                texture,
                format: format.to_string(),
                preview,
            })
        }
        None => None,
    };

    let terrain = world
        .terrain_mesh
        .as_ref()
        .map(|mesh| write_mesh(output_dir, name, "terrain", mesh))
        .transpose()?;
    let road = world
        .road_mesh
        .as_ref()
        .map(|mesh| write_mesh(output_dir, name, "road", mesh))
        .transpose()?;

    let route = match &world.route_curve {
        Some(curve) => {
            let file = format!("{}_route.json", name);
            write_route_json(&output_dir.join(&file), curve)?;
            info!("Saved {}", file);
            Some(RouteInfo {
                file,
                point_count: curve.points.len(),
                length_m: curve.length(),
            })
        }
        None => None,
    };

    let manifest = WorldManifest {
        name: name.to_string(),
        bounds: world.bounds,
        heightmap,
        terrain,
        road,
        route,
        stats: ManifestStats::from_world(world),
        config: world.config.clone(),
    };
    ManifestGenerator::new(output_dir, name).write(&manifest)?;
    Ok(manifest)
}

fn write_mesh(output_dir: &Path, name: &str, kind: &str, mesh: &Mesh) -> Result<MeshInfo> {
    let file = format!("{}_{}.obj", name, kind);
    write_obj_file(&output_dir.join(&file), mesh, &format!("{}_{}", name, kind))?;
    info!("Saved {} ({} vertices)", file, mesh.vertex_count());
    Ok(MeshInfo {
        file,
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds2D;
    use crate::mesh::build_road_mesh;
    use glam::DVec3;

    #[test]
    fn programmatic_names() {
        assert_eq!(generate_programmatic_name("alpine_loop"), "AlpineLoop");
        assert_eq!(generate_programmatic_name("morning-ride 2"), "MorningRide2");
        assert_eq!(generate_programmatic_name("Track"), "Track");
    }

    #[test]
    fn obj_lists_vertices_uvs_and_faces() {
        let mesh = build_road_mesh(&[DVec3::ZERO, DVec3::new(6.0, 0.0, 0.0)], 6.0);
        let mut out = Vec::new();
        write_obj(&mut out, &mesh, "Road").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 4);
        assert!(text.contains("o Road"));
        assert!(text.contains("f 1/1 2/2 4/3 3/4"));
        assert!(text.contains("v 0.000000 3.000000 0.000000"));
    }

    #[test]
    fn preview_is_sixteen_bit_and_flipped() {
        let dir = std::env::temp_dir().join(format!("rwb-preview-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("preview.png");
        let hm = Heightmap::new(
            8,
            Bounds2D::new(0.0, 0.0, 7.0, 7.0),
            (0..64).map(|i| (i / 8) as f64).collect(),
        );
        write_heightmap_preview(&path, &hm).unwrap();

        let img = image::open(&path).unwrap().into_luma16();
        assert_eq!(img.dimensions(), (8, 8));
        assert_eq!(img.get_pixel(0, 0)[0], u16::MAX);
        assert_eq!(img.get_pixel(0, 7)[0], 0);
        fs::remove_dir_all(&dir).unwrap();
    }
}
