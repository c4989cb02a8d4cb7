/// Indexed quad meshes for the terrain grid, road ribbon and route curve
use crate::heightmap::Heightmap;
use constants::road::{MIN_UV_TILE_M, ROAD_UV_TILE_M};
use constants::terrain::TERRAIN_UV_TILE_M;
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Squared edge length below which a face counts as degenerate
const DEGENERATE_EDGE_SQ: f64 = 1e-12;

/// Quad mesh with per-corner UVs. Faces wind counter-clockwise seen from +Z.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<DVec3>,
    pub faces: Vec<[u32; 4]>,
    /// One UV per face corner, parallel to `faces`.
    pub face_uvs: Vec<[DVec2; 4]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        self.positions.push(position);
        (self.positions.len() - 1) as u32
    }

    /// Append a quad unless one of its edges has zero length. Returns whether it was added.
    pub fn add_quad(&mut self, corners: [u32; 4], uvs: [DVec2; 4]) -> bool {
        for k in 0..4 {
            let a = self.positions[corners[k] as usize];
            let b = self.positions[corners[(k + 1) % 4] as usize];
            if (a - b).length_squared() <= DEGENERATE_EDGE_SQ {
                return false;
            }
        }
        self.faces.push(corners);
        self.face_uvs.push(uvs);
        true
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Each quad split along its 0-2 diagonal
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.faces
            .iter()
            .flat_map(|f| [[f[0], f[1], f[2]], [f[0], f[2], f[3]]])
    }

    /// Axis-aligned 3D bounds of all vertices, or `None` for an empty mesh
    pub fn aabb(&self) -> Option<(DVec3, DVec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }

    /// Area-weighted vertex normals from the triangulated faces
    pub fn vertex_normals(&self) -> Vec<DVec3> {
        let mut normals = vec![DVec3::ZERO; self.positions.len()];
        for [a, b, c] in self.triangles() {
            let (pa, pb, pc) = (
                self.positions[a as usize],
                self.positions[b as usize],
                self.positions[c as usize],
            );
            let n = (pb - pa).cross(pc - pa);
            normals[a as usize] += n;
            normals[b as usize] += n;
            normals[c as usize] += n;
        }
        normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(DVec3::Z))
            .collect()
    }
}

/// Ordered route points handed to downstream consumers as a plain polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCurve {
    pub points: Vec<DVec3>,
}

impl RouteCurve {
    pub fn new(points: &[DVec3]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }

    /// 3D length along the polyline
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).length()).sum()
    }
}

/// One vertex per heightmap cell, one quad per 2×2 block, planar UVs in tile units.
pub fn build_terrain_mesh(heightmap: &Heightmap) -> Mesh {
    let size = heightmap.size;
    let bounds = heightmap.bounds;
    let tile = TERRAIN_UV_TILE_M.max(MIN_UV_TILE_M);

    let mut mesh = Mesh::new();
    mesh.positions.reserve(size * size);
    for iy in 0..size {
        for ix in 0..size {
            let (x, y) = bounds.grid_point(ix, iy, size);
            mesh.add_vertex(DVec3::new(x, y, heightmap.get(ix, iy)));
        }
    }

    let uv = |p: DVec3| DVec2::new((p.x - bounds.min_x) / tile, (p.y - bounds.min_y) / tile);
    let mut skipped = 0;
    for iy in 0..size.saturating_sub(1) {
        for ix in 0..size - 1 {
            let v00 = (ix + iy * size) as u32;
            let v10 = v00 + 1;
            let v01 = v00 + size as u32;
            let v11 = v01 + 1;
            let corners = [v00, v10, v11, v01];
            let uvs = corners.map(|v| uv(mesh.positions[v as usize]));
            if !mesh.add_quad(corners, uvs) {
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        debug!("Skipped {} degenerate terrain faces", skipped);
    }
    mesh
}

/// Unit planar tangent at route point `i` from its neighbours, `None` when they coincide.
fn central_tangent_xy(points: &[DVec3], i: usize) -> Option<DVec2> {
    let prev = points[i.saturating_sub(1)];
    let next = points[(i + 1).min(points.len() - 1)];
    let d = (next - prev).truncate();
    let len_sq = d.length_squared();
    (len_sq > 1e-12).then(|| d / len_sq.sqrt())
}

/// Ribbon of width `width_m` centred on the route.
///
/// Ring `i` stores its left vertex at index `2i` and right vertex at `2i + 1`; crossfall
/// relies on that layout. U spans the width, V accumulates 3D arc length, both in tiles.
pub fn build_road_mesh(points: &[DVec3], width_m: f64) -> Mesh {
    let mut mesh = Mesh::new();
    if points.is_empty() {
        return mesh;
    }

    let half_w = width_m * 0.5;
    let tile = ROAD_UV_TILE_M.max(MIN_UV_TILE_M);
    let u0 = 0.0;
    let u1 = width_m / tile;

    let mut v_by_i = Vec::with_capacity(points.len());
    v_by_i.push(0.0);
    for w in points.windows(2) {
        let last = v_by_i[v_by_i.len() - 1];
        v_by_i.push(last + (w[1] - w[0]).length() / tile);
    }

    let mut fallback_tangents = 0;
    for (i, &p) in points.iter().enumerate() {
        let t = central_tangent_xy(points, i).unwrap_or_else(|| {
            fallback_tangents += 1;
            DVec2::X
        });
        let offset = DVec3::new(-t.y, t.x, 0.0) * half_w;
        mesh.add_vertex(p + offset);
        mesh.add_vertex(p - offset);
    }

    let mut skipped = 0;
    for i in 0..points.len() - 1 {
        let (l0, r0) = (2 * i as u32, 2 * i as u32 + 1);
        let (l1, r1) = (l0 + 2, r0 + 2);
        let (va, vb) = (v_by_i[i], v_by_i[i + 1]);
        let uvs = [
            DVec2::new(u0, va),
            DVec2::new(u1, va),
            DVec2::new(u1, vb),
            DVec2::new(u0, vb),
        ];
        if !mesh.add_quad([l0, r0, r1, l1], uvs) {
            skipped += 1;
        }
    }

    if fallback_tangents > 0 || skipped > 0 {
        debug!(
            "Road ribbon: {} fallback tangent(s), {} degenerate face(s) skipped",
            fallback_tangents, skipped
        );
    }
    mesh
}

/// Thicken a road ribbon into a slab hanging `thickness_m` below its surface.
/// The ribbon's own vertices keep their indices; the underside ring is appended after them.
pub fn solidify_road(mesh: &mut Mesh, thickness_m: f64) {
    if thickness_m <= 0.0 || mesh.positions.len() < 4 {
        return;
    }

    let top_count = mesh.positions.len() as u32;
    let rings = top_count / 2;
    let drop = DVec3::new(0.0, 0.0, thickness_m);
    for i in 0..top_count as usize {
        let p = mesh.positions[i];
        mesh.add_vertex(p - drop);
    }

    let tile = ROAD_UV_TILE_M.max(MIN_UV_TILE_M);
    let depth_v = thickness_m / tile;
    let top_faces = mesh.faces.len();
    for f in 0..top_faces {
        let [a, b, c, d] = mesh.faces[f];
        let uvs = mesh.face_uvs[f];
        // Underside faces downward, so reverse the winding
        mesh.add_quad(
            [d + top_count, c + top_count, b + top_count, a + top_count],
            [uvs[3], uvs[2], uvs[1], uvs[0]],
        );
    }

    let wall_uvs = |va: f64, vb: f64| {
        [
            DVec2::new(va, 0.0),
            DVec2::new(vb, 0.0),
            DVec2::new(vb, depth_v),
            DVec2::new(va, depth_v),
        ]
    };
    for i in 0..rings.saturating_sub(1) {
        let (l0, r0, l1, r1) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
        let along = (mesh.positions[l1 as usize] - mesh.positions[l0 as usize]).length() / tile;
        mesh.add_quad([l0, l1, l1 + top_count, l0 + top_count], wall_uvs(0.0, along));
        mesh.add_quad([r1, r0, r0 + top_count, r1 + top_count], wall_uvs(0.0, along));
    }

    if rings >= 2 {
        let across = (mesh.positions[1] - mesh.positions[0]).length() / tile;
        mesh.add_quad([1, 0, top_count, 1 + top_count], wall_uvs(0.0, across));
        let (l, r) = (2 * (rings - 1), 2 * (rings - 1) + 1);
        mesh.add_quad([l, r, r + top_count, l + top_count], wall_uvs(0.0, across));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds2D;

    fn straight_route(len: f64, n: usize) -> Vec<DVec3> {
        (0..n)
            .map(|i| DVec3::new(len * i as f64 / (n - 1) as f64, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn terrain_mesh_has_one_vertex_per_cell() {
        let bounds = Bounds2D::new(0.0, 0.0, 30.0, 30.0);
        let hm = Heightmap::new(4, bounds, (0..16).map(|i| i as f64).collect());
        let mesh = build_terrain_mesh(&hm);
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.face_count(), 9);
        assert_eq!(mesh.positions[5], DVec3::new(10.0, 10.0, 5.0));
        assert_eq!(mesh.face_uvs[0][2], DVec2::new(2.0, 2.0));
    }

    #[test]
    fn road_ribbon_is_exactly_road_width() {
        let route = straight_route(100.0, 11);
        let mesh = build_road_mesh(&route, 6.0);
        assert_eq!(mesh.vertex_count(), 22);
        assert_eq!(mesh.face_count(), 10);
        for i in 0..11 {
            let l = mesh.positions[2 * i];
            let r = mesh.positions[2 * i + 1];
            assert!(((l - r).length() - 6.0).abs() < 1e-12);
            assert!(l.y > r.y, "left edge is on the left of travel");
        }
    }

    #[test]
    fn road_uvs_follow_width_and_arc_length() {
        let route = straight_route(12.0, 3);
        let mesh = build_road_mesh(&route, 6.0);
        assert_eq!(mesh.face_uvs[0][0], DVec2::new(0.0, 0.0));
        assert_eq!(mesh.face_uvs[0][1], DVec2::new(1.0, 0.0));
        assert_eq!(mesh.face_uvs[1][2], DVec2::new(1.0, 2.0));
    }

    #[test]
    fn duplicate_route_points_skip_faces_without_failing() {
        let route = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(10.0, 0.0, 0.0),
            DVec3::new(10.0, 0.0, 0.0),
            DVec3::new(20.0, 0.0, 0.0),
        ];
        let mesh = build_road_mesh(&route, 4.0);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 2);
    }

    #[test]
    fn degenerate_tangent_falls_back_to_x() {
        let route = vec![DVec3::new(3.0, 3.0, 0.0); 2];
        assert_eq!(central_tangent_xy(&route, 0), None);
        let mesh = build_road_mesh(&route, 2.0);
        assert_eq!(mesh.positions[0], DVec3::new(3.0, 4.0, 0.0));
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn solidify_adds_underside_walls_and_caps() {
        let route = straight_route(20.0, 3);
        let mut mesh = build_road_mesh(&route, 4.0);
        solidify_road(&mut mesh, 0.5);
        assert_eq!(mesh.vertex_count(), 12);
        // 2 top + 2 bottom + 4 side walls + 2 caps
        assert_eq!(mesh.face_count(), 10);
        let (lo, hi) = mesh.aabb().unwrap();
        assert_eq!(lo.z, -0.5);
        assert_eq!(hi.z, 0.0);
    }

    #[test]
    fn route_curve_length() {
        let curve = RouteCurve::new(&[DVec3::ZERO, DVec3::new(3.0, 4.0, 0.0), DVec3::new(3.0, 4.0, 2.0)]);
        assert_eq!(curve.length(), 7.0);
    }

    #[test]
    fn normals_point_up_on_flat_ribbon() {
        let mesh = build_road_mesh(&straight_route(10.0, 2), 2.0);
        for n in mesh.vertex_normals() {
            assert!((n - DVec3::Z).length() < 1e-12);
        }
    }
}
