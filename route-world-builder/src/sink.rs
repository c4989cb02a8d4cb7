/// Hand-off of generated meshes to a Bevy host as render meshes
use crate::mesh::Mesh;
use bevy::asset::RenderAssetUsages;
use bevy::render::mesh::{Indices, Mesh as BevyMesh, PrimitiveTopology};
use glam::DVec3;

/// Local Z-up metres to Bevy's Y-up frame (a proper rotation, so winding is kept)
fn to_y_up(p: DVec3) -> [f32; 3] {
    [p.x as f32, p.z as f32, -p.y as f32]
}

/// Triangle-list mesh with one vertex per face corner, so per-corner UVs survive.
pub fn to_bevy_mesh(mesh: &Mesh) -> BevyMesh {
    let normals_by_vertex = mesh.vertex_normals();

    let corner_count = mesh.faces.len() * 4;
    let mut positions = Vec::with_capacity(corner_count);
    let mut normals = Vec::with_capacity(corner_count);
    let mut uvs = Vec::with_capacity(corner_count);
    let mut indices = Vec::with_capacity(mesh.faces.len() * 6);

    for (face, face_uvs) in mesh.faces.iter().zip(&mesh.face_uvs) {
        let base = positions.len() as u32;
        for (&v, uv) in face.iter().zip(face_uvs) {
            positions.push(to_y_up(mesh.positions[v as usize]));
            normals.push(to_y_up(normals_by_vertex[v as usize]));
            uvs.push([uv.x as f32, uv.y as f32]);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let mut out = BevyMesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::RENDER_WORLD);
    out.insert_attribute(BevyMesh::ATTRIBUTE_POSITION, positions);
    out.insert_attribute(BevyMesh::ATTRIBUTE_NORMAL, normals);
    out.insert_attribute(BevyMesh::ATTRIBUTE_UV_0, uvs);
    out.insert_indices(Indices::U32(indices));
    out
}
