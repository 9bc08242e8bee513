// src/terrain/mesh.rs

use bevy::prelude::*;
use bevy::render::mesh::{Indices, Mesh, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;

use super::heightfield::HeightField;

/// Build the full terrain mesh from the heightfield grid: one vertex per
/// sample, two triangles per cell, smooth normals via central differences.
pub fn build_terrain_mesh(field: &HeightField) -> Mesh {
    let segments = field.segments();
    if segments < 1 {
        return fallback_quad(field.size());
    }

    let verts = segments as usize + 1;
    let size = field.size();
    let half = field.half_extent();
    let step = size / segments as f32;

    // 1) Positions, UVs, normals
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(verts * verts);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(verts * verts);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(verts * verts);

    for j in 0..verts {
        for i in 0..verts {
            let x = -half + i as f32 * step;
            let z = -half + j as f32 * step;
            let h = field.vertex_height(i as u32, j as u32);

            positions.push([x, h, z]);
            uvs.push([i as f32 / segments as f32, j as f32 / segments as f32]);

            // Central differences, clamped at the grid border
            let il = (i as u32).saturating_sub(1);
            let ir = (i as u32 + 1).min(segments);
            let jd = (j as u32).saturating_sub(1);
            let ju = (j as u32 + 1).min(segments);
            let dx = (ir - il).max(1) as f32 * step;
            let dz = (ju - jd).max(1) as f32 * step;
            let dhdx = (field.vertex_height(ir, j as u32) - field.vertex_height(il, j as u32)) / dx;
            let dhdz = (field.vertex_height(i as u32, ju) - field.vertex_height(i as u32, jd)) / dz;

            let n = Vec3::new(-dhdx, 1.0, -dhdz).normalize_or_zero();
            normals.push([n.x, n.y, n.z]);
        }
    }

    // 2) Indices (two tris per cell)
    let mut indices: Vec<u32> = Vec::with_capacity(segments as usize * segments as usize * 6);
    for j in 0..segments {
        for i in 0..segments {
            let i0 = j * (segments + 1) + i;
            let i1 = i0 + 1;
            let i2 = i0 + segments + 1;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    // 3) Assemble
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Flat quad stand-in when the grid is degenerate.
pub fn fallback_quad(size: f32) -> Mesh {
    let half = size * 0.5;
    let positions = vec![
        [-half, 0.0, -half],
        [half, 0.0, -half],
        [-half, 0.0, half],
        [half, 0.0, half],
    ];
    let normals = vec![[0.0, 1.0, 0.0]; 4];
    let uvs = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
    let indices = vec![0u32, 2, 1, 1, 2, 3];

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Triangle count of an indexed mesh (0 if unindexed).
pub fn triangle_count(mesh: &Mesh) -> u32 {
    mesh.indices().map(|ix| ix.len() as u32 / 3).unwrap_or(0)
}
