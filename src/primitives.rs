use crate::gfx;
use crate::Error;

use maths_rs::prelude::*;

use std::collections::HashMap;

/// Vertex layout of the cube, matches `vertex_input_layout`
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub colour: [f32; 3],
}

/// An indexed mesh with its vertex and index buffers, the index buffer drops first
pub struct Mesh<D: gfx::Device> {
    pub ib: D::Buffer,
    pub vb: D::Buffer,
    pub num_indices: u32,
}

pub const NUM_CUBE_VERTICES: usize = 8;
pub const NUM_CUBE_INDICES: usize = 36;

/// Corners of a cube spanning -1..1, corner `i` has x, y, z set from bits 0, 1, 2
/// and is coloured by the same bits
pub const CUBE_VERTICES: [Vertex; NUM_CUBE_VERTICES] = [
    Vertex { position: [-1.0, -1.0, -1.0], colour: [0.0, 0.0, 0.0] },
    Vertex { position: [ 1.0, -1.0, -1.0], colour: [1.0, 0.0, 0.0] },
    Vertex { position: [-1.0,  1.0, -1.0], colour: [0.0, 1.0, 0.0] },
    Vertex { position: [ 1.0,  1.0, -1.0], colour: [1.0, 1.0, 0.0] },
    Vertex { position: [-1.0, -1.0,  1.0], colour: [0.0, 0.0, 1.0] },
    Vertex { position: [ 1.0, -1.0,  1.0], colour: [1.0, 0.0, 1.0] },
    Vertex { position: [-1.0,  1.0,  1.0], colour: [0.0, 1.0, 1.0] },
    Vertex { position: [ 1.0,  1.0,  1.0], colour: [1.0, 1.0, 1.0] },
];

/// Two triangles per face, clockwise when viewed from outside the cube
pub const CUBE_INDICES: [u16; NUM_CUBE_INDICES] = [
    // -z
    0, 2, 3,  0, 3, 1,
    // +z
    4, 7, 6,  4, 5, 7,
    // -x
    0, 4, 6,  0, 6, 2,
    // +x
    1, 3, 7,  1, 7, 5,
    // -y
    0, 1, 5,  0, 5, 4,
    // +y
    2, 6, 7,  2, 7, 3,
];

/// Input layout matching `Vertex`: POSITION then COLOR, both 3 floats
pub fn vertex_input_layout() -> Vec<gfx::InputElementInfo> {
    vec![
        gfx::InputElementInfo {
            semantic: String::from("POSITION"),
            index: 0,
            format: gfx::Format::RGB32f,
            input_slot: 0,
            aligned_byte_offset: 0,
        },
        gfx::InputElementInfo {
            semantic: String::from("COLOR"),
            index: 0,
            format: gfx::Format::RGB32f,
            input_slot: 0,
            aligned_byte_offset: 12,
        },
    ]
}

/// Iterate an index list as triangles
pub fn triangles(indices: &[u16]) -> impl Iterator<Item = [u16; 3]> + '_ {
    indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
}

fn edges(tri: [u16; 3]) -> [(u16, u16); 3] {
    [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])]
}

/// Number of triangles using each undirected edge, keys are ordered (low, high)
pub fn edge_use_counts(indices: &[u16]) -> HashMap<(u16, u16), usize> {
    let mut counts = HashMap::new();
    for tri in triangles(indices) {
        for (a, b) in edges(tri) {
            *counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }
    counts
}

/// True if every edge is shared by exactly two triangles and the winding is consistent,
/// meaning each directed edge appears once
pub fn is_closed_manifold(indices: &[u16]) -> bool {
    if indices.is_empty() || indices.len() % 3 != 0 {
        return false;
    }
    if edge_use_counts(indices).values().any(|c| *c != 2) {
        return false;
    }
    let mut directed = HashMap::new();
    for tri in triangles(indices) {
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            return false;
        }
        for edge in edges(tri) {
            if directed.insert(edge, ()).is_some() {
                return false;
            }
        }
    }
    true
}

/// Returns the unnormalised face normal of `tri`, pointing out of the front face
pub fn face_normal(vertices: &[Vertex], tri: [u16; 3]) -> Vec3f {
    let p = |i: u16| {
        let v = vertices[i as usize].position;
        Vec3f::new(v[0], v[1], v[2])
    };
    cross(p(tri[1]) - p(tri[0]), p(tri[2]) - p(tri[0]))
}

/// Create the cube vertex and index buffers
pub fn create_cube_mesh<D: gfx::Device>(dev: &mut D) -> Result<Mesh<D>, Error> {
    let vb = dev.create_buffer(&gfx::BufferInfo {
            usage: gfx::BufferUsage::Vertex,
            cpu_access: gfx::CpuAccessFlags::NONE,
            format: gfx::Format::Unknown,
            stride: std::mem::size_of::<Vertex>(),
            num_elements: CUBE_VERTICES.len(),
        },
        Some(&CUBE_VERTICES[..])
    )?;

    let ib = dev.create_buffer(&gfx::BufferInfo {
            usage: gfx::BufferUsage::Index,
            cpu_access: gfx::CpuAccessFlags::NONE,
            format: gfx::Format::R16u,
            stride: std::mem::size_of::<u16>(),
            num_elements: CUBE_INDICES.len(),
        },
        Some(&CUBE_INDICES[..])
    )?;

    Ok(Mesh {
        ib,
        vb,
        num_indices: CUBE_INDICES.len() as u32
    })
}
