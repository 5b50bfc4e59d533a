//! Vertex types and CPU-side mesh data.
//!
//! These are the contracts consumed by the renderer collaborator: plain
//! `Pod` structs it can upload byte-for-byte into vertex and index
//! buffers. Winding is counter-clockwise throughout.

use bytemuck::{Pod, Zeroable};

/// Terrain/water vertex: position, normal, colour, UV.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            color,
            uv,
        }
    }
}

/// Mesh data before GPU upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Append another mesh, rebasing its indices.
    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Vertex layout is tightly packed: 11 floats.
    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 11 * 4);
    }

    #[test]
    fn append_rebases_indices() {
        let v = Vertex::new([0.0; 3], [0.0, 1.0, 0.0], [1.0; 3], [0.0; 2]);
        let mut a = MeshData {
            vertices: vec![v; 3],
            indices: vec![0, 1, 2],
        };
        let b = MeshData {
            vertices: vec![v; 3],
            indices: vec![0, 1, 2],
        };
        a.append(&b);
        assert_eq!(a.indices, vec![0, 1, 2, 3, 4, 5]);
    }
}
