//! Ocean surface planes.
//!
//! A subdivided flat quad at sea level, one per chunk, animated by the
//! water shader using the time uniform. Subdivision gives the vertex
//! shader something to displace for waves.

use crate::vertex::{MeshData, Vertex};

const WATER_COLOR: [f32; 3] = [0.1, 0.35, 0.55];

/// Build a chunk-sized water plane at `sea_level`, `subdivisions` quads
/// per side, in chunk local space.
pub fn build_water_plane(chunk_span: f32, subdivisions: usize, sea_level: f32) -> MeshData {
    let mut mesh = MeshData::new();
    let n = subdivisions.max(1);
    let step = chunk_span / n as f32;
    let up = [0.0, 1.0, 0.0];

    for z in 0..=n {
        for x in 0..=n {
            mesh.vertices.push(Vertex::new(
                [x as f32 * step, sea_level, z as f32 * step],
                up,
                WATER_COLOR,
                [x as f32 / n as f32, z as f32 / n as f32],
            ));
        }
    }

    let vertex_width = (n + 1) as u32;
    for z in 0..n as u32 {
        for x in 0..n as u32 {
            let i00 = z * vertex_width + x;
            let i10 = i00 + 1;
            let i01 = i00 + vertex_width;
            let i11 = i01 + 1;
            mesh.indices.extend([i00, i01, i10, i10, i01, i11]);
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_counts_and_height() {
        let mesh = build_water_plane(32.0, 8, 4.5);
        assert_eq!(mesh.vertices.len(), 9 * 9);
        assert_eq!(mesh.indices.len(), 8 * 8 * 6);
        assert!(mesh.vertices.iter().all(|v| v.position[1] == 4.5));
    }
}
