//! River surface meshes.
//!
//! Rivers render as ribbon geometry: one quad per segment spanning from
//! the segment centre toward the next segment downstream, at the water
//! surface height plus a small offset against z-fighting. Colour blends
//! shallow to deep with depth and toward foam on steep drops.

use crate::vertex::{MeshData, Vertex};
use glam::{Vec2, Vec3};
use procgen::{RiverNetwork, RiverPath, RiverSegment, WaterType};

/// Visual settings for river ribbons.
#[derive(Debug, Clone)]
pub struct RiverMeshSettings {
    /// Lift above the carved water surface to avoid z-fighting.
    pub surface_offset: f32,
    pub shallow_color: Vec3,
    pub deep_color: Vec3,
    pub foam_color: Vec3,
    /// Local slope above which foam blends in.
    pub foam_threshold: f32,
}

impl Default for RiverMeshSettings {
    fn default() -> Self {
        Self {
            surface_offset: 0.05,
            shallow_color: Vec3::new(0.25, 0.55, 0.65),
            deep_color: Vec3::new(0.05, 0.2, 0.4),
            foam_color: Vec3::new(0.9, 0.95, 1.0),
            foam_threshold: 0.6,
        }
    }
}

/// Builds ribbon meshes for river networks.
pub struct RiverMeshBuilder {
    settings: RiverMeshSettings,
}

impl Default for RiverMeshBuilder {
    fn default() -> Self {
        Self::new(RiverMeshSettings::default())
    }
}

impl RiverMeshBuilder {
    pub fn new(settings: RiverMeshSettings) -> Self {
        Self { settings }
    }

    /// One combined mesh covering every river and stream segment.
    pub fn build_combined(&self, network: &RiverNetwork, cell_size: f32) -> MeshData {
        let mut mesh = MeshData::new();

        for segment in &network.segments {
            if segment.water_type != WaterType::Stream && segment.water_type != WaterType::River {
                continue;
            }
            let next = segment.downstream.map(|i| &network.segments[i]);
            self.ribbon_segment(segment, next, cell_size, &mut mesh);
        }

        mesh
    }

    /// One mesh per traced river path. Paths shorter than two segments are
    /// degenerate geometry and are skipped.
    pub fn build_paths(&self, network: &RiverNetwork, cell_size: f32) -> Vec<MeshData> {
        let mut meshes = Vec::new();

        for path in &network.rivers {
            if path.segment_indices.len() < 2 {
                continue;
            }
            meshes.push(self.build_path(path, network, cell_size));
        }

        meshes
    }

    fn build_path(&self, path: &RiverPath, network: &RiverNetwork, cell_size: f32) -> MeshData {
        let mut mesh = MeshData::new();
        for (i, &seg_idx) in path.segment_indices.iter().enumerate() {
            let segment = &network.segments[seg_idx];
            let next = path
                .segment_indices
                .get(i + 1)
                .map(|&n| &network.segments[n]);
            self.ribbon_segment(segment, next, cell_size, &mut mesh);
        }
        mesh
    }

    /// Emit a 4-vertex quad from this segment's centre toward the next.
    fn ribbon_segment(
        &self,
        segment: &RiverSegment,
        next: Option<&RiverSegment>,
        cell_size: f32,
        mesh: &mut MeshData,
    ) {
        let cx = (segment.cell.x as f32 + 0.5) * cell_size;
        let cz = (segment.cell.y as f32 + 0.5) * cell_size;
        let cy = segment.surface_height + self.settings.surface_offset;

        // Direction toward the next segment, or straight on at a terminus
        let (nx, nz, ny) = match next {
            Some(n) => (
                (n.cell.x as f32 + 0.5) * cell_size,
                (n.cell.y as f32 + 0.5) * cell_size,
                n.surface_height + self.settings.surface_offset,
            ),
            None => (cx + cell_size, cz, cy),
        };

        let dir = Vec2::new(nx - cx, nz - cz).normalize_or_zero();
        if dir == Vec2::ZERO {
            return;
        }
        let perp = Vec2::new(-dir.y, dir.x);
        let half_width = segment.width * 0.5;

        // Local slope along the ribbon drives foam
        let run = Vec2::new(nx - cx, nz - cz).length().max(1e-3);
        let slope = (cy - ny).max(0.0) / run;
        let color = self.flow_color(segment.depth, slope);

        let up = [0.0, 1.0, 0.0];
        let base = mesh.vertices.len() as u32;

        mesh.vertices.push(Vertex::new(
            [cx - perp.x * half_width, cy, cz - perp.y * half_width],
            up,
            color.into(),
            [0.0, 0.0],
        ));
        mesh.vertices.push(Vertex::new(
            [cx + perp.x * half_width, cy, cz + perp.y * half_width],
            up,
            color.into(),
            [1.0, 0.0],
        ));
        mesh.vertices.push(Vertex::new(
            [nx - perp.x * half_width, ny, nz - perp.y * half_width],
            up,
            color.into(),
            [0.0, 1.0],
        ));
        mesh.vertices.push(Vertex::new(
            [nx + perp.x * half_width, ny, nz + perp.y * half_width],
            up,
            color.into(),
            [1.0, 1.0],
        ));

        // Two CCW triangles
        mesh.indices
            .extend([base, base + 2, base + 1, base + 1, base + 2, base + 3]);
    }

    /// Shallow to deep by depth, blended toward foam above the threshold.
    fn flow_color(&self, depth: f32, slope: f32) -> Vec3 {
        let s = &self.settings;
        let depth_factor = (depth / 5.0).min(1.0);
        let mut color = s.shallow_color + (s.deep_color - s.shallow_color) * depth_factor;

        if slope > s.foam_threshold {
            let foam = (slope - s.foam_threshold) / (1.0 - s.foam_threshold);
            color += (s.foam_color - color) * (foam.min(1.0) * 0.5);
        }

        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::{DrainageGraph, Heightmap, RiverGenerator, RiverSettings};

    fn network() -> (RiverGenerator, f32) {
        let cells = 24;
        let mut hm = Heightmap::new(cells + 1, 0.0, 0.0, 1.0);
        for z in 0..=cells as i32 {
            for x in 0..=cells as i32 {
                let ridge = (z as f32 - cells as f32 / 2.0).abs() * 2.0;
                hm.set(x, z, 40.0 - x as f32 + ridge);
            }
        }
        let drainage = DrainageGraph::compute(&hm, cells, 1.0, -100.0);
        let mut settings = RiverSettings::from_strength(1.0);
        settings.stream_threshold = 4;
        let mut gen = RiverGenerator::new(settings, 1.0);
        gen.generate(&drainage, &hm, -100.0);
        (gen, 1.0)
    }

    /// Each ribbon segment contributes 4 vertices and 6 indices.
    #[test]
    fn combined_mesh_quad_counts() {
        let (gen, cell_size) = network();
        let mesh = RiverMeshBuilder::default().build_combined(gen.network(), cell_size);
        assert!(!mesh.is_empty());
        assert_eq!(mesh.vertices.len() % 4, 0);
        assert_eq!(mesh.indices.len() / 6, mesh.vertices.len() / 4);
    }

    /// Per-path meshes skip degenerate single-segment paths.
    #[test]
    fn short_paths_skipped() {
        let (gen, cell_size) = network();
        let meshes = RiverMeshBuilder::default().build_paths(gen.network(), cell_size);
        for mesh in &meshes {
            assert!(mesh.vertices.len() >= 8, "path mesh below two quads");
        }
    }

    /// Deeper water renders darker.
    #[test]
    fn depth_darkens_color() {
        let b = RiverMeshBuilder::default();
        let shallow = b.flow_color(0.1, 0.0);
        let deep = b.flow_color(6.0, 0.0);
        assert!(deep.length() < shallow.length());
    }
}
