//! Lake surface meshes.
//!
//! A lake renders as one flat quad per submerged cell at the basin's
//! surface height, coloured shallow to deep by per-cell water depth.
//! Lakes under three cells are skipped as degenerate.

use crate::vertex::{MeshData, Vertex};
use glam::Vec3;
use procgen::{LakeBasin, LakeNetwork};

/// Visual settings for lake surfaces.
#[derive(Debug, Clone)]
pub struct LakeMeshSettings {
    pub shallow_color: Vec3,
    pub deep_color: Vec3,
    /// Depth at which the colour reaches fully deep.
    pub color_depth_scale: f32,
}

impl Default for LakeMeshSettings {
    fn default() -> Self {
        Self {
            shallow_color: Vec3::new(0.2, 0.55, 0.6),
            deep_color: Vec3::new(0.03, 0.15, 0.35),
            color_depth_scale: 8.0,
        }
    }
}

/// Minimum basin size worth a mesh.
const MIN_LAKE_CELLS: usize = 3;

/// Builds lake surface meshes.
pub struct LakeMeshBuilder {
    settings: LakeMeshSettings,
}

impl Default for LakeMeshBuilder {
    fn default() -> Self {
        Self::new(LakeMeshSettings::default())
    }
}

impl LakeMeshBuilder {
    pub fn new(settings: LakeMeshSettings) -> Self {
        Self { settings }
    }

    /// One mesh per sufficiently large basin.
    pub fn build_lakes(&self, network: &LakeNetwork, cell_size: f32) -> Vec<MeshData> {
        network
            .lakes
            .iter()
            .filter(|basin| basin.cells.len() >= MIN_LAKE_CELLS)
            .map(|basin| self.build_basin(basin, network, cell_size))
            .collect()
    }

    /// All basins combined into a single mesh.
    pub fn build_combined(&self, network: &LakeNetwork, cell_size: f32) -> MeshData {
        let mut combined = MeshData::new();
        for mesh in self.build_lakes(network, cell_size) {
            combined.append(&mesh);
        }
        combined
    }

    fn build_basin(&self, basin: &LakeBasin, network: &LakeNetwork, cell_size: f32) -> MeshData {
        let mut mesh = MeshData::new();
        let y = basin.surface_height;
        let up = [0.0, 1.0, 0.0];

        for cell in &basin.cells {
            let depth = network.cell_lake_depth.get_or(cell.x, cell.y, 0.0);
            let color = self.depth_color(depth);

            let x0 = cell.x as f32 * cell_size;
            let x1 = (cell.x + 1) as f32 * cell_size;
            let z0 = cell.y as f32 * cell_size;
            let z1 = (cell.y + 1) as f32 * cell_size;

            let base = mesh.vertices.len() as u32;
            mesh.vertices
                .push(Vertex::new([x0, y, z0], up, color.into(), [0.0, 0.0]));
            mesh.vertices
                .push(Vertex::new([x1, y, z0], up, color.into(), [1.0, 0.0]));
            mesh.vertices
                .push(Vertex::new([x1, y, z1], up, color.into(), [1.0, 1.0]));
            mesh.vertices
                .push(Vertex::new([x0, y, z1], up, color.into(), [0.0, 1.0]));

            // Two CCW triangles per cell quad
            mesh.indices
                .extend([base, base + 3, base + 1, base + 1, base + 3, base + 2]);
        }

        mesh
    }

    fn depth_color(&self, depth: f32) -> Vec3 {
        let t = (depth / self.settings.color_depth_scale).min(1.0);
        self.settings.shallow_color + (self.settings.deep_color - self.settings.shallow_color) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::{DrainageGraph, Heightmap, LakeGenerator, LakeSettings};

    fn bowl_network() -> LakeGenerator {
        let cells = 24;
        let mut hm = Heightmap::new(cells + 1, 0.0, 0.0, 1.0);
        let c = cells as f32 / 2.0;
        for z in 0..=cells as i32 {
            for x in 0..=cells as i32 {
                let dx = x as f32 - c;
                let dz = z as f32 - c;
                hm.set(x, z, (dx * dx + dz * dz).sqrt() * 1.5);
            }
        }
        let drainage = DrainageGraph::compute(&hm, cells, 1.0, -100.0);
        let mut gen = LakeGenerator::new(LakeSettings {
            min_basin_size: 5,
            ..LakeSettings::default()
        });
        gen.generate(&drainage, &hm, -100.0);
        gen
    }

    /// Each lake cell contributes one quad at the surface height.
    #[test]
    fn basin_mesh_is_flat_quads() {
        let gen = bowl_network();
        let meshes = LakeMeshBuilder::default().build_lakes(gen.network(), 1.0);
        assert!(!meshes.is_empty(), "bowl should produce a lake mesh");

        let basin = &gen.network().lakes[0];
        let mesh = &meshes[0];
        assert_eq!(mesh.vertices.len(), basin.cells.len() * 4);
        for v in &mesh.vertices {
            assert_eq!(v.position[1], basin.surface_height);
        }
    }

    /// Deeper cells render darker.
    #[test]
    fn depth_darkens_color() {
        let b = LakeMeshBuilder::default();
        assert!(b.depth_color(10.0).length() < b.depth_color(0.5).length());
    }
}
