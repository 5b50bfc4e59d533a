//! Terrain mesh construction.
//!
//! Two modes: flat shading (six unique vertices per quad with face
//! normals, the low-poly look) and smooth shading (shared vertices with
//! accumulated area-weighted normals). Colours come from the global height
//! band table over `[base_height, base_height + height_scale]`, so bands
//! line up across chunk boundaries.

use crate::vertex::{MeshData, Vertex};
use glam::Vec3;
use procgen::{Heightmap, TerrainSettings};

/// Low-poly height band palette.
const DEEP_WATER: Vec3 = Vec3::new(0.1, 0.3, 0.5);
const SHALLOW_WATER: Vec3 = Vec3::new(0.2, 0.5, 0.7);
const SAND: Vec3 = Vec3::new(0.76, 0.7, 0.5);
const GRASS: Vec3 = Vec3::new(0.34, 0.55, 0.25);
const DARK_GRASS: Vec3 = Vec3::new(0.24, 0.42, 0.18);
const ROCK: Vec3 = Vec3::new(0.5, 0.5, 0.5);
const SNOW: Vec3 = Vec3::new(0.95, 0.95, 0.97);

/// Colour for a normalized height from the global band table.
pub fn height_color(normalized_height: f32, settings: &TerrainSettings) -> Vec3 {
    if normalized_height < settings.water_level * 0.5 {
        DEEP_WATER
    } else if normalized_height < settings.water_level {
        SHALLOW_WATER
    } else if normalized_height < settings.sand_level {
        SAND
    } else if normalized_height < settings.grass_level * 0.7 {
        GRASS
    } else if normalized_height < settings.grass_level {
        DARK_GRASS
    } else if normalized_height < settings.rock_level {
        ROCK
    } else {
        SNOW
    }
}

/// Build the terrain mesh for a chunk heightmap. Vertices are in chunk
/// local space; the renderer positions the chunk by its world transform.
pub fn build_terrain_mesh(heightmap: &Heightmap, settings: &TerrainSettings) -> MeshData {
    if settings.flat_shading {
        build_flat(heightmap, settings)
    } else {
        build_smooth(heightmap, settings)
    }
}

fn color_for(settings: &TerrainSettings, normalized: f32) -> Vec3 {
    if settings.use_height_colors {
        height_color(normalized, settings)
    } else {
        GRASS
    }
}

/// Flat shading: each triangle gets its own three vertices carrying the
/// face normal and the band colour of its centroid height.
fn build_flat(heightmap: &Heightmap, settings: &TerrainSettings) -> MeshData {
    let cells = settings.width;
    let cell_size = settings.cell_size;
    let mut mesh = MeshData::new();

    let min_height = settings.base_height;
    let height_range = if settings.height_scale > 0.001 {
        settings.height_scale
    } else {
        1.0
    };

    for z in 0..cells as i32 {
        for x in 0..cells as i32 {
            let x0 = x as f32 * cell_size;
            let x1 = (x + 1) as f32 * cell_size;
            let z0 = z as f32 * cell_size;
            let z1 = (z + 1) as f32 * cell_size;

            let h00 = heightmap.height(x, z);
            let h10 = heightmap.height(x + 1, z);
            let h01 = heightmap.height(x, z + 1);
            let h11 = heightmap.height(x + 1, z + 1);

            let p00 = Vec3::new(x0, h00, z0);
            let p10 = Vec3::new(x1, h10, z0);
            let p01 = Vec3::new(x0, h01, z1);
            let p11 = Vec3::new(x1, h11, z1);

            // Triangle 1: p00, p01, p10 (CCW)
            let normal1 = (p01 - p00).cross(p10 - p00).normalize();
            let norm_h1 = ((h00 + h10 + h01) / 3.0 - min_height) / height_range;
            let color1 = color_for(settings, norm_h1);
            push_triangle(&mut mesh, [p00, p01, p10], normal1, color1);

            // Triangle 2: p10, p01, p11 (CCW)
            let normal2 = (p01 - p10).cross(p11 - p10).normalize();
            let norm_h2 = ((h10 + h11 + h01) / 3.0 - min_height) / height_range;
            let color2 = color_for(settings, norm_h2);
            push_triangle(&mut mesh, [p10, p01, p11], normal2, color2);
        }
    }

    mesh
}

fn push_triangle(mesh: &mut MeshData, positions: [Vec3; 3], normal: Vec3, color: Vec3) {
    let base = mesh.vertices.len() as u32;
    for p in positions {
        mesh.vertices.push(Vertex::new(
            p.into(),
            normal.into(),
            color.into(),
            [0.0, 0.0],
        ));
    }
    mesh.indices.extend([base, base + 1, base + 2]);
}

/// Smooth shading: one vertex per grid point; triangle normals accumulate
/// unnormalized (area-weighted) into their corners, then normalize once.
fn build_smooth(heightmap: &Heightmap, settings: &TerrainSettings) -> MeshData {
    let cells = settings.width;
    let vertex_width = cells + 1;
    let cell_size = settings.cell_size;
    let mut mesh = MeshData::new();

    let min_height = settings.base_height;
    let height_range = if settings.height_scale > 0.001 {
        settings.height_scale
    } else {
        1.0
    };

    for z in 0..vertex_width as i32 {
        for x in 0..vertex_width as i32 {
            let height = heightmap.height(x, z);
            let normalized = (height - min_height) / height_range;
            let color = color_for(settings, normalized);
            mesh.vertices.push(Vertex::new(
                [x as f32 * cell_size, height, z as f32 * cell_size],
                [0.0, 1.0, 0.0],
                color.into(),
                [
                    x as f32 / cells as f32,
                    z as f32 / cells as f32,
                ],
            ));
        }
    }

    let mut normals = vec![Vec3::ZERO; mesh.vertices.len()];
    let idx = |x: usize, z: usize| z * vertex_width + x;

    for z in 0..cells {
        for x in 0..cells {
            let i00 = idx(x, z);
            let i10 = idx(x + 1, z);
            let i01 = idx(x, z + 1);
            let i11 = idx(x + 1, z + 1);

            let p00 = Vec3::from(mesh.vertices[i00].position);
            let p10 = Vec3::from(mesh.vertices[i10].position);
            let p01 = Vec3::from(mesh.vertices[i01].position);
            let p11 = Vec3::from(mesh.vertices[i11].position);

            mesh.indices
                .extend([i00 as u32, i01 as u32, i10 as u32]);
            let n1 = (p01 - p00).cross(p10 - p00);
            normals[i00] += n1;
            normals[i01] += n1;
            normals[i10] += n1;

            mesh.indices
                .extend([i10 as u32, i01 as u32, i11 as u32]);
            let n2 = (p01 - p10).cross(p11 - p10);
            normals[i10] += n2;
            normals[i01] += n2;
            normals[i11] += n2;
        }
    }

    for (vertex, normal) in mesh.vertices.iter_mut().zip(normals) {
        vertex.normal = normal.normalize_or_zero().into();
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::{IntentMapper, TerrainIntent};

    fn settings(cells: usize, flat: bool) -> TerrainSettings {
        let mut s = IntentMapper::derive_settings(&TerrainIntent::default());
        s.width = cells;
        s.depth = cells;
        s.cell_size = 1.0;
        s.flat_shading = flat;
        s
    }

    fn ramp(cells: usize) -> Heightmap {
        let mut hm = Heightmap::new(cells + 1, 0.0, 0.0, 1.0);
        for z in 0..=cells as i32 {
            for x in 0..=cells as i32 {
                hm.set(x, z, x as f32 * 0.5);
            }
        }
        hm
    }

    /// Flat mode emits 6 unique vertices per quad.
    #[test]
    fn flat_mode_vertex_count() {
        let cells = 8;
        let mesh = build_terrain_mesh(&ramp(cells), &settings(cells, true));
        assert_eq!(mesh.vertices.len(), cells * cells * 6);
        assert_eq!(mesh.indices.len(), cells * cells * 6);
    }

    /// Smooth mode shares one vertex per grid point.
    #[test]
    fn smooth_mode_vertex_count() {
        let cells = 8;
        let mesh = build_terrain_mesh(&ramp(cells), &settings(cells, false));
        assert_eq!(mesh.vertices.len(), (cells + 1) * (cells + 1));
        assert_eq!(mesh.indices.len(), cells * cells * 6);
    }

    /// Normals face generally upward on a gentle ramp.
    #[test]
    fn normals_point_up() {
        let cells = 8;
        for flat in [true, false] {
            let mesh = build_terrain_mesh(&ramp(cells), &settings(cells, flat));
            for v in &mesh.vertices {
                assert!(v.normal[1] > 0.0, "downward normal in flat={flat}");
            }
        }
    }

    /// The band table is monotone from water to snow.
    #[test]
    fn height_bands_progress() {
        let s = settings(4, true);
        assert_eq!(height_color(0.0, &s), DEEP_WATER);
        assert_eq!(height_color(0.22, &s), SAND);
        assert_eq!(height_color(0.99, &s), SNOW);
    }
}
