//! Chunk coordinates and deterministic seed derivation.
//!
//! A chunk is identified by integer coordinates `(x, z)`. Its origin in
//! world units is `(x * cells * cell_size, z * cells * cell_size)`. All
//! noise is sampled at world coordinates so a cell's value never depends on
//! which chunk contains it; only per-chunk randomness (hydraulic droplets,
//! object placement) uses the mixed chunk seed.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Padding border, in cells, used during erosion and drainage so chunk
/// edges see the same neighbourhood a mid-chunk cell would.
pub const BORDER: usize = 8;

/// Integer chunk coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World-space origin of this chunk.
    pub fn world_origin(&self, cells_per_side: usize, cell_size: f32) -> Vec3 {
        let span = cells_per_side as f32 * cell_size;
        Vec3::new(self.x as f32 * span, 0.0, self.z as f32 * span)
    }

    /// Chunk containing a world position.
    pub fn from_world(world_x: f32, world_z: f32, cells_per_side: usize, cell_size: f32) -> Self {
        let span = cells_per_side as f32 * cell_size;
        Self {
            x: (world_x / span).floor() as i32,
            z: (world_z / span).floor() as i32,
        }
    }

    /// Chebyshev distance to another chunk, used for view-radius checks.
    pub fn chebyshev(&self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

/// Derive a deterministic per-chunk seed from the world seed.
/// Same (seed, coord) always gives the same result so chunk-local
/// randomness is reproducible regardless of load order.
#[inline]
pub fn chunk_seed(world_seed: u32, coord: ChunkCoord) -> u32 {
    world_seed
        ^ (coord.x.wrapping_mul(198491317) as u32 ^ coord.z.wrapping_mul(6542989) as u32)
}

/// The four edges of a chunk, used for ocean connectivity exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkEdge {
    NegX,
    PosX,
    NegZ,
    PosZ,
}

impl ChunkEdge {
    pub const ALL: [ChunkEdge; 4] = [
        ChunkEdge::NegX,
        ChunkEdge::PosX,
        ChunkEdge::NegZ,
        ChunkEdge::PosZ,
    ];

    /// The matching edge as seen from the neighbouring chunk.
    pub fn opposite(self) -> ChunkEdge {
        match self {
            ChunkEdge::NegX => ChunkEdge::PosX,
            ChunkEdge::PosX => ChunkEdge::NegX,
            ChunkEdge::NegZ => ChunkEdge::PosZ,
            ChunkEdge::PosZ => ChunkEdge::NegZ,
        }
    }

    /// Chunk-coordinate offset toward the neighbour across this edge.
    pub fn offset(self) -> (i32, i32) {
        match self {
            ChunkEdge::NegX => (-1, 0),
            ChunkEdge::PosX => (1, 0),
            ChunkEdge::NegZ => (0, -1),
            ChunkEdge::PosZ => (0, 1),
        }
    }
}

/// Absolute sea level from the normalized setting.
/// `sea_level = base_height + height_scale * normalized` (typical: 0.45).
#[inline]
pub fn sea_level(base_height: f32, height_scale: f32, normalized: f32) -> f32 {
    base_height + height_scale * normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Same (seed, coord) always yields the same chunk seed; neighbours differ.
    #[test]
    fn chunk_seed_deterministic_and_distinct() {
        let a = chunk_seed(12345, ChunkCoord::new(3, -2));
        let b = chunk_seed(12345, ChunkCoord::new(3, -2));
        let c = chunk_seed(12345, ChunkCoord::new(4, -2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn world_to_chunk_roundtrip() {
        let coord = ChunkCoord::from_world(-0.5, 70.0, 64, 1.0);
        assert_eq!(coord, ChunkCoord::new(-1, 1));
        let origin = ChunkCoord::new(2, 3).world_origin(64, 0.5);
        assert_eq!(origin.x, 64.0);
        assert_eq!(origin.z, 96.0);
    }

    #[test]
    fn edge_opposite_is_involution() {
        for edge in ChunkEdge::ALL {
            assert_eq!(edge.opposite().opposite(), edge);
        }
    }
}
