//! Ocean mask: distinguishing oceans from inland seas.
//!
//! A cell is ocean when it is below sea level AND connected to the world
//! boundary. Connectivity is a 4-connected flood fill seeded from edges
//! declared to be at the world boundary, or from neighbouring chunks'
//! edge data. Neighbour propagation is idempotent: every cell transitions
//! from not-ocean to ocean at most once, so any order of propagation calls
//! converges to the same mask.

use crate::heightmap::Heightmap;
use std::collections::VecDeque;
use worldcore::{ChunkEdge, Grid};

/// Ocean connectivity along the four chunk edges, exchanged with
/// neighbours by copy, never by reference.
#[derive(Debug, Clone, Default)]
pub struct OceanBoundary {
    pub neg_x: Vec<bool>,
    pub pos_x: Vec<bool>,
    pub neg_z: Vec<bool>,
    pub pos_z: Vec<bool>,
}

impl OceanBoundary {
    fn new(cells: usize) -> Self {
        Self {
            neg_x: vec![false; cells],
            pos_x: vec![false; cells],
            neg_z: vec![false; cells],
            pos_z: vec![false; cells],
        }
    }

    /// The connectivity array along one edge.
    pub fn edge(&self, edge: ChunkEdge) -> &[bool] {
        match edge {
            ChunkEdge::NegX => &self.neg_x,
            ChunkEdge::PosX => &self.pos_x,
            ChunkEdge::NegZ => &self.neg_z,
            ChunkEdge::PosZ => &self.pos_z,
        }
    }
}

/// Per-chunk ocean classification.
#[derive(Debug, Clone)]
pub struct OceanMask {
    below_sea: Grid<bool>,
    ocean: Grid<bool>,
    boundary: OceanBoundary,
    flood_fill_complete: bool,
}

impl OceanMask {
    pub fn new(cells: usize) -> Self {
        Self {
            below_sea: Grid::new(cells, cells, false),
            ocean: Grid::new(cells, cells, false),
            boundary: OceanBoundary::new(cells),
            flood_fill_complete: false,
        }
    }

    pub fn cells(&self) -> usize {
        self.below_sea.width()
    }

    /// Rebuild the below-sea mask from heights. Resets the ocean mask; a
    /// new flood fill is required afterwards.
    pub fn generate_below_sea_mask(&mut self, heightmap: &Heightmap, sea_level: f32) {
        let cells = self.cells() as i32;
        for z in 0..cells {
            for x in 0..cells {
                self.below_sea.set(x, z, heightmap.height(x, z) < sea_level);
            }
        }
        self.ocean.fill(false);
        self.boundary = OceanBoundary::new(self.cells());
        self.flood_fill_complete = false;
    }

    /// Flood fill ocean connectivity. Edges where `is_at_world_boundary`
    /// returns true seed every below-sea cell on that edge; otherwise the
    /// neighbour's matching edge (when provided) seeds the cells it
    /// reports as connected.
    pub fn flood_fill_from_boundary(
        &mut self,
        is_at_world_boundary: impl Fn(ChunkEdge) -> bool,
        neighbor_edges: impl Fn(ChunkEdge) -> Option<Vec<bool>>,
    ) {
        let cells = self.cells() as i32;
        let mut seeds = Vec::new();

        for edge in ChunkEdge::ALL {
            if is_at_world_boundary(edge) {
                for i in 0..cells {
                    let (x, z) = Self::edge_cell(edge, i, cells);
                    if self.below_sea.get_or(x, z, false) {
                        seeds.push((x, z));
                    }
                }
            } else if let Some(neighbor) = neighbor_edges(edge) {
                for i in 0..cells.min(neighbor.len() as i32) {
                    let (x, z) = Self::edge_cell(edge, i, cells);
                    if neighbor[i as usize] && self.below_sea.get_or(x, z, false) {
                        seeds.push((x, z));
                    }
                }
            }
        }

        self.flood_fill_bfs(&seeds);
        self.update_boundary_from_mask();
        self.flood_fill_complete = true;
    }

    /// Seed newly reachable cells on one edge from a neighbour's matching
    /// edge data and continue the fill. Safe to call repeatedly.
    pub fn propagate_from_neighbor(&mut self, edge: ChunkEdge, neighbor_edge: &[bool]) {
        let cells = self.cells() as i32;
        let mut seeds = Vec::new();

        for i in 0..cells.min(neighbor_edge.len() as i32) {
            let (x, z) = Self::edge_cell(edge, i, cells);
            if neighbor_edge[i as usize]
                && self.below_sea.get_or(x, z, false)
                && !self.ocean.get_or(x, z, false)
            {
                seeds.push((x, z));
            }
        }

        if !seeds.is_empty() {
            self.flood_fill_bfs(&seeds);
            self.update_boundary_from_mask();
        }
    }

    /// The i-th cell along an edge.
    fn edge_cell(edge: ChunkEdge, i: i32, cells: i32) -> (i32, i32) {
        match edge {
            ChunkEdge::NegX => (0, i),
            ChunkEdge::PosX => (cells - 1, i),
            ChunkEdge::NegZ => (i, 0),
            ChunkEdge::PosZ => (i, cells - 1),
        }
    }

    fn flood_fill_bfs(&mut self, seeds: &[(i32, i32)]) {
        if seeds.is_empty() {
            return;
        }

        let mut queue = VecDeque::new();
        for &(x, z) in seeds {
            if self.below_sea.get_or(x, z, false) && !self.ocean.get_or(x, z, false) {
                self.ocean.set(x, z, true);
                queue.push_back((x, z));
            }
        }

        const DX: [i32; 4] = [-1, 1, 0, 0];
        const DZ: [i32; 4] = [0, 0, -1, 1];

        while let Some((x, z)) = queue.pop_front() {
            for dir in 0..4 {
                let nx = x + DX[dir];
                let nz = z + DZ[dir];
                if self.below_sea.get_or(nx, nz, false) && !self.ocean.get_or(nx, nz, false) {
                    self.ocean.set(nx, nz, true);
                    queue.push_back((nx, nz));
                }
            }
        }
    }

    fn update_boundary_from_mask(&mut self) {
        let cells = self.cells() as i32;
        for z in 0..cells {
            self.boundary.neg_x[z as usize] = self.ocean.get_or(0, z, false);
            self.boundary.pos_x[z as usize] = self.ocean.get_or(cells - 1, z, false);
        }
        for x in 0..cells {
            self.boundary.neg_z[x as usize] = self.ocean.get_or(x, 0, false);
            self.boundary.pos_z[x as usize] = self.ocean.get_or(x, cells - 1, false);
        }
    }

    /// Edge connectivity for cross-chunk propagation.
    pub fn boundary(&self) -> &OceanBoundary {
        &self.boundary
    }

    /// Below sea level AND connected to the world boundary.
    pub fn is_ocean(&self, x: i32, z: i32) -> bool {
        self.ocean.get_or(x, z, false)
    }

    /// Below sea level; may be ocean or inland water.
    pub fn is_below_sea_level(&self, x: i32, z: i32) -> bool {
        self.below_sea.get_or(x, z, false)
    }

    /// Below sea level but NOT connected to the ocean.
    pub fn is_inland_lake(&self, x: i32, z: i32) -> bool {
        self.below_sea.get_or(x, z, false) && !self.ocean.get_or(x, z, false)
    }

    pub fn is_flood_fill_complete(&self) -> bool {
        self.flood_fill_complete
    }

    /// Mark the mask as needing a new flood fill.
    pub fn mark_dirty(&mut self) {
        self.flood_fill_complete = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_heightmap(cells: usize, height: f32) -> Heightmap {
        let mut hm = Heightmap::new(cells + 1, 0.0, 0.0, 1.0);
        for z in 0..=cells as i32 {
            for x in 0..=cells as i32 {
                hm.set(x, z, height);
            }
        }
        hm
    }

    /// Everything below sea with all edges at the world boundary: ocean
    /// coincides exactly with the below-sea mask.
    #[test]
    fn fully_submerged_world_boundary_chunk_is_all_ocean() {
        let cells = 16;
        let hm = flat_heightmap(cells, -5.0);
        let mut mask = OceanMask::new(cells);
        mask.generate_below_sea_mask(&hm, 0.0);
        mask.flood_fill_from_boundary(|_| true, |_| None);

        for z in 0..cells as i32 {
            for x in 0..cells as i32 {
                assert_eq!(mask.is_ocean(x, z), mask.is_below_sea_level(x, z));
                assert!(mask.is_ocean(x, z));
            }
        }
    }

    /// A submerged interior ringed by land, with no boundary edges, is an
    /// inland lake: below sea yet never ocean.
    #[test]
    fn enclosed_depression_is_inland_lake() {
        let cells = 16;
        let mut hm = flat_heightmap(cells, 10.0);
        for z in 4..12 {
            for x in 4..12 {
                hm.set(x, z, -2.0);
            }
        }
        let mut mask = OceanMask::new(cells);
        mask.generate_below_sea_mask(&hm, 0.0);
        mask.flood_fill_from_boundary(|_| false, |_| None);

        for z in 4..12 {
            for x in 4..12 {
                assert!(mask.is_below_sea_level(x, z));
                assert!(!mask.is_ocean(x, z));
                assert!(mask.is_inland_lake(x, z));
            }
        }
    }

    /// Ocean connectivity arriving through a neighbour edge floods the
    /// connected below-sea region.
    #[test]
    fn propagation_floods_from_neighbor_edge() {
        let cells = 8;
        let hm = flat_heightmap(cells, -1.0);
        let mut mask = OceanMask::new(cells);
        mask.generate_below_sea_mask(&hm, 0.0);
        mask.flood_fill_from_boundary(|_| false, |_| None);
        assert!(!mask.is_ocean(4, 4));

        let neighbor_edge = vec![true; cells];
        mask.propagate_from_neighbor(ChunkEdge::NegX, &neighbor_edge);
        assert!(mask.is_ocean(4, 4), "fill should reach the interior");
        assert!(mask.boundary().edge(ChunkEdge::PosX).iter().all(|&b| b));
    }

    /// Propagating the same neighbour edges twice yields the same mask.
    #[test]
    fn propagation_is_idempotent() {
        let cells = 8;
        let mut hm = flat_heightmap(cells, 5.0);
        for z in 0..cells as i32 {
            for x in 0..4 {
                hm.set(x, z, -1.0);
            }
        }
        let mut mask = OceanMask::new(cells);
        mask.generate_below_sea_mask(&hm, 0.0);
        mask.flood_fill_from_boundary(|_| false, |_| None);

        let neighbor_edge = vec![true; cells];
        mask.propagate_from_neighbor(ChunkEdge::NegX, &neighbor_edge);
        let first: Vec<bool> = (0..cells as i32)
            .flat_map(|z| (0..cells as i32).map(move |x| (x, z)))
            .map(|(x, z)| mask.is_ocean(x, z))
            .collect();

        mask.propagate_from_neighbor(ChunkEdge::NegX, &neighbor_edge);
        let second: Vec<bool> = (0..cells as i32)
            .flat_map(|z| (0..cells as i32).map(move |x| (x, z)))
            .map(|(x, z)| mask.is_ocean(x, z))
            .collect();

        assert_eq!(first, second);
    }
}
