//! Chunk streaming and cross-chunk ocean propagation.
//!
//! The manager owns the map from chunk coordinates to chunks and runs on the caller's
//! update thread. Each update compares the camera chunk against the last
//! one, unloads chunks outside the view radius plus a one-chunk buffer,
//! generates missing chunks, exchanges ocean edge data with loaded
//! neighbours, and rebuilds the aggregated tree/rock lists.

use crate::chunk::{edge_index, Chunk, ChunkGenerateParams};
use crate::settings::WorldSettings;
use glam::Vec3;
use procgen::{ClimateSettings, IntentMapper, SimplexNoise, TerrainSettings};
use std::collections::HashMap;
use std::sync::Arc;
use worldcore::{sea_level, ChunkCoord, ChunkEdge};

pub struct ChunkManager {
    settings: WorldSettings,
    terrain: TerrainSettings,
    climate: ClimateSettings,
    noise: Arc<SimplexNoise>,
    sea_level: f32,

    chunks: HashMap<(i32, i32), Chunk>,
    last_camera_chunk: Option<ChunkCoord>,

    tree_positions: Vec<Vec3>,
    rock_positions: Vec<Vec3>,
}

impl ChunkManager {
    pub fn new(settings: WorldSettings) -> Self {
        let mut terrain = IntentMapper::derive_settings(&settings.intent);
        terrain.width = settings.chunk_size;
        terrain.depth = settings.chunk_size;
        terrain.cell_size = settings.cell_size;
        terrain.seed = settings.seed;

        let climate = ClimateSettings::from_intent(&settings.climate);
        let noise = Arc::new(SimplexNoise::new(settings.seed));
        let sea = sea_level(
            terrain.base_height,
            terrain.height_scale,
            settings.sea_level_normalized,
        );

        log::info!(
            "chunk manager initialised (chunk size: {}, view distance: {})",
            settings.chunk_size,
            settings.view_distance
        );

        Self {
            settings,
            terrain,
            climate,
            noise,
            sea_level: sea,
            chunks: HashMap::new(),
            last_camera_chunk: None,
            tree_positions: Vec::new(),
            rock_positions: Vec::new(),
        }
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn terrain_settings(&self) -> &TerrainSettings {
        &self.terrain
    }

    pub fn sea_level(&self) -> f32 {
        self.sea_level
    }

    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunk_at_coord(&self, x: i32, z: i32) -> Option<&Chunk> {
        self.chunks.get(&(x, z))
    }

    pub fn chunk_at_world(&self, world_x: f32, world_z: f32) -> Option<&Chunk> {
        let coord = ChunkCoord::from_world(
            world_x,
            world_z,
            self.settings.chunk_size,
            self.settings.cell_size,
        );
        self.chunks.get(&(coord.x, coord.z))
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn all_tree_positions(&self) -> &[Vec3] {
        &self.tree_positions
    }

    pub fn all_rock_positions(&self) -> &[Vec3] {
        &self.rock_positions
    }

    /// Stream chunks around the camera. No-op while the camera stays in
    /// the same chunk.
    pub fn update(&mut self, camera_position: Vec3) {
        let camera_chunk = ChunkCoord::from_world(
            camera_position.x,
            camera_position.z,
            self.settings.chunk_size,
            self.settings.cell_size,
        );
        if self.last_camera_chunk == Some(camera_chunk) {
            return;
        }
        self.last_camera_chunk = Some(camera_chunk);

        let view = self.settings.view_distance;

        let mut to_load = Vec::new();
        for z in -view..=view {
            for x in -view..=view {
                let coord = ChunkCoord::new(camera_chunk.x + x, camera_chunk.z + z);
                if !self.chunks.contains_key(&(coord.x, coord.z)) {
                    to_load.push(coord);
                }
            }
        }

        let to_unload: Vec<(i32, i32)> = self
            .chunks
            .keys()
            .copied()
            .filter(|&(x, z)| ChunkCoord::new(x, z).chebyshev(camera_chunk) > view + 1)
            .collect();

        for key in &to_unload {
            self.unload_chunk(*key);
        }
        for coord in &to_load {
            self.load_chunk(*coord);
        }

        if !to_load.is_empty() || !to_unload.is_empty() {
            self.rebuild_object_positions();
            log::debug!(
                "chunks updated: {} loaded, {} unloaded, {} total",
                to_load.len(),
                to_unload.len(),
                self.chunks.len()
            );
        }
    }

    /// Destroy and regenerate every loaded chunk. Used after any settings
    /// change.
    pub fn regenerate_all(&mut self) {
        let coords: Vec<(i32, i32)> = self.chunks.keys().copied().collect();
        for key in &coords {
            self.chunks.remove(key);
        }
        for &(x, z) in &coords {
            self.load_chunk(ChunkCoord::new(x, z));
        }
        self.rebuild_object_positions();
        log::info!("regenerated {} chunks", coords.len());
    }

    /// Apply a new intent/settings block and rebuild the world.
    pub fn apply_settings(&mut self, settings: WorldSettings) {
        *self = ChunkManager::new(settings);
    }

    fn load_chunk(&mut self, coord: ChunkCoord) {
        let mut chunk = Chunk::new(coord, self.settings.chunk_size, self.settings.cell_size);

        // Pull ocean connectivity from already-loaded neighbours. Edge
        // arrays are copied across the boundary, never referenced.
        let mut neighbor_edges: [Option<Vec<bool>>; 4] = [None, None, None, None];
        let mut world_boundary = [false; 4];
        for edge in ChunkEdge::ALL {
            world_boundary[edge_index(edge)] = self.edge_is_world_boundary(coord, edge);
            let (dx, dz) = edge.offset();
            if let Some(neighbor) = self.chunks.get(&(coord.x + dx, coord.z + dz)) {
                neighbor_edges[edge_index(edge)] =
                    Some(neighbor.ocean().boundary().edge(edge.opposite()).to_vec());
            }
        }

        let params = ChunkGenerateParams {
            terrain: &self.terrain,
            intent: &self.settings.intent,
            climate: &self.climate,
            noise: self.noise.clone(),
            sea_level: self.sea_level,
            water_enabled: self.settings.water_enabled,
            world_boundary,
            neighbor_edges,
        };
        chunk.generate(&params);

        // Push this chunk's connectivity back out to loaded neighbours;
        // propagation is idempotent, so ordering does not matter.
        for edge in ChunkEdge::ALL {
            let (dx, dz) = edge.offset();
            let own_edge = chunk.ocean().boundary().edge(edge).to_vec();
            if let Some(neighbor) = self.chunks.get_mut(&(coord.x + dx, coord.z + dz)) {
                neighbor
                    .ocean_mut()
                    .propagate_from_neighbor(edge.opposite(), &own_edge);
            }
        }

        self.chunks.insert((coord.x, coord.z), chunk);
    }

    fn unload_chunk(&mut self, key: (i32, i32)) {
        if let Some(mut chunk) = self.chunks.remove(&key) {
            chunk.unload();
        }
    }

    /// An edge lies on the world boundary when the neighbour across it
    /// would fall outside the configured extent.
    fn edge_is_world_boundary(&self, coord: ChunkCoord, edge: ChunkEdge) -> bool {
        let Some(extent) = self.settings.world_extent else {
            return false;
        };
        let (dx, dz) = edge.offset();
        let nx = coord.x + dx;
        let nz = coord.z + dz;
        nx.abs() > extent || nz.abs() > extent
    }

    fn rebuild_object_positions(&mut self) {
        self.tree_positions.clear();
        self.rock_positions.clear();
        for chunk in self.chunks.values() {
            self.tree_positions.extend_from_slice(chunk.tree_positions());
            self.rock_positions.extend_from_slice(chunk.rock_positions());
        }
    }

    /// Terrain height at a world position, from whichever chunk holds it.
    pub fn height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        self.chunk_at_world(world_x, world_z)
            .map(|chunk| chunk.height_at_world(world_x, world_z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::find_preset;

    fn small_settings() -> WorldSettings {
        WorldSettings {
            chunk_size: 16,
            cell_size: 1.0,
            view_distance: 1,
            seed: 42,
            intent: find_preset("Rolling Temperate").unwrap().intent,
            ..WorldSettings::default()
        }
    }

    /// First update loads the full view square; an unmoved camera no-ops.
    #[test]
    fn update_loads_view_square() {
        let mut manager = ChunkManager::new(small_settings());
        manager.update(Vec3::ZERO);
        assert_eq!(manager.loaded_chunk_count(), 9);

        manager.update(Vec3::new(0.5, 0.0, 0.5));
        assert_eq!(manager.loaded_chunk_count(), 9);
    }

    /// Moving the camera far unloads distant chunks and loads new ones.
    #[test]
    fn movement_streams_chunks() {
        let mut manager = ChunkManager::new(small_settings());
        manager.update(Vec3::ZERO);
        manager.update(Vec3::new(16.0 * 5.0, 0.0, 0.0));
        assert_eq!(manager.loaded_chunk_count(), 9);
        assert!(manager.chunk_at_coord(5, 0).is_some());
        assert!(manager.chunk_at_coord(0, 0).is_none());
    }

    /// Height queries hit the owning chunk.
    #[test]
    fn height_query_resolves() {
        let mut manager = ChunkManager::new(small_settings());
        manager.update(Vec3::ZERO);
        assert!(manager.height_at(3.0, 3.0).is_some());
        assert!(manager.height_at(1000.0, 1000.0).is_none());
    }

    /// Regeneration keeps the same chunk set and identical terrain.
    #[test]
    fn regenerate_is_stable() {
        let mut manager = ChunkManager::new(small_settings());
        manager.update(Vec3::ZERO);
        let before: Vec<f32> = manager
            .chunk_at_coord(0, 0)
            .unwrap()
            .heightmap()
            .as_slice()
            .to_vec();
        manager.regenerate_all();
        assert_eq!(manager.loaded_chunk_count(), 9);
        let after = manager.chunk_at_coord(0, 0).unwrap().heightmap().as_slice();
        assert_eq!(before.as_slice(), after);
    }
}
