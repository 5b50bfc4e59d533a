//! A chunk: one complete pipeline instance.
//!
//! Each chunk exclusively owns every field array it produces. Generation
//! runs the ten stages sequentially under the pipeline validator, from
//! heightmap and erosion through drainage, water bodies, hydrology,
//! climate, biomes, and materials to meshes. River and lake carving modify the
//! heightmap between erosion and the drainage recompute, so every
//! downstream consumer sees the carved terrain.

use glam::Vec3;
use meshgen::{
    build_terrain_mesh, build_water_plane, LakeMeshBuilder, MeshData, RiverMeshBuilder,
};
use procgen::{
    BiomeClassifier, BiomeType, ClimateGenerator, ClimateSettings, DrainageGraph, FieldSampler,
    Heightmap, HeightmapGenerator, HydrologyGenerator, HydrologySettings, LakeGenerator,
    LakeSettings, MaterialBlender, MaterialSettings, MaterialType, OceanMask, RiverGenerator,
    RiverSettings, SimplexNoise, TerrainIntent, TerrainSettings, WaterType, WetlandDetector,
    WetlandSettings,
};
use rand::prelude::*;
use std::sync::Arc;
use worldcore::{chunk_seed, ChunkCoord, ChunkEdge, Grid, PipelineStage, PipelineValidator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Unloaded,
    Generated,
}

/// Inputs a chunk needs for one generation pass. Neighbour edge data is
/// copied in, never referenced across the chunk boundary.
pub struct ChunkGenerateParams<'a> {
    pub terrain: &'a TerrainSettings,
    pub intent: &'a TerrainIntent,
    pub climate: &'a ClimateSettings,
    pub noise: Arc<SimplexNoise>,
    pub sea_level: f32,
    pub water_enabled: bool,
    /// Which of this chunk's edges lie on the world boundary,
    /// indexed by [`ChunkEdge::ALL`] order.
    pub world_boundary: [bool; 4],
    /// Ocean connectivity of each neighbour's facing edge, same order.
    pub neighbor_edges: [Option<Vec<bool>>; 4],
}

/// One generated chunk with all its field arrays and meshes.
pub struct Chunk {
    coord: ChunkCoord,
    cells: usize,
    cell_size: f32,
    state: ChunkState,
    validator: PipelineValidator,

    heightmap: Heightmap,
    cell_heights: Grid<f32>,
    drainage: Option<DrainageGraph>,
    rivers: RiverGenerator,
    lakes: LakeGenerator,
    ocean: OceanMask,
    hydrology: HydrologyGenerator,
    wetlands: WetlandDetector,
    climate: Option<ClimateGenerator>,
    biomes: BiomeClassifier,
    materials: MaterialBlender,

    terrain_mesh: MeshData,
    river_mesh: MeshData,
    lake_mesh: MeshData,
    water_mesh: MeshData,

    tree_positions: Vec<Vec3>,
    rock_positions: Vec<Vec3>,
}

impl Chunk {
    pub fn new(coord: ChunkCoord, cells: usize, cell_size: f32) -> Self {
        Self {
            coord,
            cells,
            cell_size,
            state: ChunkState::Unloaded,
            validator: PipelineValidator::new(),
            heightmap: Heightmap::new(cells + 1, 0.0, 0.0, cell_size),
            cell_heights: Grid::new(cells, cells, 0.0),
            drainage: None,
            rivers: RiverGenerator::new(RiverSettings::default(), cell_size),
            lakes: LakeGenerator::new(LakeSettings::default()),
            ocean: OceanMask::new(cells),
            hydrology: HydrologyGenerator::new(HydrologySettings::default()),
            wetlands: WetlandDetector::new(WetlandSettings::default()),
            climate: None,
            biomes: BiomeClassifier::new(),
            materials: MaterialBlender::new(MaterialSettings::default()),
            terrain_mesh: MeshData::new(),
            river_mesh: MeshData::new(),
            lake_mesh: MeshData::new(),
            water_mesh: MeshData::new(),
            tree_positions: Vec::new(),
            rock_positions: Vec::new(),
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn world_origin(&self) -> Vec3 {
        self.coord.world_origin(self.cells, self.cell_size)
    }

    /// Run the full pipeline for this chunk.
    pub fn generate(&mut self, params: &ChunkGenerateParams) {
        let origin = self.world_origin();
        self.validator.reset();

        // Stage 1+2: heightmap with erosion, both on the extended grid.
        // The generator samples raw heights, erodes, and shapes peaks in
        // one pass over the bordered region.
        self.validator.begin_stage(PipelineStage::Heightmap);
        let generator = HeightmapGenerator::new(params.terrain.clone(), params.noise.clone())
            .with_fields(FieldSampler::from_intent(params.intent, params.noise.clone()));
        self.heightmap = generator.generate(origin.x, origin.z);
        self.validator.end_stage(PipelineStage::Heightmap);
        self.validator.begin_stage(PipelineStage::Erosion);
        self.validator.end_stage(PipelineStage::Erosion);

        // Stage 3: drainage over the eroded terrain
        self.validator.begin_stage(PipelineStage::Drainage);
        let drainage = DrainageGraph::compute(
            &self.heightmap,
            self.cells,
            self.cell_size,
            params.sea_level,
        );
        self.validator.end_stage(PipelineStage::Drainage);

        // Stage 4: rivers, then carve their channels
        self.validator.begin_stage(PipelineStage::Rivers);
        self.rivers = RiverGenerator::new(
            RiverSettings::from_strength(params.intent.river_strength),
            self.cell_size,
        );
        self.rivers
            .generate(&drainage, &self.heightmap, params.sea_level);
        self.rivers.carve(&mut self.heightmap);
        self.validator.end_stage(PipelineStage::Rivers);

        // Stage 5: lakes, then apply bed/shoreline/outflow adjustment
        self.validator.begin_stage(PipelineStage::Lakes);
        self.lakes = LakeGenerator::new(LakeSettings::default());
        self.lakes
            .generate(&drainage, &self.heightmap, params.sea_level);
        self.lakes.apply(&mut self.heightmap, self.cell_size);
        self.validator.end_stage(PipelineStage::Lakes);

        // Carving changed the terrain; recompute drainage so hydrology and
        // climate read the carved surface.
        self.validator.begin_stage(PipelineStage::Drainage);
        let drainage = DrainageGraph::compute(
            &self.heightmap,
            self.cells,
            self.cell_size,
            params.sea_level,
        );
        self.validator.end_stage(PipelineStage::Drainage);

        // Per-cell height view of the carved vertex grid
        for z in 0..self.cells as i32 {
            for x in 0..self.cells as i32 {
                self.cell_heights.set(x, z, self.heightmap.height(x, z));
            }
        }

        // Ocean connectivity: below-sea mask, then flood fill from world
        // boundary edges and neighbour edge data.
        self.ocean = OceanMask::new(self.cells);
        self.ocean
            .generate_below_sea_mask(&self.heightmap, params.sea_level);
        let world_boundary = params.world_boundary;
        let neighbor_edges = params.neighbor_edges.clone();
        self.ocean.flood_fill_from_boundary(
            |edge| world_boundary[edge_index(edge)],
            |edge| neighbor_edges[edge_index(edge)].clone(),
        );

        // Stage 6: hydrology aggregation + wetlands
        self.validator.begin_stage(PipelineStage::Hydrology);
        self.hydrology = HydrologyGenerator::new(HydrologySettings::default());
        self.hydrology
            .compute(&drainage, &self.rivers, &self.lakes, self.cell_size);
        self.wetlands = WetlandDetector::new(WetlandSettings::default());
        self.wetlands.detect(self.hydrology.data());
        self.validator.end_stage(PipelineStage::Hydrology);

        // Stage 7: climate
        self.validator.begin_stage(PipelineStage::Climate);
        let mut climate = ClimateGenerator::new(params.climate.clone(), params.noise.clone());
        climate.generate(
            &self.cell_heights,
            self.hydrology.data(),
            params.sea_level,
            params.terrain.height_scale,
            self.cell_size,
            origin.x,
            origin.z,
        );
        self.validator.end_stage(PipelineStage::Climate);

        // Stage 8: biomes
        self.validator.begin_stage(PipelineStage::Biomes);
        self.biomes = BiomeClassifier::new();
        self.biomes
            .classify(climate.data(), Some(self.wetlands.data()));
        self.validator.end_stage(PipelineStage::Biomes);

        // Stage 9: materials
        self.validator.begin_stage(PipelineStage::Materials);
        self.materials = MaterialBlender::new(MaterialSettings::default());
        self.materials.compute(
            &self.cell_heights,
            self.hydrology.data(),
            climate.data(),
            params.sea_level,
            params.terrain.height_scale,
        );
        self.validator.end_stage(PipelineStage::Materials);

        // Stage 10: meshes
        self.validator.begin_stage(PipelineStage::Mesh);
        self.terrain_mesh = build_terrain_mesh(&self.heightmap, params.terrain);
        if params.water_enabled {
            self.river_mesh =
                RiverMeshBuilder::default().build_combined(self.rivers.network(), self.cell_size);
            self.lake_mesh =
                LakeMeshBuilder::default().build_combined(self.lakes.network(), self.cell_size);
            let span = self.cells as f32 * self.cell_size;
            self.water_mesh = build_water_plane(span, 8, params.sea_level);
        } else {
            self.river_mesh = MeshData::new();
            self.lake_mesh = MeshData::new();
            self.water_mesh = MeshData::new();
        }
        self.validator.end_stage(PipelineStage::Mesh);

        self.place_objects(params.terrain.seed);

        self.drainage = Some(drainage);
        self.climate = Some(climate);
        self.state = ChunkState::Generated;

        if self.validator.violation_count() > 0 {
            log::warn!(
                "chunk ({}, {}) generated with {} pipeline violations",
                self.coord.x,
                self.coord.z,
                self.validator.violation_count()
            );
        }
    }

    /// Scatter trees and rocks from the chunk seed. Trees want fertile
    /// ground (grass-dominant, dry); rocks want rocky or bare cells.
    fn place_objects(&mut self, world_seed: u32) {
        self.tree_positions.clear();
        self.rock_positions.clear();

        let span = self.cells as f32 * self.cell_size;
        let origin = self.world_origin();
        let mut rng = StdRng::seed_from_u64(chunk_seed(world_seed, self.coord) as u64);

        let tree_attempts = (span * span / 100.0) as usize;
        for _ in 0..tree_attempts {
            let local_x = rng.gen_range(0.0..span);
            let local_z = rng.gen_range(0.0..span);
            let cell_x = (local_x / self.cell_size) as i32;
            let cell_z = (local_z / self.cell_size) as i32;

            if self.materials.dominant_at(cell_x, cell_z) != MaterialType::Grass {
                continue;
            }
            let height = self
                .heightmap
                .height_at_world(origin.x + local_x, origin.z + local_z);
            self.tree_positions
                .push(Vec3::new(origin.x + local_x, height, origin.z + local_z));
        }

        let rock_attempts = (span * span / 150.0) as usize;
        for _ in 0..rock_attempts {
            let local_x = rng.gen_range(0.0..span);
            let local_z = rng.gen_range(0.0..span);
            let cell_x = (local_x / self.cell_size) as i32;
            let cell_z = (local_z / self.cell_size) as i32;

            let dominant = self.materials.dominant_at(cell_x, cell_z);
            if dominant != MaterialType::Rock && dominant != MaterialType::Dirt {
                continue;
            }
            let height = self
                .heightmap
                .height_at_world(origin.x + local_x, origin.z + local_z);
            self.rock_positions.push(Vec3::new(
                origin.x + local_x,
                height + 0.1,
                origin.z + local_z,
            ));
        }
    }

    /// Release field arrays and meshes; the chunk can be regenerated.
    pub fn unload(&mut self) {
        self.terrain_mesh = MeshData::new();
        self.river_mesh = MeshData::new();
        self.lake_mesh = MeshData::new();
        self.water_mesh = MeshData::new();
        self.tree_positions.clear();
        self.rock_positions.clear();
        self.drainage = None;
        self.climate = None;
        self.state = ChunkState::Unloaded;
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn heightmap(&self) -> &Heightmap {
        &self.heightmap
    }

    pub fn height_at_world(&self, world_x: f32, world_z: f32) -> f32 {
        self.heightmap.height_at_world(world_x, world_z)
    }

    pub fn contains_world_position(&self, world_x: f32, world_z: f32) -> bool {
        let origin = self.world_origin();
        let span = self.cells as f32 * self.cell_size;
        world_x >= origin.x
            && world_x < origin.x + span
            && world_z >= origin.z
            && world_z < origin.z + span
    }

    pub fn drainage(&self) -> Option<&DrainageGraph> {
        self.drainage.as_ref()
    }

    pub fn rivers(&self) -> &RiverGenerator {
        &self.rivers
    }

    pub fn lakes(&self) -> &LakeGenerator {
        &self.lakes
    }

    pub fn ocean(&self) -> &OceanMask {
        &self.ocean
    }

    pub fn ocean_mut(&mut self) -> &mut OceanMask {
        &mut self.ocean
    }

    pub fn hydrology(&self) -> &HydrologyGenerator {
        &self.hydrology
    }

    pub fn wetlands(&self) -> &WetlandDetector {
        &self.wetlands
    }

    pub fn climate(&self) -> Option<&ClimateGenerator> {
        self.climate.as_ref()
    }

    pub fn water_type_at(&self, x: i32, z: i32) -> WaterType {
        self.hydrology.water_type(x, z)
    }

    pub fn dominant_biome_at(&self, x: i32, z: i32) -> BiomeType {
        self.biomes.dominant_at(x, z)
    }

    pub fn biomes(&self) -> &BiomeClassifier {
        &self.biomes
    }

    pub fn materials(&self) -> &MaterialBlender {
        &self.materials
    }

    pub fn terrain_mesh(&self) -> &MeshData {
        &self.terrain_mesh
    }

    pub fn river_mesh(&self) -> &MeshData {
        &self.river_mesh
    }

    pub fn lake_mesh(&self) -> &MeshData {
        &self.lake_mesh
    }

    pub fn water_mesh(&self) -> &MeshData {
        &self.water_mesh
    }

    pub fn tree_positions(&self) -> &[Vec3] {
        &self.tree_positions
    }

    pub fn rock_positions(&self) -> &[Vec3] {
        &self.rock_positions
    }

    pub fn validator(&self) -> &PipelineValidator {
        &self.validator
    }
}

/// Index into edge-ordered arrays, following [`ChunkEdge::ALL`].
pub fn edge_index(edge: ChunkEdge) -> usize {
    match edge {
        ChunkEdge::NegX => 0,
        ChunkEdge::PosX => 1,
        ChunkEdge::NegZ => 2,
        ChunkEdge::PosZ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::{find_preset, ClimateIntent, IntentMapper};

    fn generate_chunk(coord: ChunkCoord, preset: &str, seed: u32) -> (Chunk, TerrainSettings) {
        let intent = find_preset(preset).unwrap().intent;
        let mut terrain = IntentMapper::derive_settings(&intent);
        terrain.width = 64;
        terrain.depth = 64;
        terrain.cell_size = 0.5;
        terrain.seed = seed;
        // Keep chunk tests fast and chunk-independent
        terrain.use_hydraulic_erosion = false;

        let climate = ClimateSettings::from_intent(&ClimateIntent::temperate());
        let noise = Arc::new(SimplexNoise::new(seed));
        let sea_level = worldcore::sea_level(
            terrain.base_height,
            terrain.height_scale,
            0.45,
        );

        let params = ChunkGenerateParams {
            terrain: &terrain,
            intent: &intent,
            climate: &climate,
            noise,
            sea_level,
            water_enabled: true,
            world_boundary: [false; 4],
            neighbor_edges: [None, None, None, None],
        };

        let mut chunk = Chunk::new(coord, 64, 0.5);
        chunk.generate(&params);
        (chunk, terrain)
    }

    /// The full pipeline completes without ordering violations.
    #[test]
    fn pipeline_runs_clean() {
        let (chunk, _) = generate_chunk(ChunkCoord::new(0, 0), "Rolling Temperate", 42);
        assert_eq!(chunk.state(), ChunkState::Generated);
        assert_eq!(chunk.validator().violation_count(), 0);
        assert!(chunk.validator().is_complete(PipelineStage::Mesh));
        assert!(!chunk.terrain_mesh().is_empty());
    }

    /// Generating the same chunk twice is byte-identical.
    #[test]
    fn generation_is_deterministic() {
        let (a, _) = generate_chunk(ChunkCoord::new(1, -2), "Rolling Temperate", 42);
        let (b, _) = generate_chunk(ChunkCoord::new(1, -2), "Rolling Temperate", 42);
        assert_eq!(a.heightmap().as_slice(), b.heightmap().as_slice());
        assert_eq!(
            a.hydrology().data().moisture.as_slice(),
            b.hydrology().data().moisture.as_slice()
        );
        assert_eq!(a.tree_positions().len(), b.tree_positions().len());
    }

    /// Biome and material weights are normalized on every cell.
    #[test]
    fn weights_normalized_across_chunk() {
        let (chunk, _) = generate_chunk(ChunkCoord::new(0, 0), "Rolling Temperate", 42);
        for z in 0..64 {
            for x in 0..64 {
                let bw = chunk.biomes().weights_at(x, z).total();
                let mw = chunk.materials().weights_at(x, z).total();
                assert!((bw - 1.0).abs() < 0.01, "biome sum {bw} at ({x}, {z})");
                assert!((mw - 1.0).abs() < 0.01, "material sum {mw} at ({x}, {z})");
            }
        }
    }

    /// Climate fields stay inside their documented ranges chunk-wide.
    #[test]
    fn climate_ranges_hold() {
        let (chunk, _) = generate_chunk(ChunkCoord::new(0, 0), "Alpine Young", 7);
        let climate = chunk.climate().unwrap();
        for z in 0..64 {
            for x in 0..64 {
                assert!((-1.0..=1.0).contains(&climate.temperature(x, z)));
                assert!((0.0..=1.0).contains(&climate.moisture(x, z)));
                assert!((0.0..=1.0).contains(&climate.fertility(x, z)));
            }
        }
    }

    /// Flat plains stay flat: no river-class cells, heights near base.
    #[test]
    fn flat_plains_stay_flat() {
        let (chunk, terrain) = generate_chunk(ChunkCoord::new(0, 0), "Flat Plains", 42);

        let mut river_cells = 0;
        for z in 0..64 {
            for x in 0..64 {
                if chunk.water_type_at(x, z) == WaterType::River {
                    river_cells += 1;
                }
            }
        }
        assert_eq!(river_cells, 0, "flat plains should not form major rivers");

        // Land heights stay within the configured envelope (ocean floors
        // may dip below by the ocean depth bias)
        let ceiling =
            terrain.base_height + terrain.height_scale * (1.0 + terrain.peak_boost) + 1e-3;
        for &h in chunk.heightmap().as_slice() {
            assert!(h <= ceiling, "height {h} above envelope {ceiling}");
        }
    }

    /// Accumulation stays monotone along every flow edge of a real chunk.
    #[test]
    fn accumulation_monotone_on_generated_chunk() {
        let (chunk, _) = generate_chunk(ChunkCoord::new(0, 0), "Rolling Temperate", 42);
        let drainage = chunk.drainage().unwrap();
        for z in 0..64 {
            for x in 0..64 {
                if let Some(down) = drainage.downstream_cell(x, z) {
                    assert!(
                        drainage.flow_accumulation(down.x, down.y)
                            >= drainage.flow_accumulation(x, z)
                    );
                }
            }
        }
    }

    /// The humidity baseline keeps mean moisture above the floor the
    /// moisture weights guarantee.
    #[test]
    fn moisture_baseline_holds() {
        let (chunk, _) = generate_chunk(ChunkCoord::new(0, 0), "Rolling Temperate", 42);
        let mut sum = 0.0f64;
        for z in 0..64 {
            for x in 0..64 {
                sum += chunk.hydrology().moisture(x, z) as f64;
            }
        }
        let mean = sum / (64.0 * 64.0);
        assert!(mean > 0.09, "mean moisture {mean}");
    }

    /// Ocean-classified cells always sit below sea level.
    #[test]
    fn ocean_cells_lie_below_sea() {
        let (chunk, terrain) = generate_chunk(ChunkCoord::new(0, 0), "Coastal Fjords", 42);
        let sea = worldcore::sea_level(terrain.base_height, terrain.height_scale, 0.45);
        for z in 0..64 {
            for x in 0..64 {
                if chunk.water_type_at(x, z) == WaterType::Ocean {
                    assert!(chunk.heightmap().height(x, z) < sea);
                }
            }
        }
    }

    /// Trees stand on grass-dominant cells only.
    #[test]
    fn trees_grow_on_grass() {
        let (chunk, _) = generate_chunk(ChunkCoord::new(0, 0), "Rolling Temperate", 42);
        let origin = chunk.world_origin();
        for tree in chunk.tree_positions() {
            let cell_x = ((tree.x - origin.x) / 0.5) as i32;
            let cell_z = ((tree.z - origin.z) / 0.5) as i32;
            assert_eq!(chunk.materials().dominant_at(cell_x, cell_z), MaterialType::Grass);
        }
    }
}
