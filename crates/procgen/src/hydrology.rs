//! Hydrology aggregation: one unified water record per cell.
//!
//! Merges drainage, river, and lake output into a single structure cached
//! per chunk, then derives distance-to-water (multi-source BFS) and the
//! moisture field consumed by climate and biomes.

use crate::drainage::{DrainageGraph, FlowDirection, FLOW_DISTANCE, FLOW_OFFSET_X, FLOW_OFFSET_Z};
use crate::lakes::LakeGenerator;
use crate::rivers::{RiverGenerator, WaterType};
use std::collections::VecDeque;
use worldcore::Grid;

/// Unified per-cell hydrology fields.
#[derive(Debug, Clone)]
pub struct HydrologyData {
    pub water_type: Grid<WaterType>,
    pub water_surface_height: Grid<f32>,
    pub flow_accumulation: Grid<u32>,
    pub distance_to_water: Grid<f32>,
    pub drainage_direction: Grid<FlowDirection>,
    pub slope: Grid<f32>,
    pub moisture: Grid<f32>,
}

impl HydrologyData {
    fn new(cells: usize, max_water_distance: f32) -> Self {
        Self {
            water_type: Grid::new(cells, cells, WaterType::None),
            water_surface_height: Grid::new(cells, cells, 0.0),
            flow_accumulation: Grid::new(cells, cells, 0),
            distance_to_water: Grid::new(cells, cells, max_water_distance),
            drainage_direction: Grid::new(cells, cells, FlowDirection::Pit),
            slope: Grid::new(cells, cells, 0.0),
            moisture: Grid::new(cells, cells, 0.0),
        }
    }

    pub fn cells(&self) -> usize {
        self.water_type.width()
    }
}

/// Settings for hydrology aggregation.
#[derive(Debug, Clone)]
pub struct HydrologySettings {
    /// Distances are clamped here (world units).
    pub max_water_distance: f32,
    /// Global moisture baseline.
    pub base_humidity: f32,
    /// Moisture weight of flow accumulation.
    pub flow_moisture_weight: f32,
    /// Moisture weight of water proximity.
    pub proximity_moisture_weight: f32,
    /// Moisture weight of base humidity.
    pub humidity_weight: f32,
    /// Accumulation normalisation for the flow factor.
    pub flow_normalization: f32,
}

impl Default for HydrologySettings {
    fn default() -> Self {
        Self {
            max_water_distance: 100.0,
            base_humidity: 0.5,
            flow_moisture_weight: 0.3,
            proximity_moisture_weight: 0.5,
            humidity_weight: 0.2,
            flow_normalization: 1000.0,
        }
    }
}

/// Aggregates drainage, rivers, and lakes into unified hydrology data.
pub struct HydrologyGenerator {
    settings: HydrologySettings,
    data: HydrologyData,
}

impl HydrologyGenerator {
    pub fn new(settings: HydrologySettings) -> Self {
        Self {
            settings,
            data: HydrologyData::new(0, 0.0),
        }
    }

    pub fn settings(&self) -> &HydrologySettings {
        &self.settings
    }

    pub fn data(&self) -> &HydrologyData {
        &self.data
    }

    /// Single aggregation pass over the chunk.
    pub fn compute(
        &mut self,
        drainage: &DrainageGraph,
        rivers: &RiverGenerator,
        lakes: &LakeGenerator,
        cell_size: f32,
    ) {
        let cells = drainage.data().cells();
        self.data = HydrologyData::new(cells, self.settings.max_water_distance);

        self.copy_drainage(drainage);
        self.merge_water_types(rivers, lakes);
        self.compute_distance_to_water(cell_size);
        self.compute_moisture();
    }

    fn copy_drainage(&mut self, drainage: &DrainageGraph) {
        let cells = self.data.cells() as i32;
        for z in 0..cells {
            for x in 0..cells {
                self.data
                    .drainage_direction
                    .set(x, z, drainage.flow_direction(x, z));
                self.data
                    .flow_accumulation
                    .set(x, z, drainage.flow_accumulation(x, z));
                self.data.slope.set(x, z, drainage.slope(x, z));
            }
        }
    }

    /// Merge by priority: Ocean > Lake > River > Stream > None. Rivers and
    /// lakes also contribute their water surface height.
    fn merge_water_types(&mut self, rivers: &RiverGenerator, lakes: &LakeGenerator) {
        let cells = self.data.cells() as i32;
        for z in 0..cells {
            for x in 0..cells {
                let river_type = rivers.water_type(x, z);
                if river_type != WaterType::None {
                    self.data
                        .water_surface_height
                        .set(x, z, rivers.surface_height_at(x, z));
                }

                let lake = lakes.is_lake(x, z);
                if lake {
                    self.data
                        .water_surface_height
                        .set(x, z, lakes.surface_height_at(x, z));
                }

                let merged = if river_type == WaterType::Ocean {
                    WaterType::Ocean
                } else if lake {
                    WaterType::Lake
                } else if river_type == WaterType::River {
                    WaterType::River
                } else if river_type == WaterType::Stream {
                    WaterType::Stream
                } else {
                    WaterType::None
                };
                self.data.water_type.set(x, z, merged);
            }
        }
    }

    /// Multi-source BFS from every water cell. Cardinal steps cost 1,
    /// diagonal steps sqrt(2), scaled by cell size and clamped at the
    /// maximum water distance.
    fn compute_distance_to_water(&mut self, cell_size: f32) {
        let cells = self.data.cells() as i32;
        let mut queue = VecDeque::new();

        for z in 0..cells {
            for x in 0..cells {
                if self.data.water_type.get_or(x, z, WaterType::None) != WaterType::None {
                    self.data.distance_to_water.set(x, z, 0.0);
                    queue.push_back((x, z));
                }
            }
        }

        while let Some((x, z)) = queue.pop_front() {
            let current = self.data.distance_to_water.get_or(x, z, f32::MAX);

            for d in 0..8 {
                let nx = x + FLOW_OFFSET_X[d];
                let nz = z + FLOW_OFFSET_Z[d];
                if !self.data.distance_to_water.in_bounds(nx, nz) {
                    continue;
                }

                let step = FLOW_DISTANCE[d] * cell_size;
                let new_dist = current + step;
                let old = self.data.distance_to_water.get_or(nx, nz, f32::MAX);

                if new_dist < old && new_dist < self.settings.max_water_distance {
                    self.data.distance_to_water.set(nx, nz, new_dist);
                    queue.push_back((nx, nz));
                }
            }
        }
    }

    /// Water cells saturate at 1; land combines flow, proximity, and base
    /// humidity with their configured weights.
    fn compute_moisture(&mut self) {
        let cells = self.data.cells() as i32;
        let s = &self.settings;

        for z in 0..cells {
            for x in 0..cells {
                if self.data.water_type.get_or(x, z, WaterType::None) != WaterType::None {
                    self.data.moisture.set(x, z, 1.0);
                    continue;
                }

                let flow = self.data.flow_accumulation.get_or(x, z, 0) as f32;
                let flow_factor = (flow / s.flow_normalization).min(1.0);

                let dist = self.data.distance_to_water.get_or(x, z, s.max_water_distance);
                let proximity_factor = (1.0 - dist / s.max_water_distance).max(0.0);

                let moisture = flow_factor * s.flow_moisture_weight
                    + proximity_factor * s.proximity_moisture_weight
                    + s.base_humidity * s.humidity_weight;

                self.data.moisture.set(x, z, moisture.clamp(0.0, 1.0));
            }
        }
    }

    /// Water type at a cell; out-of-bounds reads as `None`.
    pub fn water_type(&self, x: i32, z: i32) -> WaterType {
        self.data.water_type.get_or(x, z, WaterType::None)
    }

    pub fn water_surface_height(&self, x: i32, z: i32) -> f32 {
        self.data.water_surface_height.get_or(x, z, 0.0)
    }

    pub fn flow_accumulation(&self, x: i32, z: i32) -> u32 {
        self.data.flow_accumulation.get_or(x, z, 0)
    }

    pub fn distance_to_water(&self, x: i32, z: i32) -> f32 {
        self.data
            .distance_to_water
            .get_or(x, z, self.settings.max_water_distance)
    }

    pub fn slope(&self, x: i32, z: i32) -> f32 {
        self.data.slope.get_or(x, z, 0.0)
    }

    pub fn moisture(&self, x: i32, z: i32) -> f32 {
        self.data.moisture.get_or(x, z, 0.0)
    }

    pub fn is_water(&self, x: i32, z: i32) -> bool {
        self.water_type(x, z) != WaterType::None
    }
}
