//! River network generation and channel carving.
//!
//! Cells are classified from flow accumulation, linked into segments along
//! the drainage graph, and traced into complete source-to-terminus paths.
//! Carving lowers the terrain to the river surface; it never raises a
//! cell.

use crate::drainage::{DrainageGraph, FlowDirection};
use crate::heightmap::Heightmap;
use glam::IVec2;
use worldcore::Grid;

/// Water body classification, in merge priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum WaterType {
    None = 0,
    Stream = 1,
    River = 2,
    Lake = 3,
    Ocean = 4,
}

/// Settings for river generation, derived from the river strength axis.
#[derive(Debug, Clone)]
pub struct RiverSettings {
    /// Minimum flow accumulation for a stream.
    pub stream_threshold: u32,
    /// Minimum flow accumulation for a major river.
    pub major_river_threshold: u32,

    /// Width multiplier: `width = sqrt(accum) * scale`.
    pub river_width_scale: f32,
    pub min_river_width: f32,
    pub max_river_width: f32,

    /// How deep channels carve into terrain.
    pub channel_depth: f32,
    /// Bank slope: 0 = vertical, 1 = 45 degrees.
    pub bank_slope: f32,
    /// How flat the riverbed is, 0-1.
    pub bed_flatness: f32,
}

impl Default for RiverSettings {
    fn default() -> Self {
        Self {
            stream_threshold: 50,
            major_river_threshold: 500,
            river_width_scale: 0.1,
            min_river_width: 1.0,
            max_river_width: 20.0,
            channel_depth: 2.0,
            bank_slope: 0.5,
            bed_flatness: 0.8,
        }
    }
}

impl RiverSettings {
    /// Derive settings from the intent's river strength. Higher strength
    /// lowers the thresholds (more rivers) and widens the channels.
    pub fn from_strength(river_strength: f32) -> Self {
        Self {
            stream_threshold: (100.0 - 80.0 * river_strength) as u32,
            major_river_threshold: (1000.0 - 800.0 * river_strength) as u32,
            river_width_scale: 0.05 + 0.15 * river_strength,
            channel_depth: 1.0 + 3.0 * river_strength,
            bank_slope: 0.6 - 0.3 * river_strength,
            bed_flatness: 0.6 + 0.3 * river_strength,
            ..Self::default()
        }
    }
}

/// One cell of the river network.
#[derive(Debug, Clone, Copy)]
pub struct RiverSegment {
    pub cell: IVec2,
    pub width: f32,
    pub depth: f32,
    /// Water surface height (terrain minus half the depth).
    pub surface_height: f32,
    pub water_type: WaterType,
    pub flow_accum: u32,
    /// Index of the downstream segment, or `None` at a terminus.
    pub downstream: Option<usize>,
}

/// A complete river from source to terminus.
#[derive(Debug, Clone)]
pub struct RiverPath {
    pub segment_indices: Vec<usize>,
    pub source: IVec2,
    pub terminus: IVec2,
    /// What the river flows into: Ocean, Lake, or None.
    pub terminus_type: WaterType,
    pub total_length: f32,
    pub max_accumulation: u32,
}

/// The full river network for one chunk.
#[derive(Debug, Clone)]
pub struct RiverNetwork {
    pub segments: Vec<RiverSegment>,
    pub rivers: Vec<RiverPath>,
    pub cell_water_type: Grid<WaterType>,
    pub cell_river_width: Grid<f32>,
    pub cell_surface_height: Grid<f32>,
}

impl RiverNetwork {
    fn new(cells: usize) -> Self {
        Self {
            segments: Vec::new(),
            rivers: Vec::new(),
            cell_water_type: Grid::new(cells, cells, WaterType::None),
            cell_river_width: Grid::new(cells, cells, 0.0),
            cell_surface_height: Grid::new(cells, cells, 0.0),
        }
    }

    pub fn cells(&self) -> usize {
        self.cell_water_type.width()
    }
}

/// Generates rivers and streams from drainage data.
pub struct RiverGenerator {
    settings: RiverSettings,
    network: RiverNetwork,
    cell_size: f32,
}

impl RiverGenerator {
    pub fn new(settings: RiverSettings, cell_size: f32) -> Self {
        Self {
            settings,
            network: RiverNetwork::new(0),
            cell_size,
        }
    }

    pub fn settings(&self) -> &RiverSettings {
        &self.settings
    }

    pub fn network(&self) -> &RiverNetwork {
        &self.network
    }

    /// Build the river network: classify cells, create segments, link and
    /// trace paths.
    pub fn generate(&mut self, drainage: &DrainageGraph, heightmap: &Heightmap, sea_level: f32) {
        let cells = drainage.data().cells();
        self.network = RiverNetwork::new(cells);

        self.classify_cells(drainage, heightmap, sea_level);
        self.build_segments(drainage, heightmap);
        self.trace_river_paths(drainage);
    }

    fn classify_cells(&mut self, drainage: &DrainageGraph, heightmap: &Heightmap, sea_level: f32) {
        let cells = self.network.cells() as i32;

        for z in 0..cells {
            for x in 0..cells {
                let flow_accum = drainage.flow_accumulation(x, z);
                let height = heightmap.height(x, z);

                if height < sea_level {
                    let dir = drainage.flow_direction(x, z);
                    if dir == FlowDirection::Ocean || dir == FlowDirection::Boundary {
                        self.network.cell_water_type.set(x, z, WaterType::Ocean);
                        continue;
                    }
                }

                if flow_accum > self.settings.major_river_threshold {
                    let width = self.river_width(flow_accum);
                    self.network.cell_water_type.set(x, z, WaterType::River);
                    self.network.cell_river_width.set(x, z, width);
                } else if flow_accum > self.settings.stream_threshold {
                    let width = self.river_width(flow_accum);
                    self.network.cell_water_type.set(x, z, WaterType::Stream);
                    self.network.cell_river_width.set(x, z, width);
                }

                // Pits become standing water; the lake stage decides whether
                // they grow into real basins.
                if drainage.flow_direction(x, z) == FlowDirection::Pit {
                    self.network.cell_water_type.set(x, z, WaterType::Lake);
                }
            }
        }
    }

    fn build_segments(&mut self, drainage: &DrainageGraph, heightmap: &Heightmap) {
        let cells = self.network.cells() as i32;

        for z in 0..cells {
            for x in 0..cells {
                let water_type = self.network.cell_water_type.get_or(x, z, WaterType::None);
                if water_type != WaterType::River && water_type != WaterType::Stream {
                    continue;
                }

                let flow_accum = drainage.flow_accumulation(x, z);
                let width = self.river_width(flow_accum);
                let depth = Self::river_depth(width);
                let terrain_height = heightmap.height(x, z);
                let surface_height = terrain_height - depth * 0.5;

                self.network.cell_surface_height.set(x, z, surface_height);
                self.network.segments.push(RiverSegment {
                    cell: IVec2::new(x, z),
                    width,
                    depth,
                    surface_height,
                    water_type,
                    flow_accum,
                    downstream: None,
                });
            }
        }
    }

    fn trace_river_paths(&mut self, drainage: &DrainageGraph) {
        let cells = self.network.cells();

        // Map each cell to its segment index
        let mut cell_to_segment: Vec<Option<usize>> = vec![None; cells * cells];
        for (i, seg) in self.network.segments.iter().enumerate() {
            cell_to_segment[seg.cell.y as usize * cells + seg.cell.x as usize] = Some(i);
        }

        // Link segments downstream along the drainage graph
        for i in 0..self.network.segments.len() {
            let cell = self.network.segments[i].cell;
            if let Some(down) = drainage.downstream_cell(cell.x, cell.y) {
                self.network.segments[i].downstream =
                    cell_to_segment[down.y as usize * cells + down.x as usize];
            }
        }

        // Sources are segments with no upstream contributors
        let mut upstream_count = vec![0u32; self.network.segments.len()];
        for seg in &self.network.segments {
            if let Some(down) = seg.downstream {
                upstream_count[down] += 1;
            }
        }

        for (i, &count) in upstream_count.iter().enumerate() {
            if count != 0 {
                continue;
            }

            let mut path = RiverPath {
                segment_indices: Vec::new(),
                source: self.network.segments[i].cell,
                terminus: self.network.segments[i].cell,
                terminus_type: WaterType::None,
                total_length: 0.0,
                max_accumulation: 0,
            };

            let mut current = Some(i);
            while let Some(idx) = current {
                path.segment_indices.push(idx);
                let seg = &self.network.segments[idx];
                path.max_accumulation = path.max_accumulation.max(seg.flow_accum);
                path.total_length += 1.0;
                path.terminus = seg.cell;
                current = seg.downstream;
            }

            // Terminus type from the final cell's flow direction. Boundary
            // termini are reported as Ocean even when the river merely
            // exits the chunk; kept from the source behaviour.
            let term_dir = drainage.flow_direction(path.terminus.x, path.terminus.y);
            path.terminus_type = match term_dir {
                FlowDirection::Ocean | FlowDirection::Boundary => WaterType::Ocean,
                FlowDirection::Pit => WaterType::Lake,
                _ => WaterType::None,
            };

            self.network.rivers.push(path);
        }
    }

    /// Carve river channels into the heightmap. Channel centres drop to
    /// the river surface, the bed is flattened within half a width, and
    /// banks blend back to terrain over one further width. Terrain is only
    /// ever lowered; a raise is a per-cell no-op.
    pub fn carve(&self, heightmap: &mut Heightmap) {
        let cell_size = self.cell_size;

        for segment in &self.network.segments {
            let cx = segment.cell.x;
            let cz = segment.cell.y;

            let carve_depth = segment.depth * self.settings.channel_depth;
            let river_surface = heightmap.height(cx, cz) - carve_depth;

            let current = heightmap.height(cx, cz);
            heightmap.set(cx, cz, current.min(river_surface));

            let bank_radius = (segment.width / (2.0 * cell_size)).ceil() as i32;

            for dz in -bank_radius..=bank_radius {
                for dx in -bank_radius..=bank_radius {
                    if dx == 0 && dz == 0 {
                        continue;
                    }
                    let nx = cx + dx;
                    let nz = cz + dz;
                    if !self.network.cell_water_type.in_bounds(nx, nz) {
                        continue;
                    }

                    let dist = ((dx * dx + dz * dz) as f32).sqrt() * cell_size;
                    let half_width = segment.width * 0.5;
                    let current = heightmap.height(nx, nz);

                    if dist <= half_width {
                        // Inside the channel: flatten to the riverbed
                        let bed = river_surface - carve_depth * self.settings.bed_flatness;
                        heightmap.set(nx, nz, current.min(bed));
                    } else if dist <= half_width + segment.width {
                        // Bank region: smoothstep back to the terrain
                        let t = (dist - half_width) / segment.width;
                        let t = t * t * (3.0 - 2.0 * t);
                        let bank = river_surface + (current - river_surface) * t;
                        let bank = bank.max(river_surface);
                        if bank < current {
                            heightmap.set(nx, nz, bank);
                        }
                    }
                }
            }
        }
    }

    /// `width = clamp(sqrt(accum) * scale, min, max)`.
    fn river_width(&self, flow_accumulation: u32) -> f32 {
        let width = (flow_accumulation as f32).sqrt() * self.settings.river_width_scale;
        width.clamp(self.settings.min_river_width, self.settings.max_river_width)
    }

    /// Depth scales with width at the typical river depth/width ratio.
    fn river_depth(width: f32) -> f32 {
        width * 0.15
    }

    /// Water type at a cell; out-of-bounds reads as `None`.
    pub fn water_type(&self, x: i32, z: i32) -> WaterType {
        self.network.cell_water_type.get_or(x, z, WaterType::None)
    }

    /// River width at a cell, 0 if not a river.
    pub fn river_width_at(&self, x: i32, z: i32) -> f32 {
        self.network.cell_river_width.get_or(x, z, 0.0)
    }

    /// Water surface height at a cell, 0 if not a river.
    pub fn surface_height_at(&self, x: i32, z: i32) -> f32 {
        self.network.cell_surface_height.get_or(x, z, 0.0)
    }

    pub fn is_water(&self, x: i32, z: i32) -> bool {
        self.water_type(x, z) != WaterType::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drainage::DrainageGraph;
    use crate::heightmap::Heightmap;

    /// A long valley funnelling flow toward +X gives the downstream end
    /// more accumulation than the upstream end.
    fn valley(cells: usize) -> Heightmap {
        let mut hm = Heightmap::new(cells + 1, 0.0, 0.0, 1.0);
        for z in 0..=cells as i32 {
            for x in 0..=cells as i32 {
                let ridge = (z as f32 - cells as f32 / 2.0).abs() * 2.0;
                hm.set(x, z, 50.0 - x as f32 + ridge);
            }
        }
        hm
    }

    #[test]
    fn strength_scales_thresholds() {
        let weak = RiverSettings::from_strength(0.0);
        let strong = RiverSettings::from_strength(1.0);
        assert_eq!(weak.stream_threshold, 100);
        assert_eq!(strong.stream_threshold, 20);
        assert_eq!(weak.major_river_threshold, 1000);
        assert!(strong.channel_depth > weak.channel_depth);
    }

    /// Cells above the stream threshold are classified and linked.
    #[test]
    fn valley_forms_streams() {
        let cells = 32;
        let hm = valley(cells);
        let drainage = DrainageGraph::compute(&hm, cells, 1.0, -100.0);

        let mut settings = RiverSettings::from_strength(1.0);
        settings.stream_threshold = 5;
        settings.major_river_threshold = 10_000;
        let mut gen = RiverGenerator::new(settings, 1.0);
        gen.generate(&drainage, &hm, -100.0);

        assert!(!gen.network().segments.is_empty(), "no stream cells found");
        for seg in &gen.network().segments {
            assert_eq!(seg.water_type, WaterType::Stream);
            assert!(seg.surface_height < hm.height(seg.cell.x, seg.cell.y));
        }
        assert!(!gen.network().rivers.is_empty(), "no paths traced");
    }

    /// Carving never raises any vertex.
    #[test]
    fn carving_is_monotonic() {
        let cells = 32;
        let mut hm = valley(cells);
        let drainage = DrainageGraph::compute(&hm, cells, 1.0, -100.0);

        let mut settings = RiverSettings::from_strength(0.8);
        settings.stream_threshold = 5;
        let mut gen = RiverGenerator::new(settings, 1.0);
        gen.generate(&drainage, &hm, -100.0);

        let before = hm.as_slice().to_vec();
        gen.carve(&mut hm);
        for (i, (&b, &a)) in before.iter().zip(hm.as_slice().iter()).enumerate() {
            assert!(a <= b + 1e-6, "vertex {i} raised: {b} -> {a}");
        }
    }

    /// Every traced path walks strictly downstream to its terminus.
    #[test]
    fn paths_follow_downstream_links() {
        let cells = 32;
        let hm = valley(cells);
        let drainage = DrainageGraph::compute(&hm, cells, 1.0, -100.0);

        let mut settings = RiverSettings::from_strength(1.0);
        settings.stream_threshold = 5;
        let mut gen = RiverGenerator::new(settings, 1.0);
        gen.generate(&drainage, &hm, -100.0);

        for path in &gen.network().rivers {
            for pair in path.segment_indices.windows(2) {
                assert_eq!(gen.network().segments[pair[0]].downstream, Some(pair[1]));
            }
            let last = *path.segment_indices.last().unwrap();
            assert_eq!(gen.network().segments[last].cell, path.terminus);
        }
    }
}
