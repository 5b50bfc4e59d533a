//! Surface material blending.
//!
//! Materials are blended, never selected: each cell carries a normalized
//! weight vector over the eight material types, computed from slope,
//! height, temperature, moisture, fertility, and water proximity. The
//! normalization invariant `|sum - 1| < 0.01` is checked after every cell.

use crate::climate::ClimateData;
use crate::hydrology::HydrologyData;
use crate::rivers::WaterType;
use glam::Vec3;
use worldcore::Grid;

/// The closed set of surface materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MaterialType {
    Rock = 0,
    Dirt = 1,
    Grass = 2,
    Sand = 3,
    Snow = 4,
    Ice = 5,
    Mud = 6,
    Water = 7,
}

pub const MATERIAL_COUNT: usize = 8;

pub const ALL_MATERIALS: [MaterialType; MATERIAL_COUNT] = [
    MaterialType::Rock,
    MaterialType::Dirt,
    MaterialType::Grass,
    MaterialType::Sand,
    MaterialType::Snow,
    MaterialType::Ice,
    MaterialType::Mud,
    MaterialType::Water,
];

impl MaterialType {
    pub fn name(self) -> &'static str {
        match self {
            MaterialType::Rock => "Rock",
            MaterialType::Dirt => "Dirt",
            MaterialType::Grass => "Grass",
            MaterialType::Sand => "Sand",
            MaterialType::Snow => "Snow",
            MaterialType::Ice => "Ice",
            MaterialType::Mud => "Mud",
            MaterialType::Water => "Water",
        }
    }

    /// Representative colour for debug rendering.
    pub fn color(self) -> Vec3 {
        match self {
            MaterialType::Rock => Vec3::new(0.5, 0.5, 0.5),
            MaterialType::Dirt => Vec3::new(0.45, 0.33, 0.22),
            MaterialType::Grass => Vec3::new(0.34, 0.55, 0.25),
            MaterialType::Sand => Vec3::new(0.76, 0.7, 0.5),
            MaterialType::Snow => Vec3::new(0.95, 0.95, 0.97),
            MaterialType::Ice => Vec3::new(0.75, 0.85, 0.95),
            MaterialType::Mud => Vec3::new(0.35, 0.28, 0.2),
            MaterialType::Water => Vec3::new(0.1, 0.3, 0.5),
        }
    }
}

/// Normalized per-cell material weights.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaterialWeights {
    pub weights: [f32; MATERIAL_COUNT],
}

impl MaterialWeights {
    #[inline]
    pub fn get(&self, material: MaterialType) -> f32 {
        self.weights[material as usize]
    }

    #[inline]
    pub fn set(&mut self, material: MaterialType, weight: f32) {
        self.weights[material as usize] = weight;
    }

    pub fn total(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Scale so weights sum to 1; an all-zero vector falls back to dirt.
    pub fn normalize(&mut self) {
        let sum = self.total();
        if sum > 0.0 {
            for w in &mut self.weights {
                *w /= sum;
            }
        } else {
            self.set(MaterialType::Dirt, 1.0);
        }
    }

    pub fn dominant(&self) -> MaterialType {
        let mut best = 0;
        for i in 1..MATERIAL_COUNT {
            if self.weights[i] > self.weights[best] {
                best = i;
            }
        }
        ALL_MATERIALS[best]
    }

    pub fn blended_color(&self) -> Vec3 {
        let mut color = Vec3::ZERO;
        for (i, &w) in self.weights.iter().enumerate() {
            if w > 0.0 {
                color += ALL_MATERIALS[i].color() * w;
            }
        }
        color
    }
}

/// Thresholds controlling material weight rules.
#[derive(Debug, Clone)]
pub struct MaterialSettings {
    /// Normalized slope above which extra rock is exposed.
    pub rock_slope_threshold: f32,
    /// Normalized slope for pure rock.
    pub steep_slope_threshold: f32,
    /// Normalized height where snow begins.
    pub snow_line_start: f32,
    /// Normalized height where snow dominates.
    pub snow_line_full: f32,
    /// Temperature below which ice forms.
    pub freezing_point: f32,
    /// Temperature above which snow melts off grassland.
    pub snow_melt_point: f32,
    /// Moisture level that produces mud.
    pub mud_moisture_threshold: f32,
    pub grass_moisture_min: f32,
    /// Distance from water inside which beaches form.
    pub sand_distance: f32,
    pub sand_slope_max: f32,
    pub grass_fertility_min: f32,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            rock_slope_threshold: 0.5,
            steep_slope_threshold: 0.8,
            snow_line_start: 0.7,
            snow_line_full: 0.9,
            freezing_point: -0.3,
            snow_melt_point: 0.1,
            mud_moisture_threshold: 0.7,
            grass_moisture_min: 0.3,
            sand_distance: 10.0,
            sand_slope_max: 0.15,
            grass_fertility_min: 0.2,
        }
    }
}

/// Per-cell material output.
#[derive(Debug, Clone)]
pub struct MaterialData {
    pub cell_materials: Vec<MaterialWeights>,
    pub dominant: Grid<MaterialType>,
}

impl MaterialData {
    fn new(cells: usize) -> Self {
        Self {
            cell_materials: vec![MaterialWeights::default(); cells * cells],
            dominant: Grid::new(cells, cells, MaterialType::Dirt),
        }
    }

    pub fn cells(&self) -> usize {
        self.dominant.width()
    }
}

/// Computes surface material weights from terrain and climate data.
pub struct MaterialBlender {
    settings: MaterialSettings,
    data: MaterialData,
}

impl MaterialBlender {
    pub fn new(settings: MaterialSettings) -> Self {
        Self {
            settings,
            data: MaterialData::new(0),
        }
    }

    pub fn data(&self) -> &MaterialData {
        &self.data
    }

    pub fn compute(
        &mut self,
        cell_heights: &Grid<f32>,
        hydrology: &HydrologyData,
        climate: &ClimateData,
        sea_level: f32,
        height_scale: f32,
    ) {
        let cells = hydrology.cells();
        self.data = MaterialData::new(cells);

        for z in 0..cells as i32 {
            for x in 0..cells as i32 {
                let idx = z as usize * cells + x as usize;

                let height = cell_heights.get_or(x, z, 0.0);
                let height_norm = ((height - sea_level) / height_scale).clamp(0.0, 1.0);

                let mut weights = self.cell_weights(
                    height_norm,
                    hydrology.slope.get_or(x, z, 0.0),
                    climate.temperature.get_or(x, z, 0.0),
                    climate.moisture.get_or(x, z, 0.5),
                    climate.fertility.get_or(x, z, 0.0),
                    hydrology.distance_to_water.get_or(x, z, f32::MAX),
                    hydrology.water_type.get_or(x, z, WaterType::None),
                );
                weights.normalize();

                let sum = weights.total();
                if (sum - 1.0).abs() >= 0.01 {
                    log::warn!("material weights not normalized at ({x}, {z}): sum = {sum}");
                }

                self.data.cell_materials[idx] = weights;
                self.data.dominant.set(x, z, weights.dominant());
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn cell_weights(
        &self,
        height_norm: f32,
        slope: f32,
        temperature: f32,
        moisture: f32,
        fertility: f32,
        distance_to_water: f32,
        water_type: WaterType,
    ) -> MaterialWeights {
        let s = &self.settings;
        let mut weights = MaterialWeights::default();

        // Water bodies short-circuit everything else
        if water_type != WaterType::None {
            weights.set(MaterialType::Water, 1.0);
            return weights;
        }

        // Max meaningful slope gradient is ~2.0
        let normalized_slope = (slope / 2.0).min(1.0);
        let low_slope = 1.0 - normalized_slope;
        let near_water = (1.0 - distance_to_water / s.sand_distance).max(0.0);
        let high_moisture = ((moisture - s.mud_moisture_threshold)
            / (1.0 - s.mud_moisture_threshold))
            .max(0.0);

        // Rock: steep slopes expose bare stone
        let mut rock = normalized_slope;
        if normalized_slope > s.rock_slope_threshold {
            let steep = (normalized_slope - s.rock_slope_threshold)
                / (s.steep_slope_threshold - s.rock_slope_threshold);
            rock += steep * 0.5;
        }
        weights.set(MaterialType::Rock, rock);

        // Snow: cold plus altitude, with a hard snow line on top
        let cold_factor = (-temperature).clamp(0.0, 1.0);
        let mut snow = cold_factor * height_norm;
        if height_norm > s.snow_line_start {
            let line = (height_norm - s.snow_line_start) / (s.snow_line_full - s.snow_line_start);
            snow += cold_factor * line * 0.5;
        }
        weights.set(MaterialType::Snow, snow.clamp(0.0, 1.0));

        // Ice: below freezing with available moisture
        let ice_factor = (-(temperature - s.freezing_point)).clamp(0.0, 1.0);
        weights.set(MaterialType::Ice, (ice_factor * moisture * 0.5).clamp(0.0, 1.0));

        // Grass: fertile, moist, flat, and above the melt temperature
        let grass = if fertility > s.grass_fertility_min
            && moisture > s.grass_moisture_min
            && temperature > s.snow_melt_point
        {
            fertility * moisture * low_slope
        } else {
            0.0
        };
        weights.set(MaterialType::Grass, grass);

        // Sand: beaches near water on flat ground, more in warm dry areas
        let mut sand = 0.0;
        if normalized_slope < s.sand_slope_max && near_water > 0.0 {
            sand = near_water * low_slope;
            if temperature > 0.0 && moisture < 0.4 {
                sand *= 1.5;
            }
        }
        weights.set(MaterialType::Sand, sand.clamp(0.0, 1.0));

        // Mud: wet flat areas plus the waterline
        let mud = high_moisture * low_slope + near_water * moisture * 0.3;
        weights.set(MaterialType::Mud, mud.clamp(0.0, 1.0));

        // Dirt fills the remainder, receding where snow and sand dominate
        let mut dirt = low_slope * (1.0 - fertility) * (1.0 - moisture * 0.5);
        dirt *= (1.0 - weights.get(MaterialType::Snow)) * (1.0 - sand * 0.5);
        weights.set(MaterialType::Dirt, dirt.max(0.0));

        weights
    }

    /// Weights at a cell; out-of-bounds reads as pure dirt.
    pub fn weights_at(&self, x: i32, z: i32) -> MaterialWeights {
        let cells = self.data.cells();
        if x < 0 || z < 0 || x as usize >= cells || z as usize >= cells {
            let mut fallback = MaterialWeights::default();
            fallback.set(MaterialType::Dirt, 1.0);
            return fallback;
        }
        self.data.cell_materials[z as usize * cells + x as usize]
    }

    /// Dominant material at a cell; out-of-bounds reads as dirt.
    pub fn dominant_at(&self, x: i32, z: i32) -> MaterialType {
        self.data.dominant.get_or(x, z, MaterialType::Dirt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blender() -> MaterialBlender {
        MaterialBlender::new(MaterialSettings::default())
    }

    /// Water cells carry full water weight and nothing else.
    #[test]
    fn water_short_circuits() {
        let w = blender().cell_weights(0.2, 0.1, 0.5, 0.9, 0.5, 0.0, WaterType::River);
        assert_eq!(w.get(MaterialType::Water), 1.0);
        assert_eq!(w.total(), 1.0);
        assert_eq!(w.dominant(), MaterialType::Water);
    }

    /// Steep cold summits read as rock and snow, not grass.
    #[test]
    fn steep_cold_summit_is_rock_and_snow() {
        let mut w = blender().cell_weights(0.95, 1.9, -0.8, 0.4, 0.1, 50.0, WaterType::None);
        w.normalize();
        let rocky = w.get(MaterialType::Rock) + w.get(MaterialType::Snow);
        assert!(rocky > 0.6, "rock+snow = {rocky}");
        assert_eq!(w.get(MaterialType::Grass), 0.0);
    }

    /// Fertile moist flats grow grass.
    #[test]
    fn fertile_flat_is_grassy() {
        let mut w = blender().cell_weights(0.3, 0.05, 0.4, 0.7, 0.8, 60.0, WaterType::None);
        w.normalize();
        assert_eq!(w.dominant(), MaterialType::Grass);
    }

    /// Warm dry shoreline favours sand.
    #[test]
    fn warm_dry_shore_is_sandy() {
        let mut w = blender().cell_weights(0.1, 0.05, 0.5, 0.2, 0.05, 1.0, WaterType::None);
        w.normalize();
        assert!(w.get(MaterialType::Sand) > 0.3, "sand = {}", w.get(MaterialType::Sand));
    }

    /// The normalization invariant holds across a parameter sweep.
    #[test]
    fn weights_always_normalize() {
        let b = blender();
        for hi in 0..5 {
            for si in 0..5 {
                for ti in 0..5 {
                    for mi in 0..5 {
                        let mut w = b.cell_weights(
                            hi as f32 / 4.0,
                            si as f32 / 2.0,
                            ti as f32 / 2.0 - 1.0,
                            mi as f32 / 4.0,
                            0.4,
                            8.0,
                            WaterType::None,
                        );
                        w.normalize();
                        assert!((w.total() - 1.0).abs() < 0.01);
                    }
                }
            }
        }
    }

    /// Zero-weight cells fall back to pure dirt.
    #[test]
    fn empty_weights_fall_back_to_dirt() {
        let mut w = MaterialWeights::default();
        w.normalize();
        assert_eq!(w.get(MaterialType::Dirt), 1.0);
    }
}
