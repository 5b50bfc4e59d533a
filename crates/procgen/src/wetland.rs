//! Wetland and floodplain detection.
//!
//! Wetlands form where cells sit near water on low slopes with high
//! moisture (or strong through-flow). They are biome modifiers, not water
//! bodies: they influence surface materials, vegetation, and colour, and
//! never change geometry.

use crate::hydrology::HydrologyData;
use crate::rivers::WaterType;
use worldcore::Grid;

/// Settings for wetland detection.
#[derive(Debug, Clone)]
pub struct WetlandSettings {
    /// Maximum distance to water to count as "near" (world units).
    pub max_water_distance: f32,
    /// Maximum slope to count as "low slope".
    pub max_slope: f32,
    /// Minimum moisture to count as "high moisture".
    pub min_moisture: f32,
    /// Alternative moisture indicator via flow accumulation.
    pub min_flow_accumulation: u32,
}

impl Default for WetlandSettings {
    fn default() -> Self {
        Self {
            max_water_distance: 15.0,
            max_slope: 0.1,
            min_moisture: 0.6,
            min_flow_accumulation: 50,
        }
    }
}

/// Per-cell wetland flags.
#[derive(Debug, Clone)]
pub struct WetlandData {
    pub is_wetland: Grid<bool>,
    /// Intensity in `(0, 1]` for blending biome effects.
    pub intensity: Grid<f32>,
    /// Near a river, very low slope, strong flow.
    pub is_floodplain: Grid<bool>,
}

impl WetlandData {
    fn new(cells: usize) -> Self {
        Self {
            is_wetland: Grid::new(cells, cells, false),
            intensity: Grid::new(cells, cells, 0.0),
            is_floodplain: Grid::new(cells, cells, false),
        }
    }
}

/// Detects wetlands and floodplains from hydrology data.
pub struct WetlandDetector {
    settings: WetlandSettings,
    data: WetlandData,
}

impl WetlandDetector {
    pub fn new(settings: WetlandSettings) -> Self {
        Self {
            settings,
            data: WetlandData::new(0),
        }
    }

    pub fn data(&self) -> &WetlandData {
        &self.data
    }

    pub fn detect(&mut self, hydrology: &HydrologyData) {
        let cells = hydrology.cells();
        self.data = WetlandData::new(cells);

        for z in 0..cells as i32 {
            for x in 0..cells as i32 {
                // Water bodies are water, not wetlands
                if hydrology.water_type.get_or(x, z, WaterType::None) != WaterType::None {
                    continue;
                }

                let distance = hydrology
                    .distance_to_water
                    .get_or(x, z, self.settings.max_water_distance);
                let slope = hydrology.slope.get_or(x, z, 0.0);
                let moisture = hydrology.moisture.get_or(x, z, 0.0);
                let flow_accum = hydrology.flow_accumulation.get_or(x, z, 0);

                let intensity = self.intensity(distance, slope, moisture, flow_accum);
                if intensity <= 0.0 {
                    continue;
                }

                self.data.is_wetland.set(x, z, true);
                self.data.intensity.set(x, z, intensity);

                let near_river = distance < self.settings.max_water_distance * 0.5;
                let very_low_slope = slope < self.settings.max_slope * 0.5;
                let high_flow = flow_accum > self.settings.min_flow_accumulation * 2;
                if near_river && very_low_slope && high_flow {
                    self.data.is_floodplain.set(x, z, true);
                }
            }
        }
    }

    /// Wetland intensity: zero unless near water, low slope, and either
    /// moist or well-drained; otherwise the geometric mean of distance and
    /// slope factors scaled by the stronger of moisture and flow.
    fn intensity(&self, distance: f32, slope: f32, moisture: f32, flow_accum: u32) -> f32 {
        let s = &self.settings;

        if distance >= s.max_water_distance {
            return 0.0;
        }
        if slope >= s.max_slope {
            return 0.0;
        }
        let high_moisture = moisture > s.min_moisture || flow_accum > s.min_flow_accumulation;
        if !high_moisture {
            return 0.0;
        }

        let distance_factor = (1.0 - distance / s.max_water_distance).max(0.0);
        let slope_factor = (1.0 - slope / s.max_slope).max(0.0);
        let moisture_factor =
            ((moisture - s.min_moisture) / (1.0 - s.min_moisture)).clamp(0.0, 1.0);
        let flow_factor =
            (flow_accum as f32 / (s.min_flow_accumulation * 10) as f32).min(1.0);

        let intensity =
            (distance_factor * slope_factor).sqrt() * moisture_factor.max(flow_factor);
        intensity.clamp(0.0, 1.0)
    }

    pub fn is_wetland(&self, x: i32, z: i32) -> bool {
        self.data.is_wetland.get_or(x, z, false)
    }

    pub fn intensity_at(&self, x: i32, z: i32) -> f32 {
        self.data.intensity.get_or(x, z, 0.0)
    }

    pub fn is_floodplain(&self, x: i32, z: i32) -> bool {
        self.data.is_floodplain.get_or(x, z, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensity_gates() {
        let d = WetlandDetector::new(WetlandSettings::default());
        // Too far from water
        assert_eq!(d.intensity(20.0, 0.01, 0.9, 0), 0.0);
        // Too steep
        assert_eq!(d.intensity(2.0, 0.5, 0.9, 0), 0.0);
        // Dry and weak flow
        assert_eq!(d.intensity(2.0, 0.01, 0.1, 10), 0.0);
        // Ideal conditions
        let v = d.intensity(1.0, 0.01, 0.9, 0);
        assert!(v > 0.5 && v <= 1.0, "intensity {v}");
    }

    /// High flow substitutes for moisture as a wetland indicator.
    #[test]
    fn flow_counts_as_moisture() {
        let d = WetlandDetector::new(WetlandSettings::default());
        let v = d.intensity(2.0, 0.02, 0.1, 400);
        assert!(v > 0.0);
    }
}
