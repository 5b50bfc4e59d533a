//! Climate field generation: temperature, moisture, rain shadow,
//! fertility.
//!
//! Climate is authored through its own intent block, mirroring the terrain
//! intent: a handful of normalized axes mapped to mechanical settings.
//! Fields are continuous values derived from FBM noise at world
//! coordinates, terrain altitude, and hydrology, so they stay seamless
//! across chunk boundaries.

use crate::hydrology::HydrologyData;
use crate::noise::SimplexNoise;
use crate::rivers::WaterType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use worldcore::Grid;

/// High-level climate authoring axes, all in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClimateIntent {
    /// Size of climate regions, small varied zones to large uniform bands.
    pub climate_scale: f32,
    /// Global warmth, cold world to hot world.
    pub temperature_bias: f32,
    /// Temperature variation strength.
    pub temperature_range: f32,
    /// Rainfall baseline, dry world to wet world.
    pub humidity: f32,
    /// Dryness bias, retained moisture to rapid evaporation.
    pub aridity: f32,
    /// Vegetation potential, barren to lush.
    pub fertility: f32,
    /// Climate noise distortion.
    pub chaos: f32,
}

impl Default for ClimateIntent {
    fn default() -> Self {
        Self {
            climate_scale: 0.5,
            temperature_bias: 0.5,
            temperature_range: 0.5,
            humidity: 0.5,
            aridity: 0.5,
            fertility: 0.5,
            chaos: 0.3,
        }
    }
}

impl ClimateIntent {
    pub fn temperate() -> Self {
        Self {
            climate_scale: 0.5,
            temperature_bias: 0.5,
            temperature_range: 0.6,
            humidity: 0.5,
            aridity: 0.3,
            fertility: 0.6,
            chaos: 0.3,
        }
    }

    pub fn tropical() -> Self {
        Self {
            climate_scale: 0.6,
            temperature_bias: 0.8,
            temperature_range: 0.2,
            humidity: 0.8,
            aridity: 0.2,
            fertility: 0.9,
            chaos: 0.4,
        }
    }

    pub fn arid() -> Self {
        Self {
            climate_scale: 0.7,
            temperature_bias: 0.7,
            temperature_range: 0.8,
            humidity: 0.2,
            aridity: 0.9,
            fertility: 0.2,
            chaos: 0.2,
        }
    }

    pub fn arctic() -> Self {
        Self {
            climate_scale: 0.6,
            temperature_bias: 0.1,
            temperature_range: 0.4,
            humidity: 0.3,
            aridity: 0.4,
            fertility: 0.1,
            chaos: 0.2,
        }
    }

    /// Clamp every axis to `[0, 1]`.
    pub fn saturate(&mut self) {
        for v in [
            &mut self.climate_scale,
            &mut self.temperature_bias,
            &mut self.temperature_range,
            &mut self.humidity,
            &mut self.aridity,
            &mut self.fertility,
            &mut self.chaos,
        ] {
            *v = v.clamp(0.0, 1.0);
        }
    }
}

/// Mechanical climate parameters derived from [`ClimateIntent`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateSettings {
    pub base_temperature: f32,
    pub temperature_amplitude: f32,
    pub temperature_frequency: f32,
    /// Temperature drop per unit of normalized elevation.
    pub elevation_lapse_rate: f32,
    pub base_precipitation: f32,
    pub precipitation_variation: f32,
    pub precipitation_frequency: f32,
    pub evaporation_rate: f32,
    pub vegetation_density: f32,
}

impl Default for ClimateSettings {
    fn default() -> Self {
        Self {
            base_temperature: 0.5,
            temperature_amplitude: 0.5,
            temperature_frequency: 0.01,
            elevation_lapse_rate: 0.006,
            base_precipitation: 0.5,
            precipitation_variation: 0.3,
            precipitation_frequency: 0.02,
            evaporation_rate: 0.3,
            vegetation_density: 0.5,
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

impl ClimateSettings {
    /// Derive mechanical settings from climate intent.
    pub fn from_intent(intent: &ClimateIntent) -> Self {
        Self {
            base_temperature: lerp(0.1, 0.9, intent.temperature_bias),
            temperature_amplitude: lerp(0.1, 0.8, intent.temperature_range),
            // Larger climate scale = lower frequency = bigger zones
            temperature_frequency: lerp(0.02, 0.005, intent.climate_scale),
            // Dry air has the stronger lapse rate
            elevation_lapse_rate: lerp(0.005, 0.008, intent.aridity),
            base_precipitation: lerp(0.1, 0.9, intent.humidity),
            // Wet worlds are more uniform
            precipitation_variation: lerp(0.5, 0.2, intent.humidity),
            precipitation_frequency: lerp(0.03, 0.008, intent.climate_scale),
            evaporation_rate: lerp(0.1, 0.8, intent.aridity),
            vegetation_density: lerp(0.2, 1.0, intent.fertility),
        }
    }
}

/// Per-cell climate fields.
#[derive(Debug, Clone)]
pub struct ClimateData {
    /// Temperature in `[-1, 1]`: negative cold, positive hot.
    pub temperature: Grid<f32>,
    /// Moisture in `[0, 1]`: 0 arid, 1 saturated.
    pub moisture: Grid<f32>,
    /// Fertility in `[0, 1]`: 0 barren, 1 lush.
    pub fertility: Grid<f32>,
    /// Altitude cooling factor in `[0, 1]`.
    pub altitude_cooling: Grid<f32>,
    /// Rain shadow intensity in `[0, 1]`.
    pub rain_shadow: Grid<f32>,
}

impl ClimateData {
    fn new(cells: usize) -> Self {
        Self {
            temperature: Grid::new(cells, cells, 0.0),
            moisture: Grid::new(cells, cells, 0.5),
            fertility: Grid::new(cells, cells, 0.5),
            altitude_cooling: Grid::new(cells, cells, 0.0),
            rain_shadow: Grid::new(cells, cells, 0.0),
        }
    }

    pub fn cells(&self) -> usize {
        self.temperature.width()
    }
}

/// Generates climate fields from terrain and hydrology.
pub struct ClimateGenerator {
    settings: ClimateSettings,
    noise: Arc<SimplexNoise>,
    data: ClimateData,
}

impl ClimateGenerator {
    pub fn new(settings: ClimateSettings, noise: Arc<SimplexNoise>) -> Self {
        Self {
            settings,
            noise,
            data: ClimateData::new(0),
        }
    }

    pub fn data(&self) -> &ClimateData {
        &self.data
    }

    /// Generate all climate fields for a chunk. Heights are read from the
    /// per-cell slice the rest of the pipeline uses.
    #[allow(clippy::too_many_arguments)]
    pub fn generate(
        &mut self,
        cell_heights: &Grid<f32>,
        hydrology: &HydrologyData,
        sea_level: f32,
        height_scale: f32,
        cell_size: f32,
        world_offset_x: f32,
        world_offset_z: f32,
    ) {
        let cells = hydrology.cells();
        self.data = ClimateData::new(cells);

        // Rain shadow first; moisture subtracts it
        self.compute_rain_shadow(cell_heights);
        self.compute_temperature(
            cell_heights,
            sea_level,
            height_scale,
            cell_size,
            world_offset_x,
            world_offset_z,
        );
        self.compute_moisture(
            cell_heights,
            hydrology,
            sea_level,
            height_scale,
            cell_size,
            world_offset_x,
            world_offset_z,
        );
        self.compute_fertility(hydrology);
    }

    /// Prevailing wind blows west to east. Each row keeps a decaying
    /// running maximum of upwind heights; cells lower than that maximum
    /// sit in shadow proportionally to the difference.
    fn compute_rain_shadow(&mut self, cell_heights: &Grid<f32>) {
        let cells = self.data.cells() as i32;

        for z in 0..cells {
            let mut running_max = 0.0f32;
            for x in 0..cells {
                let height = cell_heights.get_or(x, z, 0.0);
                running_max = running_max.max(height);
                // Distance decay of the blocking effect
                running_max *= 0.995;

                let shadow = if running_max > height {
                    ((running_max - height) / 50.0).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                self.data.rain_shadow.set(x, z, shadow);
            }
        }
    }

    fn compute_temperature(
        &mut self,
        cell_heights: &Grid<f32>,
        sea_level: f32,
        height_scale: f32,
        cell_size: f32,
        world_offset_x: f32,
        world_offset_z: f32,
    ) {
        let cells = self.data.cells() as i32;
        let s = &self.settings;
        // Map the base temperature from [0, 1] to a [-1, 1] bias
        let temp_bias = (s.base_temperature - 0.5) * 2.0;

        for z in 0..cells {
            for x in 0..cells {
                let world_x = world_offset_x + x as f32 * cell_size;
                let world_z = world_offset_z + z as f32 * cell_size;

                let temp_noise = self.noise.fbm2(
                    world_x * s.temperature_frequency,
                    world_z * s.temperature_frequency,
                    4,
                    0.5,
                    2.0,
                );

                let height = cell_heights.get_or(x, z, 0.0);
                let alt_cooling = Self::altitude_cooling(height, sea_level, height_scale);
                self.data.altitude_cooling.set(x, z, alt_cooling);

                let temperature = temp_bias + temp_noise * s.temperature_amplitude
                    - alt_cooling * s.elevation_lapse_rate * height_scale;

                self.data.temperature.set(x, z, temperature.clamp(-1.0, 1.0));
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn compute_moisture(
        &mut self,
        cell_heights: &Grid<f32>,
        hydrology: &HydrologyData,
        sea_level: f32,
        height_scale: f32,
        cell_size: f32,
        world_offset_x: f32,
        world_offset_z: f32,
    ) {
        let cells = self.data.cells() as i32;
        let s = &self.settings;
        const PROXIMITY_RANGE: f32 = 100.0;

        for z in 0..cells {
            for x in 0..cells {
                let world_x = world_offset_x + x as f32 * cell_size;
                let world_z = world_offset_z + z as f32 * cell_size;

                let mut humidity = s.base_precipitation;

                let precip_noise = self.noise.fbm2(
                    world_x * s.precipitation_frequency,
                    world_z * s.precipitation_frequency,
                    3,
                    0.5,
                    2.0,
                );
                humidity += precip_noise * s.precipitation_variation;

                let distance = hydrology.distance_to_water.get_or(x, z, PROXIMITY_RANGE);
                let proximity_boost = if distance < PROXIMITY_RANGE {
                    (1.0 - distance / PROXIMITY_RANGE) * 0.3
                } else {
                    0.0
                };

                let rain_shadow_penalty = self.data.rain_shadow.get_or(x, z, 0.0) * 0.5;

                let height = cell_heights.get_or(x, z, 0.0);
                let altitude_penalty = if height > sea_level {
                    (height - sea_level) / height_scale * 0.3
                } else {
                    0.0
                };

                let evaporation_loss = s.evaporation_rate * 0.2;

                let mut moisture = humidity + proximity_boost
                    - rain_shadow_penalty
                    - altitude_penalty
                    - evaporation_loss;

                if hydrology.water_type.get_or(x, z, WaterType::None) != WaterType::None {
                    moisture = 1.0;
                }

                self.data.moisture.set(x, z, moisture.clamp(0.0, 1.0));
            }
        }
    }

    /// Fertility rewards moist, flat terrain. Steep slopes are infertile;
    /// water cells carry none.
    fn compute_fertility(&mut self, hydrology: &HydrologyData) {
        let cells = self.data.cells() as i32;

        for z in 0..cells {
            for x in 0..cells {
                let moisture = self.data.moisture.get_or(x, z, 0.0);
                let slope = hydrology.slope.get_or(x, z, 0.0);
                let normalized_slope = (slope / 2.0).min(1.0);

                let mut fertility =
                    self.settings.vegetation_density * moisture * (1.0 - normalized_slope);

                if hydrology.water_type.get_or(x, z, WaterType::None) != WaterType::None {
                    fertility = 0.0;
                }

                self.data.fertility.set(x, z, fertility.clamp(0.0, 1.0));
            }
        }
    }

    /// `clamp((height - sea_level) / height_scale, 0, 1)`; zero at or
    /// below sea level.
    fn altitude_cooling(height: f32, sea_level: f32, height_scale: f32) -> f32 {
        if height <= sea_level {
            return 0.0;
        }
        ((height - sea_level) / height_scale).clamp(0.0, 1.0)
    }

    pub fn temperature(&self, x: i32, z: i32) -> f32 {
        self.data.temperature.get_or(x, z, 0.0)
    }

    pub fn moisture(&self, x: i32, z: i32) -> f32 {
        self.data.moisture.get_or(x, z, 0.5)
    }

    pub fn fertility(&self, x: i32, z: i32) -> f32 {
        self.data.fertility.get_or(x, z, 0.0)
    }
}
