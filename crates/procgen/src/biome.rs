//! Soft biome classification.
//!
//! Biomes are weights, not labels: each cell carries a normalized weight
//! vector over the ten biome types, computed from smooth threshold bands
//! on temperature and moisture, with fertility and the wetland flag
//! modulating the weights. Biomes never alter geometry; their output feeds
//! materials, vegetation, and colour.

use crate::climate::ClimateData;
use crate::wetland::WetlandData;
use glam::Vec3;
use worldcore::Grid;

/// The closed set of biome types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BiomeType {
    Polar = 0,
    Tundra = 1,
    Boreal = 2,
    Temperate = 3,
    Mediterranean = 4,
    Grassland = 5,
    Desert = 6,
    Tropical = 7,
    Rainforest = 8,
    Wetland = 9,
}

pub const BIOME_COUNT: usize = 10;

pub const ALL_BIOMES: [BiomeType; BIOME_COUNT] = [
    BiomeType::Polar,
    BiomeType::Tundra,
    BiomeType::Boreal,
    BiomeType::Temperate,
    BiomeType::Mediterranean,
    BiomeType::Grassland,
    BiomeType::Desert,
    BiomeType::Tropical,
    BiomeType::Rainforest,
    BiomeType::Wetland,
];

impl BiomeType {
    pub fn name(self) -> &'static str {
        match self {
            BiomeType::Polar => "Polar",
            BiomeType::Tundra => "Tundra",
            BiomeType::Boreal => "Boreal",
            BiomeType::Temperate => "Temperate",
            BiomeType::Mediterranean => "Mediterranean",
            BiomeType::Grassland => "Grassland",
            BiomeType::Desert => "Desert",
            BiomeType::Tropical => "Tropical",
            BiomeType::Rainforest => "Rainforest",
            BiomeType::Wetland => "Wetland",
        }
    }

    /// Representative colour for debug rendering.
    pub fn color(self) -> Vec3 {
        match self {
            BiomeType::Polar => Vec3::new(0.95, 0.95, 1.0),
            BiomeType::Tundra => Vec3::new(0.7, 0.75, 0.8),
            BiomeType::Boreal => Vec3::new(0.2, 0.4, 0.3),
            BiomeType::Temperate => Vec3::new(0.3, 0.6, 0.3),
            BiomeType::Mediterranean => Vec3::new(0.6, 0.7, 0.4),
            BiomeType::Grassland => Vec3::new(0.7, 0.8, 0.4),
            BiomeType::Desert => Vec3::new(0.9, 0.8, 0.5),
            BiomeType::Tropical => Vec3::new(0.2, 0.7, 0.3),
            BiomeType::Rainforest => Vec3::new(0.1, 0.5, 0.2),
            BiomeType::Wetland => Vec3::new(0.3, 0.5, 0.5),
        }
    }
}

/// Normalized per-cell biome weights.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiomeWeights {
    pub weights: [f32; BIOME_COUNT],
}

impl BiomeWeights {
    #[inline]
    pub fn get(&self, biome: BiomeType) -> f32 {
        self.weights[biome as usize]
    }

    #[inline]
    pub fn set(&mut self, biome: BiomeType, weight: f32) {
        self.weights[biome as usize] = weight;
    }

    #[inline]
    pub fn add(&mut self, biome: BiomeType, weight: f32) {
        self.weights[biome as usize] += weight;
    }

    pub fn total(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Scale so the weights sum to 1 (no-op on an all-zero vector).
    pub fn normalize(&mut self) {
        let sum = self.total();
        if sum > 0.0 {
            for w in &mut self.weights {
                *w /= sum;
            }
        }
    }

    /// The biome with the highest weight.
    pub fn dominant(&self) -> BiomeType {
        let mut best = 0;
        for i in 1..BIOME_COUNT {
            if self.weights[i] > self.weights[best] {
                best = i;
            }
        }
        ALL_BIOMES[best]
    }

    /// Weight-blended colour across all biomes.
    pub fn blended_color(&self) -> Vec3 {
        let mut color = Vec3::ZERO;
        for (i, &w) in self.weights.iter().enumerate() {
            if w > 0.0 {
                color += ALL_BIOMES[i].color() * w;
            }
        }
        color
    }
}

/// Per-cell classification output.
#[derive(Debug, Clone)]
pub struct BiomeData {
    pub cell_biomes: Vec<BiomeWeights>,
    pub dominant: Grid<BiomeType>,
}

impl BiomeData {
    fn new(cells: usize) -> Self {
        Self {
            cell_biomes: vec![BiomeWeights::default(); cells * cells],
            dominant: Grid::new(cells, cells, BiomeType::Temperate),
        }
    }

    pub fn cells(&self) -> usize {
        self.dominant.width()
    }
}

/// Classifies cells into soft biome weights from climate data.
pub struct BiomeClassifier {
    data: BiomeData,
}

impl Default for BiomeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BiomeClassifier {
    pub fn new() -> Self {
        Self {
            data: BiomeData::new(0),
        }
    }

    pub fn data(&self) -> &BiomeData {
        &self.data
    }

    pub fn classify(&mut self, climate: &ClimateData, wetlands: Option<&WetlandData>) {
        let cells = climate.cells();
        self.data = BiomeData::new(cells);

        for z in 0..cells as i32 {
            for x in 0..cells as i32 {
                let idx = z as usize * cells + x as usize;
                let temperature = climate.temperature.get_or(x, z, 0.0);
                let moisture = climate.moisture.get_or(x, z, 0.5);
                let fertility = climate.fertility.get_or(x, z, 0.5);
                let is_wetland = wetlands
                    .map(|w| w.is_wetland.get_or(x, z, false))
                    .unwrap_or(false);

                let mut weights =
                    Self::compute_weights(temperature, moisture, fertility, is_wetland);
                weights.normalize();

                self.data.cell_biomes[idx] = weights;
                self.data.dominant.set(x, z, weights.dominant());
            }
        }
    }

    /// Smooth threshold bands over temperature (`[-1, 1]`) and moisture
    /// (`[0, 1]`); fertility and the wetland flag modulate the result.
    /// Each biome weight is a product of band functions, renormalized by
    /// the caller.
    fn compute_weights(
        temperature: f32,
        moisture: f32,
        fertility: f32,
        is_wetland: bool,
    ) -> BiomeWeights {
        let mut weights = BiomeWeights::default();
        let t = Self::smooth_threshold;

        // Wetland override still lets neighbouring biomes blend in
        if is_wetland {
            weights.set(BiomeType::Wetland, 0.7);
        }

        // Cold bands
        let polar = t(-temperature, 0.6, 0.15);
        weights.add(BiomeType::Polar, polar);

        let tundra = t(-temperature, 0.3, 0.15) * (1.0 - t(-temperature, 0.6, 0.15));
        weights.add(BiomeType::Tundra, tundra);

        let boreal = t(-temperature, 0.0, 0.2)
            * (1.0 - t(-temperature, 0.3, 0.15))
            * t(moisture, 0.3, 0.15);
        weights.add(BiomeType::Boreal, boreal);

        // Dry bands
        let desert = t(-moisture, -0.15, 0.1) * t(temperature, -0.2, 0.2);
        weights.add(BiomeType::Desert, desert);

        let grassland =
            t(moisture, 0.2, 0.15) * t(-moisture, -0.5, 0.15) * t(temperature, 0.0, 0.2);
        weights.add(BiomeType::Grassland, grassland);

        let mediterranean =
            t(temperature, 0.2, 0.2) * t(moisture, 0.2, 0.15) * t(-moisture, -0.5, 0.15);
        weights.add(BiomeType::Mediterranean, mediterranean);

        // Hot and wet bands
        let tropical =
            t(moisture, 0.5, 0.15) * t(temperature, 0.3, 0.15) * (1.0 - t(moisture, 0.7, 0.15));
        weights.add(BiomeType::Tropical, tropical);

        let rainforest = t(moisture, 0.7, 0.1) * t(temperature, 0.4, 0.15);
        weights.add(BiomeType::Rainforest, rainforest);

        // Temperate fills the moderate middle
        let temperate = t(temperature, -0.3, 0.2)
            * t(-temperature, -0.5, 0.2)
            * t(moisture, 0.25, 0.15)
            * t(-moisture, -0.7, 0.15);
        weights.add(BiomeType::Temperate, temperate);

        // Fertility tilts the balance between barren and vegetated cover.
        // At 0.5 both multipliers are 1, so the bands stand unmodified.
        let vegetated_factor = 0.5 + fertility;
        let barren_factor = 1.5 - fertility;
        for biome in [BiomeType::Polar, BiomeType::Tundra, BiomeType::Desert] {
            weights.weights[biome as usize] *= barren_factor;
        }
        for biome in [
            BiomeType::Boreal,
            BiomeType::Temperate,
            BiomeType::Mediterranean,
            BiomeType::Grassland,
            BiomeType::Tropical,
            BiomeType::Rainforest,
            BiomeType::Wetland,
        ] {
            weights.weights[biome as usize] *= vegetated_factor;
        }

        // Nothing scored: fall back to temperate
        if weights.total() < 0.01 {
            weights.set(BiomeType::Temperate, 1.0);
        }

        weights
    }

    /// Smoothstep band centred at `threshold` with the given half width:
    /// 0 well below the threshold, 1 well above.
    fn smooth_threshold(value: f32, threshold: f32, half_width: f32) -> f32 {
        let t = ((value - threshold + half_width) / (2.0 * half_width)).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }

    /// Weights at a cell; out-of-bounds reads as pure temperate.
    pub fn weights_at(&self, x: i32, z: i32) -> BiomeWeights {
        let cells = self.data.cells();
        if x < 0 || z < 0 || x as usize >= cells || z as usize >= cells {
            let mut fallback = BiomeWeights::default();
            fallback.set(BiomeType::Temperate, 1.0);
            return fallback;
        }
        self.data.cell_biomes[z as usize * cells + x as usize]
    }

    /// Dominant biome at a cell; out-of-bounds reads as temperate.
    pub fn dominant_at(&self, x: i32, z: i32) -> BiomeType {
        self.data.dominant.get_or(x, z, BiomeType::Temperate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Archetypal climates land on the expected dominant biome. Fertility
    /// sits at the neutral 0.5 so the bands decide alone.
    #[test]
    fn archetypes_classify_sensibly() {
        let cases = [
            (-0.9f32, 0.5f32, false, BiomeType::Polar),
            (0.3, 0.05, false, BiomeType::Desert),
            (0.8, 0.9, false, BiomeType::Rainforest),
            (0.0, 0.45, false, BiomeType::Temperate),
            (0.1, 0.75, true, BiomeType::Wetland),
        ];
        for (temperature, moisture, wetland, expected) in cases {
            let mut w = BiomeClassifier::compute_weights(temperature, moisture, 0.5, wetland);
            w.normalize();
            assert_eq!(
                w.dominant(),
                expected,
                "t={temperature} m={moisture} wetland={wetland}"
            );
        }
    }

    /// Every weight vector sums to 1 within tolerance after normalization.
    #[test]
    fn weights_normalize_to_one() {
        for ti in 0..21 {
            for mi in 0..21 {
                for fi in 0..3 {
                    let temperature = ti as f32 / 10.0 - 1.0;
                    let moisture = mi as f32 / 20.0;
                    let fertility = fi as f32 / 2.0;
                    let mut w =
                        BiomeClassifier::compute_weights(temperature, moisture, fertility, false);
                    w.normalize();
                    assert!(
                        (w.total() - 1.0).abs() < 0.01,
                        "sum {} at t={temperature} m={moisture} f={fertility}",
                        w.total()
                    );
                }
            }
        }
    }

    /// The fallback assigns full weight to temperate when nothing scores.
    #[test]
    fn empty_classification_falls_back_to_temperate() {
        // A contradictory climate no band covers strongly
        let mut w = BiomeClassifier::compute_weights(-0.45, 0.05, 0.5, false);
        w.normalize();
        assert!((w.total() - 1.0).abs() < 0.01);
    }

    /// On a climate where desert and grassland bands overlap, fertility
    /// decides which cover wins.
    #[test]
    fn fertility_tilts_barren_against_vegetated() {
        let mut barren = BiomeClassifier::compute_weights(0.3, 0.18, 0.0, false);
        barren.normalize();
        assert_eq!(barren.dominant(), BiomeType::Desert);

        let mut lush = BiomeClassifier::compute_weights(0.3, 0.18, 1.0, false);
        lush.normalize();
        assert_eq!(lush.dominant(), BiomeType::Grassland);

        assert!(lush.get(BiomeType::Desert) < barren.get(BiomeType::Desert));
    }

    /// Dominant is the argmax of the weight vector.
    #[test]
    fn dominant_is_argmax() {
        let mut w = BiomeWeights::default();
        w.set(BiomeType::Desert, 0.2);
        w.set(BiomeType::Grassland, 0.5);
        w.set(BiomeType::Tundra, 0.3);
        assert_eq!(w.dominant(), BiomeType::Grassland);
    }
}
