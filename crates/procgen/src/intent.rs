//! High-level terrain intent and the settings derivation layer.
//!
//! Instead of exposing ~30 mechanical parameters, terrain is authored
//! through 8 orthogonal axes that map to how designers actually think:
//! continental scale, elevation range, mountain coverage/sharpness,
//! ruggedness, erosion age, river strength, and chaos. All axes are
//! normalized to `[0, 1]`; the derivation layer maps them to coherent
//! mechanical settings and enforces the parameter invariants, so sliders
//! cannot produce alien terrain states.

use serde::{Deserialize, Serialize};
use worldcore::GenError;

/// The 8-axis authoring block. Every field is in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TerrainIntent {
    /// Size of the major landmasses: small islands up to large continents.
    pub continental_scale: f32,
    /// Absolute height contrast, from flat to extreme vertical relief.
    pub elevation_range: f32,
    /// Fraction of the world that is mountainous.
    pub mountain_coverage: f32,
    /// Rounded versus jagged peaks.
    pub mountain_sharpness: f32,
    /// Small-scale surface roughness.
    pub ruggedness: f32,
    /// Degree of weathering, young terrain to ancient.
    pub erosion_age: f32,
    /// Valley carving dominance, weak streams to dominant rivers.
    pub river_strength: f32,
    /// Breaks symmetry and predictability.
    pub chaos: f32,
}

impl Default for TerrainIntent {
    fn default() -> Self {
        Self {
            continental_scale: 0.5,
            elevation_range: 0.5,
            mountain_coverage: 0.5,
            mountain_sharpness: 0.5,
            ruggedness: 0.5,
            erosion_age: 0.5,
            river_strength: 0.5,
            chaos: 0.3,
        }
    }
}

impl TerrainIntent {
    fn axes(&self) -> [(&'static str, f32); 8] {
        [
            ("continental_scale", self.continental_scale),
            ("elevation_range", self.elevation_range),
            ("mountain_coverage", self.mountain_coverage),
            ("mountain_sharpness", self.mountain_sharpness),
            ("ruggedness", self.ruggedness),
            ("erosion_age", self.erosion_age),
            ("river_strength", self.river_strength),
            ("chaos", self.chaos),
        ]
    }

    /// Reject intents outside `[0, 1]` on any axis.
    pub fn validate(&self) -> Result<(), GenError> {
        for (name, value) in self.axes() {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(GenError::Configuration(format!(
                    "intent axis '{name}' out of [0, 1]: {value}"
                )));
            }
        }
        Ok(())
    }

    /// Component-wise comparison with a small epsilon.
    pub fn approx_eq(&self, other: &TerrainIntent) -> bool {
        self.axes()
            .iter()
            .zip(other.axes().iter())
            .all(|((_, a), (_, b))| (a - b).abs() < 1e-4)
    }
}

/// Named preset with a description for UI display.
#[derive(Debug, Clone, Copy)]
pub struct TerrainPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub intent: TerrainIntent,
}

/// Built-in presets representing realistic terrain archetypes.
pub const PRESETS: [TerrainPreset; 8] = [
    TerrainPreset {
        name: "Alpine Young",
        description: "Sharp, dramatic peaks with active erosion. Fresh mountain ranges with deep valleys.",
        intent: TerrainIntent {
            continental_scale: 0.8,
            elevation_range: 0.9,
            mountain_coverage: 0.7,
            mountain_sharpness: 0.8,
            ruggedness: 0.55,
            erosion_age: 0.2,
            river_strength: 0.6,
            chaos: 0.3,
        },
    },
    TerrainPreset {
        name: "Ancient Highlands",
        description: "Weathered, rounded mountains worn down over millennia. Gentle slopes with mature river systems.",
        intent: TerrainIntent {
            continental_scale: 0.7,
            elevation_range: 0.6,
            mountain_coverage: 0.5,
            mountain_sharpness: 0.3,
            ruggedness: 0.4,
            erosion_age: 0.85,
            river_strength: 0.4,
            chaos: 0.2,
        },
    },
    TerrainPreset {
        name: "Arid Plateaus",
        description: "High flat mesas with dramatic cliff edges. Sparse erosion in dry conditions.",
        intent: TerrainIntent {
            continental_scale: 0.6,
            elevation_range: 0.5,
            mountain_coverage: 0.3,
            mountain_sharpness: 0.6,
            ruggedness: 0.3,
            erosion_age: 0.6,
            river_strength: 0.2,
            chaos: 0.4,
        },
    },
    TerrainPreset {
        name: "Volcanic Ranges",
        description: "Steep, dramatic peaks with chaotic formations. Active geological features.",
        intent: TerrainIntent {
            continental_scale: 0.5,
            elevation_range: 0.95,
            mountain_coverage: 0.6,
            mountain_sharpness: 0.85,
            ruggedness: 0.75,
            erosion_age: 0.15,
            river_strength: 0.3,
            chaos: 0.7,
        },
    },
    TerrainPreset {
        name: "Rolling Temperate",
        description: "Gentle hills and valleys. Lush, eroded landscape typical of temperate regions.",
        intent: TerrainIntent {
            continental_scale: 0.6,
            elevation_range: 0.35,
            mountain_coverage: 0.2,
            mountain_sharpness: 0.25,
            ruggedness: 0.35,
            erosion_age: 0.7,
            river_strength: 0.55,
            chaos: 0.25,
        },
    },
    TerrainPreset {
        name: "Coastal Fjords",
        description: "Deep valleys carved by glaciers, steep cliffs meeting water.",
        intent: TerrainIntent {
            continental_scale: 0.55,
            elevation_range: 0.8,
            mountain_coverage: 0.55,
            mountain_sharpness: 0.7,
            ruggedness: 0.5,
            erosion_age: 0.5,
            river_strength: 0.75,
            chaos: 0.35,
        },
    },
    TerrainPreset {
        name: "Flat Plains",
        description: "Minimal elevation change. Wide open spaces with subtle undulation.",
        intent: TerrainIntent {
            continental_scale: 0.8,
            elevation_range: 0.15,
            mountain_coverage: 0.02,
            mountain_sharpness: 0.2,
            ruggedness: 0.2,
            erosion_age: 0.8,
            river_strength: 0.3,
            chaos: 0.15,
        },
    },
    TerrainPreset {
        name: "Custom",
        description: "User-defined terrain parameters.",
        intent: TerrainIntent {
            continental_scale: 0.5,
            elevation_range: 0.5,
            mountain_coverage: 0.5,
            mountain_sharpness: 0.5,
            ruggedness: 0.5,
            erosion_age: 0.5,
            river_strength: 0.5,
            chaos: 0.3,
        },
    },
];

/// Find a preset by name, case-insensitively.
pub fn find_preset(name: &str) -> Option<&'static TerrainPreset> {
    PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid_intents() {
        for preset in &PRESETS {
            assert!(preset.intent.validate().is_ok(), "{} invalid", preset.name);
        }
    }

    #[test]
    fn find_preset_is_case_insensitive() {
        assert!(find_preset("flat plains").is_some());
        assert!(find_preset("ALPINE YOUNG").is_some());
        assert!(find_preset("atlantis").is_none());
    }

    #[test]
    fn out_of_range_intent_is_rejected() {
        let intent = TerrainIntent {
            chaos: 1.2,
            ..TerrainIntent::default()
        };
        assert!(intent.validate().is_err());
    }

    /// Intent survives a serialisation round trip unchanged.
    #[test]
    fn intent_serde_roundtrip() {
        let intent = PRESETS[0].intent;
        let text = ron::to_string(&intent).unwrap();
        let back: TerrainIntent = ron::from_str(&text).unwrap();
        assert!(intent.approx_eq(&back));
    }
}
