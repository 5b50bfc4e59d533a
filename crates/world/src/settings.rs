//! World configuration. Loaded from `world.ron` when present.

use procgen::{ClimateIntent, TerrainIntent};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Persistent world settings: chunk layout, seed, sea level, and the
/// terrain / climate intents everything mechanical is derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSettings {
    /// Grid cells per chunk side.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// World units per cell.
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Chunks to keep loaded in each direction around the camera.
    #[serde(default = "default_view_distance")]
    pub view_distance: i32,
    /// World seed.
    #[serde(default = "default_seed")]
    pub seed: u32,
    /// Sea level as a fraction of the height range.
    #[serde(default = "default_sea_level")]
    pub sea_level_normalized: f32,
    /// Generate water surfaces (ocean planes, river and lake meshes).
    #[serde(default = "default_true")]
    pub water_enabled: bool,
    /// Half-extent of the world in chunks; edges beyond it count as the
    /// world boundary for ocean connectivity. `None` = unbounded.
    #[serde(default)]
    pub world_extent: Option<i32>,
    /// Terrain authoring axes.
    #[serde(default)]
    pub intent: TerrainIntent,
    /// Climate authoring axes.
    #[serde(default = "ClimateIntent::temperate")]
    pub climate: ClimateIntent,
}

fn default_chunk_size() -> usize {
    64
}
fn default_cell_size() -> f32 {
    1.0
}
fn default_view_distance() -> i32 {
    3
}
fn default_seed() -> u32 {
    12345
}
fn default_sea_level() -> f32 {
    0.45
}
fn default_true() -> bool {
    true
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            cell_size: default_cell_size(),
            view_distance: default_view_distance(),
            seed: default_seed(),
            sea_level_normalized: default_sea_level(),
            water_enabled: true,
            world_extent: None,
            intent: TerrainIntent::default(),
            climate: ClimateIntent::temperate(),
        }
    }
}

impl WorldSettings {
    /// Load settings from a RON file. Missing or invalid files fall back
    /// to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(settings) => return settings,
                Err(e) => log::warn!("Invalid settings at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save current settings. Logs on error.
    pub fn save(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(text) => {
                if let Err(e) = std::fs::write(path, text) {
                    log::warn!("Could not write settings to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialise settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Settings survive a RON round trip.
    #[test]
    fn settings_ron_roundtrip() {
        let mut settings = WorldSettings::default();
        settings.seed = 777;
        settings.world_extent = Some(4);
        let text = ron::ser::to_string_pretty(&settings, Default::default()).unwrap();
        let back: WorldSettings = ron::from_str(&text).unwrap();
        assert_eq!(back.seed, 777);
        assert_eq!(back.world_extent, Some(4));
        assert!(back.intent.approx_eq(&settings.intent));
    }

    /// A partial file fills the rest from defaults.
    #[test]
    fn partial_settings_use_defaults() {
        let back: WorldSettings = ron::from_str("(seed: 9)").unwrap();
        assert_eq!(back.seed, 9);
        assert_eq!(back.chunk_size, 64);
        assert!((back.sea_level_normalized - 0.45).abs() < 1e-6);
    }
}
