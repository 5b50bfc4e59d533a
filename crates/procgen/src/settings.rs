//! Mechanical terrain settings and the intent mapper.

use crate::intent::TerrainIntent;
use serde::{Deserialize, Serialize};

/// The full mechanical parameter set consumed by the generators.
/// Derived from [`TerrainIntent`]; immutable for the duration of a
/// generation pass. Intent never touches noise directly; noise is sampled
/// only through these settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainSettings {
    // Grid dimensions
    pub width: usize,
    pub depth: usize,
    pub cell_size: f32,

    // Height settings
    pub height_scale: f32,
    pub base_height: f32,

    // Noise settings
    pub seed: u32,
    pub noise_scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,

    // Domain warping (applied to ridge coordinates only)
    pub use_warp: bool,
    pub warp_strength: f32,
    pub warp_scale: f32,
    pub warp_levels: u32,

    // Ridge noise for mountain ranges
    pub use_ridge_noise: bool,
    pub ridge_weight: f32,
    pub ridge_power: f32,
    pub ridge_scale: f32,
    pub peak_boost: f32,

    // Tectonic uplift mask
    pub use_uplift_mask: bool,
    pub uplift_scale: f32,
    pub uplift_threshold_low: f32,
    pub uplift_threshold_high: f32,
    pub uplift_power: f32,

    // Continental field
    pub use_continental_field: bool,
    pub continental_frequency: f32,
    pub ocean_threshold: f32,
    pub coastline_blend: f32,
    pub ocean_depth: f32,
    pub ocean_floor_variation: f32,

    // Slope erosion
    pub use_erosion: bool,
    pub slope_erosion_strength: f32,
    pub slope_threshold: f32,
    pub valley_depth: f32,

    // Hydraulic erosion (particle-based; chunks only, never the preview)
    pub use_hydraulic_erosion: bool,
    pub erosion_iterations: u32,
    pub erosion_inertia: f32,
    pub erosion_capacity: f32,
    pub erosion_deposition: f32,
    pub erosion_evaporation: f32,

    // Shading / colouring
    pub flat_shading: bool,
    pub use_height_colors: bool,
    pub water_level: f32,
    pub sand_level: f32,
    pub grass_level: f32,
    pub rock_level: f32,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            width: 64,
            depth: 64,
            cell_size: 1.0,
            height_scale: 10.0,
            base_height: 0.0,
            seed: 12345,
            noise_scale: 0.05,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            use_warp: true,
            warp_strength: 0.5,
            warp_scale: 0.5,
            warp_levels: 2,
            use_ridge_noise: true,
            ridge_weight: 0.7,
            ridge_power: 2.0,
            ridge_scale: 1.0,
            peak_boost: 0.3,
            use_uplift_mask: true,
            uplift_scale: 0.02,
            uplift_threshold_low: 0.4,
            uplift_threshold_high: 0.7,
            uplift_power: 1.5,
            use_continental_field: false,
            continental_frequency: 0.0003,
            ocean_threshold: 0.45,
            coastline_blend: 0.05,
            ocean_depth: 50.0,
            ocean_floor_variation: 0.3,
            use_erosion: true,
            slope_erosion_strength: 0.15,
            slope_threshold: 0.5,
            valley_depth: 0.3,
            use_hydraulic_erosion: false,
            erosion_iterations: 100,
            erosion_inertia: 0.05,
            erosion_capacity: 4.0,
            erosion_deposition: 0.3,
            erosion_evaporation: 0.02,
            flat_shading: true,
            use_height_colors: true,
            water_level: 0.2,
            sand_level: 0.25,
            grass_level: 0.6,
            rock_level: 0.8,
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

#[inline]
fn saturate(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Derives mechanical [`TerrainSettings`] from a [`TerrainIntent`].
///
/// This mapping is what keeps generated configurations physically valid:
/// parameters maintain their relationships, and invariants are enforced
/// after derivation so sliders cannot reach unstable states.
pub struct IntentMapper;

impl IntentMapper {
    pub fn derive_settings(intent: &TerrainIntent) -> TerrainSettings {
        let mut settings = TerrainSettings::default();

        Self::derive_world_scale(intent, &mut settings);
        Self::derive_continental_field(intent, &mut settings);
        Self::derive_noise_spectrum(intent, &mut settings);
        Self::derive_mountains(intent, &mut settings);
        Self::derive_tectonic_uplift(intent, &mut settings);
        Self::derive_domain_warping(intent, &mut settings);
        Self::derive_erosion(intent, &mut settings);
        Self::enforce_invariants(&mut settings);

        settings
    }

    fn derive_world_scale(intent: &TerrainIntent, settings: &mut TerrainSettings) {
        // Larger continental scale = bigger landmasses = lower noise frequency
        settings.noise_scale = lerp(0.02, 0.0015, intent.continental_scale);

        // Elevation range: flat (6 units) to extreme (40 units)
        settings.height_scale = lerp(6.0, 40.0, intent.elevation_range);

        // Amplitude is handled by height_scale; keep the offset neutral
        settings.base_height = 0.0;
    }

    fn derive_continental_field(intent: &TerrainIntent, settings: &mut TerrainSettings) {
        settings.use_continental_field = true;

        // Range: 0.0006 (small archipelagos) to 0.00015 (massive continents)
        settings.continental_frequency = lerp(0.0006, 0.00015, intent.continental_scale);

        // Larger landmasses get a slightly lower threshold (more land area)
        settings.ocean_threshold = lerp(0.48, 0.42, intent.continental_scale);

        // More chaos = rougher, more irregular coastlines
        settings.coastline_blend = lerp(0.03, 0.08, intent.chaos);

        // Shallow seas (30) through deep oceans (80)
        settings.ocean_depth = lerp(30.0, 80.0, intent.elevation_range);
        settings.ocean_floor_variation = lerp(0.2, 0.4, intent.ruggedness);
    }

    fn derive_noise_spectrum(intent: &TerrainIntent, settings: &mut TerrainSettings) {
        // Ruggedness controls the spectrum. Stability constraint:
        // persistence * lacunarity < 1.0, otherwise amplitude grows per
        // octave. With lacunarity in [1.8, 2.4] the safe persistence max
        // is ~0.42.
        settings.octaves = lerp(3.0, 6.0, intent.ruggedness) as u32;
        settings.persistence = lerp(0.35, 0.42, intent.ruggedness);
        settings.lacunarity = lerp(1.8, 2.4, intent.ruggedness);
    }

    fn derive_mountains(intent: &TerrainIntent, settings: &mut TerrainSettings) {
        // Small epsilon below 0.05 avoids float edge cases at the boundary
        settings.use_ridge_noise = intent.mountain_coverage > 0.04;

        settings.ridge_weight = saturate(intent.mountain_coverage);

        // Rounded mountains (1.4) through jagged peaks (3.8)
        settings.ridge_power = lerp(1.4, 3.8, intent.mountain_sharpness);

        // Kept small to prevent spikes
        settings.peak_boost = intent.mountain_sharpness * 0.4;

        settings.ridge_scale = lerp(0.6, 1.5, intent.continental_scale);
    }

    fn derive_tectonic_uplift(intent: &TerrainIntent, settings: &mut TerrainSettings) {
        settings.use_uplift_mask = true;

        settings.uplift_scale = lerp(0.015, 0.003, intent.continental_scale);

        // Lower coverage = higher threshold = more area stays plains
        settings.uplift_threshold_low = lerp(0.25, 0.45, 1.0 - intent.mountain_coverage);
        settings.uplift_threshold_high = settings.uplift_threshold_low + 0.25;

        settings.uplift_power = lerp(0.9, 2.5, intent.mountain_sharpness);
    }

    fn derive_domain_warping(intent: &TerrainIntent, settings: &mut TerrainSettings) {
        settings.use_warp = true;

        // Multi-level warping compounds; cumulative warp must stay below
        // ~0.25 of noise space to avoid coordinate folding artifacts.
        settings.warp_strength = lerp(0.03, 0.15, intent.chaos);
        settings.warp_scale = lerp(0.3, 0.6, intent.chaos);
        settings.warp_levels = lerp(1.0, 2.0, intent.chaos) as u32;
    }

    fn derive_erosion(intent: &TerrainIntent, settings: &mut TerrainSettings) {
        settings.use_erosion = true;

        // Young terrain has strong slopes; old terrain is weathered
        settings.slope_erosion_strength = lerp(0.9, 0.15, intent.erosion_age);
        settings.slope_threshold = lerp(0.25, 1.2, intent.erosion_age);
        settings.valley_depth = lerp(0.15, 0.6, intent.river_strength);

        // Hydraulic erosion needs time to develop
        settings.use_hydraulic_erosion = intent.erosion_age > 0.3;
        settings.erosion_iterations = lerp(80.0, 300.0, intent.erosion_age) as u32;
        settings.erosion_capacity = lerp(3.0, 8.0, intent.river_strength);
        settings.erosion_deposition = lerp(0.3, 0.7, intent.erosion_age);
        settings.erosion_evaporation = lerp(0.02, 0.005, intent.erosion_age);
        settings.erosion_inertia = lerp(0.03, 0.08, intent.erosion_age);
    }

    /// Enforce parameter invariants after derivation. Invariants only
    /// restrict, never expand.
    pub fn enforce_invariants(settings: &mut TerrainSettings) {
        settings.uplift_threshold_high = settings
            .uplift_threshold_high
            .max(settings.uplift_threshold_low + 0.1);

        // persistence * lacunarity >= 1 makes octave amplitudes grow
        let max_safe_persistence = 0.9 / settings.lacunarity;
        if settings.persistence > max_safe_persistence {
            log::warn!(
                "noise stability violation: persistence {} clamped to {} (lacunarity {})",
                settings.persistence,
                max_safe_persistence,
                settings.lacunarity
            );
            settings.persistence = max_safe_persistence;
        }

        settings.warp_levels = settings.warp_levels.clamp(1, 4);
        settings.erosion_iterations = settings.erosion_iterations.clamp(10, 500);

        settings.ridge_weight = saturate(settings.ridge_weight);
        settings.peak_boost = saturate(settings.peak_boost);
        settings.slope_erosion_strength = saturate(settings.slope_erosion_strength);
        settings.valley_depth = saturate(settings.valley_depth);
        settings.erosion_deposition = saturate(settings.erosion_deposition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{find_preset, PRESETS};

    fn assert_close(a: f32, b: f32, what: &str) {
        assert!((a - b).abs() < 1e-5, "{what}: {a} vs {b}");
    }

    /// Flat Plains derivation against hand-computed values.
    #[test]
    fn flat_plains_derivation_matches_literals() {
        let preset = find_preset("Flat Plains").unwrap();
        let s = IntentMapper::derive_settings(&preset.intent);

        assert_close(s.noise_scale, 0.0052, "noise_scale");
        assert_close(s.height_scale, 11.1, "height_scale");
        assert_eq!(s.octaves, 3);
        assert_close(s.persistence, 0.364, "persistence");
        assert_close(s.lacunarity, 1.92, "lacunarity");
        assert!(!s.use_ridge_noise, "coverage 0.02 stays below epsilon");
        assert_close(s.ridge_power, 1.88, "ridge_power");
        assert_close(s.peak_boost, 0.08, "peak_boost");
        assert_close(s.uplift_threshold_low, 0.446, "uplift_threshold_low");
        assert_close(s.uplift_threshold_high, 0.696, "uplift_threshold_high");
        assert_close(s.warp_strength, 0.048, "warp_strength");
        assert_eq!(s.warp_levels, 1);
        assert_close(s.slope_erosion_strength, 0.3, "slope_erosion_strength");
        assert_close(s.slope_threshold, 1.01, "slope_threshold");
        assert_close(s.valley_depth, 0.285, "valley_depth");
        assert!(s.use_hydraulic_erosion);
        assert_eq!(s.erosion_iterations, 256);
    }

    /// Every constraint of the mapper holds for every preset.
    #[test]
    fn presets_satisfy_all_invariants() {
        for preset in &PRESETS {
            let s = IntentMapper::derive_settings(&preset.intent);
            assert!(
                s.uplift_threshold_high >= s.uplift_threshold_low + 0.1 - 1e-6,
                "{}: uplift thresholds",
                preset.name
            );
            assert!(
                s.persistence * s.lacunarity < 1.0,
                "{}: noise spectrum unstable",
                preset.name
            );
            assert!((1..=4).contains(&s.warp_levels), "{}: warp levels", preset.name);
            assert!(
                (10..=500).contains(&s.erosion_iterations),
                "{}: erosion iterations",
                preset.name
            );
            for (name, v) in [
                ("ridge_weight", s.ridge_weight),
                ("peak_boost", s.peak_boost),
                ("slope_erosion_strength", s.slope_erosion_strength),
                ("valley_depth", s.valley_depth),
                ("erosion_deposition", s.erosion_deposition),
            ] {
                assert!((0.0..=1.0).contains(&v), "{}: {name} = {v}", preset.name);
            }
        }
    }

    /// Saturation holds for a sweep of extreme intents, not just presets.
    #[test]
    fn derivation_saturates_for_extreme_intents() {
        for i in 0..64 {
            let t = |k: u32| ((i >> k) & 1) as f32;
            let intent = TerrainIntent {
                continental_scale: t(0),
                elevation_range: t(1),
                mountain_coverage: t(2),
                mountain_sharpness: t(3),
                ruggedness: t(4),
                erosion_age: t(5),
                river_strength: 0.5,
                chaos: 0.5,
            };
            let s = IntentMapper::derive_settings(&intent);
            assert!(s.persistence * s.lacunarity < 1.0);
            assert!(s.uplift_threshold_high >= s.uplift_threshold_low + 0.1 - 1e-6);
        }
    }

    /// Deriving settings from a serialised-and-restored intent yields the
    /// same settings as the original.
    #[test]
    fn settings_stable_through_intent_roundtrip() {
        for preset in &PRESETS {
            let text = ron::to_string(&preset.intent).unwrap();
            let back: TerrainIntent = ron::from_str(&text).unwrap();
            assert_eq!(
                IntentMapper::derive_settings(&preset.intent),
                IntentMapper::derive_settings(&back),
                "{} settings drifted through serde",
                preset.name
            );
        }
    }
}
