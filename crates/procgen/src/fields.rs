//! Geological field sampling.
//!
//! Terrain is generated as continuous overlapping geological fields, not
//! discrete biomes. Every feature emerges from the interaction of five
//! orthogonal fields sampled at world coordinates:
//!
//!   1. Continental field  - land vs ocean, macro topology
//!   2. Elevation field    - local height amplitude
//!   3. Uplift field       - where mountains can exist
//!   4. Ridge field        - mountain shape (computed by the heightmap
//!                           stage at warped coordinates)
//!   5. Erosion field      - terrain age

use crate::intent::TerrainIntent;
use crate::noise::SimplexNoise;
use crate::settings::TerrainSettings;
use std::sync::Arc;

/// Field values sampled at one world position.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeologicalFields {
    /// Continental field mapped to `[0, 1]`; below the ocean threshold
    /// denotes ocean.
    pub continental: f32,
    /// Local height amplitude in `[0.3, 1.0]`, damped over ocean.
    pub elevation_amplitude: f32,
    /// Mountain eligibility in `[0, 1]`; zero in ocean.
    pub uplift_mask: f32,
    /// Mountain shape detail. Placeholder here; the heightmap stage
    /// computes the real ridge contribution at warped coordinates.
    pub ridge_value: f32,
    /// Local terrain maturity in `[0, 1]`.
    pub erosion_age: f32,
    /// Smoothstepped coast blend: 1 = fully ocean, 0 = fully land.
    pub ocean_mask: f32,
}

/// Settings for field sampling, derived from intent.
#[derive(Debug, Clone)]
pub struct FieldSettings {
    pub continental_frequency: f32,
    pub continental_octaves: u32,
    pub ocean_threshold: f32,
    pub coastline_blend: f32,

    pub ocean_depth_min: f32,
    pub ocean_depth_max: f32,
    pub ocean_floor_variation: f32,

    pub elevation_field_frequency: f32,
    pub elevation_field_octaves: u32,

    pub uplift_frequency: f32,
    pub uplift_threshold_low: f32,
    pub uplift_threshold_high: f32,

    pub erosion_field_frequency: f32,
    pub erosion_age_base: f32,
    pub erosion_age_variation: f32,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            continental_frequency: 0.0003,
            continental_octaves: 2,
            ocean_threshold: 0.45,
            coastline_blend: 0.05,
            ocean_depth_min: 30.0,
            ocean_depth_max: 80.0,
            ocean_floor_variation: 0.3,
            elevation_field_frequency: 0.0008,
            elevation_field_octaves: 2,
            uplift_frequency: 0.003,
            uplift_threshold_low: 0.4,
            uplift_threshold_high: 0.7,
            erosion_field_frequency: 0.0005,
            erosion_age_base: 0.5,
            erosion_age_variation: 0.3,
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

#[inline]
pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Samples the orthogonal geological fields at world positions.
pub struct FieldSampler {
    settings: FieldSettings,
    elevation_range: f32,
    noise: Arc<SimplexNoise>,
}

impl FieldSampler {
    /// Build a sampler from intent, deriving all field settings.
    pub fn from_intent(intent: &TerrainIntent, noise: Arc<SimplexNoise>) -> Self {
        let settings = FieldSettings {
            // 0.0006 (small islands) to 0.00015 (massive continents)
            continental_frequency: lerp(0.0006, 0.00015, intent.continental_scale),
            continental_octaves: 2,
            ocean_threshold: lerp(0.48, 0.42, intent.continental_scale),
            coastline_blend: lerp(0.03, 0.08, intent.chaos),
            ocean_depth_min: lerp(20.0, 40.0, intent.elevation_range),
            ocean_depth_max: lerp(40.0, 80.0, intent.elevation_range),
            ocean_floor_variation: lerp(0.2, 0.4, intent.ruggedness),
            elevation_field_frequency: lerp(0.001, 0.0004, intent.continental_scale),
            elevation_field_octaves: 2,
            // Scaled with the continental frequency but at higher detail
            uplift_frequency: lerp(0.0006, 0.00015, intent.continental_scale) * 10.0,
            uplift_threshold_low: lerp(0.25, 0.45, 1.0 - intent.mountain_coverage),
            uplift_threshold_high: lerp(0.25, 0.45, 1.0 - intent.mountain_coverage) + 0.25,
            erosion_field_frequency: lerp(0.0008, 0.0003, intent.continental_scale),
            erosion_age_base: intent.erosion_age,
            erosion_age_variation: lerp(0.15, 0.4, intent.chaos),
        };
        Self {
            settings,
            elevation_range: intent.elevation_range,
            noise,
        }
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    /// Sample all five fields plus the derived ocean mask.
    pub fn sample(&self, world_x: f32, world_z: f32) -> GeologicalFields {
        let s = &self.settings;
        let mut fields = GeologicalFields::default();

        // Layer 1: continental field. Low-frequency FBM decides macro
        // topology; mapped to [0, 1] for threshold comparison.
        let continental = self.noise.fbm2(
            world_x * s.continental_frequency,
            world_z * s.continental_frequency,
            s.continental_octaves,
            0.5,
            2.0,
        );
        fields.continental = (continental + 1.0) * 0.5;
        fields.ocean_mask = self.ocean_mask(fields.continental);

        // Layer 2: elevation amplitude, offset to decorrelate from the
        // continental field. Mapped to [0.3, 1.0] - never fully flat.
        let elev = self.noise.fbm2(
            world_x * s.elevation_field_frequency + 100.0,
            world_z * s.elevation_field_frequency + 200.0,
            s.elevation_field_octaves,
            0.5,
            2.0,
        );
        fields.elevation_amplitude = 0.3 + 0.7 * ((elev + 1.0) * 0.5);
        // Ocean floors are relatively flat
        fields.elevation_amplitude *= 1.0 - fields.ocean_mask * 0.6;

        // Layer 3: uplift mask (mountain eligibility)
        let uplift = self.noise.fbm2(
            world_x * s.uplift_frequency + 500.0,
            world_z * s.uplift_frequency + 700.0,
            2,
            0.5,
            2.0,
        );
        let uplift = (uplift + 1.0) * 0.5;
        let t = ((uplift - s.uplift_threshold_low)
            / (s.uplift_threshold_high - s.uplift_threshold_low))
            .clamp(0.0, 1.0);
        fields.uplift_mask = t * t * (3.0 - 2.0 * t);
        // Mountains don't exist in deep ocean
        fields.uplift_mask *= 1.0 - fields.ocean_mask;

        // Layer 4: ridge value is filled in by the heightmap stage, which
        // owns the warped coordinates and mechanical ridge settings.
        fields.ridge_value = 0.0;

        // Layer 5: erosion age with spatial variation
        let erosion = self.noise.fbm2(
            world_x * s.erosion_field_frequency + 300.0,
            world_z * s.erosion_field_frequency + 400.0,
            2,
            0.5,
            2.0,
        );
        fields.erosion_age =
            (s.erosion_age_base + erosion * s.erosion_age_variation).clamp(0.0, 1.0);

        fields
    }

    /// Continental field only, for ocean checks without a full sample.
    pub fn continental(&self, world_x: f32, world_z: f32) -> f32 {
        let s = &self.settings;
        let n = self.noise.fbm2(
            world_x * s.continental_frequency,
            world_z * s.continental_frequency,
            s.continental_octaves,
            0.5,
            2.0,
        );
        (n + 1.0) * 0.5
    }

    /// Coast blend from a continental value: 1 below `threshold - blend`,
    /// 0 above `threshold + blend`, smoothstepped in between.
    pub fn ocean_mask(&self, continental: f32) -> f32 {
        let s = &self.settings;
        smoothstep(
            s.ocean_threshold + s.coastline_blend,
            s.ocean_threshold - s.coastline_blend,
            continental,
        )
    }

    /// Depth below sea level at a position; zero over land. Shallow near
    /// the coast, deep in open ocean (squared mask), with floor variation.
    pub fn ocean_depth(&self, world_x: f32, world_z: f32, ocean_mask: f32) -> f32 {
        if ocean_mask <= 0.0 {
            return 0.0;
        }
        let s = &self.settings;
        let mut depth = lerp(s.ocean_depth_min, s.ocean_depth_max, self.elevation_range);

        if s.ocean_floor_variation > 0.0 {
            let freq = s.continental_frequency * 5.0;
            let variation = self.noise.fbm2(
                world_x * freq + 800.0,
                world_z * freq + 900.0,
                2,
                0.5,
                2.0,
            );
            depth += variation * depth * s.ocean_floor_variation;
        }

        depth * ocean_mask * ocean_mask
    }

    /// Combine sampled fields with base and ridge noise into a world height.
    pub fn base_height(
        &self,
        fields: &GeologicalFields,
        base_noise: f32,
        ridge_noise: f32,
        settings: &TerrainSettings,
        world_x: f32,
        world_z: f32,
    ) -> f32 {
        let mut height = base_noise * fields.elevation_amplitude;

        if settings.use_ridge_noise && fields.uplift_mask > 0.0 {
            let ridge_contribution = ridge_noise * settings.ridge_weight * fields.uplift_mask;
            let base_weight = 1.0 - settings.ridge_weight * fields.uplift_mask;
            height = base_noise * base_weight * fields.elevation_amplitude + ridge_contribution;
        }

        // Map [-1, 1] to [0, 1] and scale into world units
        let height = (height + 1.0) * 0.5;
        let mut world_height = settings.base_height + height * settings.height_scale;

        // Ocean areas are pushed down below sea level
        if fields.ocean_mask > 0.0 {
            world_height -= self.ocean_depth(world_x, world_z, fields.ocean_mask);
        }

        world_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::TerrainIntent;

    fn sampler() -> FieldSampler {
        FieldSampler::from_intent(&TerrainIntent::default(), Arc::new(SimplexNoise::new(42)))
    }

    /// All field outputs stay in their documented ranges.
    #[test]
    fn sampled_fields_in_range() {
        let s = sampler();
        for i in 0..100 {
            let x = i as f32 * 37.7 - 1000.0;
            let z = i as f32 * -19.3 + 450.0;
            let f = s.sample(x, z);
            assert!((0.0..=1.0).contains(&f.continental));
            assert!((0.0..=1.0).contains(&f.ocean_mask));
            assert!((0.0..=1.0).contains(&f.uplift_mask));
            assert!((0.0..=1.0).contains(&f.erosion_age));
            assert!(f.elevation_amplitude >= 0.0 && f.elevation_amplitude <= 1.0);
        }
    }

    /// Deep-ocean continental values give a full mask, solid land zero.
    #[test]
    fn ocean_mask_endpoints() {
        let s = sampler();
        assert_eq!(s.ocean_mask(0.0), 1.0);
        assert_eq!(s.ocean_mask(1.0), 0.0);
    }

    /// Ocean depth is zero on land and positive under a full mask.
    #[test]
    fn ocean_depth_respects_mask() {
        let s = sampler();
        assert_eq!(s.ocean_depth(0.0, 0.0, 0.0), 0.0);
        assert!(s.ocean_depth(10.0, 20.0, 1.0) > 0.0);
    }
}
