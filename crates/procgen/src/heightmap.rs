//! Heightmap generation and erosion.
//!
//! Heights are produced on a `(W+1)²` vertex grid sampled at world
//! coordinates, generated with an extra [`BORDER`]-cell margin on every
//! side. Erosion and peak shaping run on the extended grid so a chunk edge
//! sees the same neighbourhood a mid-chunk cell would; the border is
//! discarded afterwards. This keeps erosion seamless when chunks are
//! regenerated in isolation.

use crate::fields::FieldSampler;
use crate::noise::SimplexNoise;
use crate::settings::TerrainSettings;
use glam::Vec2;
use rand::prelude::*;
use std::sync::Arc;
use worldcore::{Grid, BORDER};

/// A chunk's vertex heights plus enough context to answer world queries.
#[derive(Debug, Clone)]
pub struct Heightmap {
    grid: Grid<f32>,
    origin_x: f32,
    origin_z: f32,
    cell_size: f32,
}

impl Heightmap {
    pub fn new(vertex_width: usize, origin_x: f32, origin_z: f32, cell_size: f32) -> Self {
        Self {
            grid: Grid::new(vertex_width, vertex_width, 0.0),
            origin_x,
            origin_z,
            cell_size,
        }
    }

    /// Vertices per side (`W + 1`).
    pub fn vertex_width(&self) -> usize {
        self.grid.width()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> (f32, f32) {
        (self.origin_x, self.origin_z)
    }

    /// Height at a vertex; out-of-bounds queries return 0.
    #[inline]
    pub fn height(&self, x: i32, z: i32) -> f32 {
        self.grid.get_or(x, z, 0.0)
    }

    #[inline]
    pub fn set(&mut self, x: i32, z: i32, height: f32) {
        self.grid.set(x, z, height);
    }

    pub fn as_slice(&self) -> &[f32] {
        self.grid.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.grid.as_mut_slice()
    }

    /// Bilinear height at a world position, clamped to the chunk.
    pub fn height_at_world(&self, world_x: f32, world_z: f32) -> f32 {
        let w = self.vertex_width() as i32;
        let gx = (world_x - self.origin_x) / self.cell_size;
        let gz = (world_z - self.origin_z) / self.cell_size;

        let x0 = (gx.floor() as i32).clamp(0, w - 1);
        let z0 = (gz.floor() as i32).clamp(0, w - 1);
        let x1 = (x0 + 1).min(w - 1);
        let z1 = (z0 + 1).min(w - 1);

        let fx = (gx - gx.floor()).clamp(0.0, 1.0);
        let fz = (gz - gz.floor()).clamp(0.0, 1.0);

        let h00 = self.height(x0, z0);
        let h10 = self.height(x1, z0);
        let h01 = self.height(x0, z1);
        let h11 = self.height(x1, z1);

        let h0 = h00 * (1.0 - fx) + h10 * fx;
        let h1 = h01 * (1.0 - fx) + h11 * fx;
        h0 * (1.0 - fz) + h1 * fz
    }
}

/// Generates heightmaps from the configured noise spectrum, with slope and
/// hydraulic erosion plus peak shaping applied on the extended grid.
pub struct HeightmapGenerator {
    settings: TerrainSettings,
    noise: Arc<SimplexNoise>,
    fields: Option<FieldSampler>,
}

// Ridge noise uses a decoupled spectrum: fewer octaves give longer,
// cleaner ridge lines than the base terrain spectrum would.
const RIDGE_OCTAVES: u32 = 3;
const RIDGE_PERSISTENCE: f32 = 0.5;
const RIDGE_LACUNARITY: f32 = 2.0;

const MAX_DROPLET_STEPS: u32 = 64;

impl HeightmapGenerator {
    pub fn new(settings: TerrainSettings, noise: Arc<SimplexNoise>) -> Self {
        Self {
            settings,
            noise,
            fields: None,
        }
    }

    /// Attach a geological field sampler; base heights then combine the
    /// continental / amplitude / uplift fields instead of the inline
    /// uplift-only blend.
    pub fn with_fields(mut self, fields: FieldSampler) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    /// Raw world height before erosion, sampled at world coordinates so a
    /// cell's value is independent of the chunk containing it.
    pub fn sample_raw_height(&self, world_x: f32, world_z: f32) -> f32 {
        let s = &self.settings;
        let noise_x = world_x * s.noise_scale;
        let noise_z = world_z * s.noise_scale;

        // Layer 1: unwarped FBM for micro detail. Warping is applied only
        // to the ridge coordinates for macro features.
        let base_noise = self
            .noise
            .fbm2(noise_x, noise_z, s.octaves, s.persistence, s.lacunarity);

        let ridge_noise = if s.use_ridge_noise {
            let (wx, wz) = self.warp_ridge_coords(noise_x, noise_z);
            let ridge = self.noise.ridge(
                wx * s.ridge_scale,
                wz * s.ridge_scale,
                RIDGE_OCTAVES,
                RIDGE_PERSISTENCE,
                RIDGE_LACUNARITY,
            );
            ridge.powf(s.ridge_power)
        } else {
            0.0
        };

        if let Some(fields) = &self.fields {
            let sampled = fields.sample(world_x, world_z);
            return fields.base_height(&sampled, base_noise, ridge_noise, s, world_x, world_z);
        }

        // Inline path: uplift mask sampled at unwarped world coordinates
        let mut height = base_noise;
        if s.use_ridge_noise {
            let uplift_mask = if s.use_uplift_mask {
                let n = self.noise.fbm2(
                    world_x * s.uplift_scale,
                    world_z * s.uplift_scale,
                    2,
                    0.5,
                    2.0,
                );
                let n = (n + 1.0) * 0.5;
                let t = ((n - s.uplift_threshold_low)
                    / (s.uplift_threshold_high - s.uplift_threshold_low))
                    .clamp(0.0, 1.0);
                let t = t * t * (3.0 - 2.0 * t);
                t.powf(s.uplift_power)
            } else {
                1.0
            };

            let ridge_contribution = ridge_noise * s.ridge_weight * uplift_mask;
            let base_weight = 1.0 - s.ridge_weight * uplift_mask;
            height = base_noise * base_weight + ridge_contribution;
        }

        // Map [-1, 1] to [0, 1]; shaping happens once, after erosion
        let height = (height + 1.0) * 0.5;
        s.base_height + height * s.height_scale
    }

    /// Iteratively displace the ridge sampling coordinates. Each level adds
    /// FBM-driven offsets at decreasing strength; the cumulative warp must
    /// stay small (< 0.25 of noise space) to avoid coordinate folding.
    fn warp_ridge_coords(&self, noise_x: f32, noise_z: f32) -> (f32, f32) {
        let s = &self.settings;
        if !s.use_warp || s.warp_levels == 0 || s.warp_strength <= 0.0 {
            return (noise_x, noise_z);
        }

        let mut wx = noise_x;
        let mut wz = noise_z;

        for level in 0..s.warp_levels {
            let l = level as f32;
            let offset_x = 5.2 + l * 17.1;
            let offset_z = 1.3 + l * 31.7;
            let offset_x2 = 9.7 + l * 23.5;
            let offset_z2 = 2.8 + l * 13.9;

            let strength = s.warp_strength / (1.0 + l * 0.5);
            let scale = s.warp_scale * (1.0 + l * 0.3);

            let dx = self
                .noise
                .fbm2(wx * scale + offset_x, wz * scale + offset_z, 2, 0.5, 2.0)
                * strength;
            let dz = self
                .noise
                .fbm2(wx * scale + offset_x2, wz * scale + offset_z2, 2, 0.5, 2.0)
                * strength;

            wx += dx;
            wz += dz;
        }

        (wx, wz)
    }

    /// Generate the chunk heightmap at a world offset. Hydraulic erosion
    /// runs when the settings enable it.
    pub fn generate(&self, offset_x: f32, offset_z: f32) -> Heightmap {
        self.generate_inner(offset_x, offset_z, true)
    }

    /// Preview variant: hydraulic erosion is always skipped so editor
    /// previews stay interactive.
    pub fn generate_preview(&self, offset_x: f32, offset_z: f32) -> Heightmap {
        self.generate_inner(offset_x, offset_z, false)
    }

    fn generate_inner(&self, offset_x: f32, offset_z: f32, allow_hydraulic: bool) -> Heightmap {
        let s = &self.settings;
        let vertex_width = s.width + 1;
        let ext = vertex_width + 2 * BORDER;

        // Step 1: extended heightmap, border included for erosion context
        let mut extended = vec![0.0f32; ext * ext];
        for z in 0..ext {
            for x in 0..ext {
                let local_x = (x as i32 - BORDER as i32) as f32 * s.cell_size;
                let local_z = (z as i32 - BORDER as i32) as f32 * s.cell_size;
                extended[z * ext + x] =
                    self.sample_raw_height(offset_x + local_x, offset_z + local_z);
            }
        }

        // Step 2: erosion on the extended grid
        if s.use_erosion {
            self.apply_slope_erosion(&mut extended, ext, ext);

            if allow_hydraulic && s.use_hydraulic_erosion && s.erosion_iterations > 0 {
                self.apply_hydraulic_erosion(&mut extended, ext, ext, offset_x, offset_z);
            }
        }

        // Step 3: peak shaping, once, after erosion
        self.apply_peak_shaping(&mut extended, ext, ext);

        // Step 4: trim the border
        let mut heightmap = Heightmap::new(vertex_width, offset_x, offset_z, s.cell_size);
        for z in 0..vertex_width {
            for x in 0..vertex_width {
                let ext_idx = (z + BORDER) * ext + (x + BORDER);
                heightmap.set(x as i32, z as i32, extended[ext_idx]);
            }
        }
        heightmap
    }

    /// Single mass-conserving slope erosion pass: material above the slope
    /// threshold moves to the lowest 4-neighbour, split half and half, so
    /// the height sum is preserved. Valleys (cells below their neighbour
    /// mean) additionally deepen by `valley_depth`.
    pub fn apply_slope_erosion(&self, heights: &mut [f32], width: usize, depth: usize) {
        let s = &self.settings;
        let mut eroded = heights.to_vec();

        for z in 1..depth - 1 {
            for x in 1..width - 1 {
                let idx = z * width + x;
                let h = heights[idx];

                let h_l = heights[idx - 1];
                let h_r = heights[idx + 1];
                let h_u = heights[(z - 1) * width + x];
                let h_d = heights[(z + 1) * width + x];

                let slope_x = (h_r - h_l) / (2.0 * s.cell_size);
                let slope_z = (h_d - h_u) / (2.0 * s.cell_size);
                let slope = (slope_x * slope_x + slope_z * slope_z).sqrt();

                if slope > s.slope_threshold {
                    let amount = s.slope_erosion_strength
                        * ((slope - s.slope_threshold) / s.slope_threshold).min(1.0)
                        * s.height_scale
                        * 0.1;

                    let min_neighbor = h_l.min(h_r).min(h_u).min(h_d);
                    let lowest_idx = if min_neighbor == h_l {
                        idx - 1
                    } else if min_neighbor == h_r {
                        idx + 1
                    } else if min_neighbor == h_u {
                        (z - 1) * width + x
                    } else {
                        (z + 1) * width + x
                    };

                    eroded[idx] -= amount * 0.5;
                    eroded[lowest_idx] += amount * 0.5;
                }

                // Valley deepening: areas lower than their neighbours carve
                // further down. Not mass conserving; scaled by valley_depth.
                let avg_neighbor = (h_l + h_r + h_u + h_d) * 0.25;
                if h < avg_neighbor {
                    let valley_factor = (avg_neighbor - h) / s.height_scale;
                    eroded[idx] -= valley_factor * s.valley_depth * s.height_scale;
                }
            }
        }

        heights.copy_from_slice(&eroded);
    }

    fn sample_height_bilinear(heights: &[f32], width: usize, x: f32, z: f32) -> f32 {
        let x0 = x.floor() as usize;
        let z0 = z.floor() as usize;
        let fx = x - x0 as f32;
        let fz = z - z0 as f32;

        let h00 = heights[z0 * width + x0];
        let h10 = heights[z0 * width + x0 + 1];
        let h01 = heights[(z0 + 1) * width + x0];
        let h11 = heights[(z0 + 1) * width + x0 + 1];

        let h0 = h00 * (1.0 - fx) + h10 * fx;
        let h1 = h01 * (1.0 - fx) + h11 * fx;
        h0 * (1.0 - fz) + h1 * fz
    }

    fn sample_gradient_bilinear(heights: &[f32], width: usize, x: f32, z: f32) -> Vec2 {
        const EPSILON: f32 = 0.5;
        let h_l = Self::sample_height_bilinear(heights, width, x - EPSILON, z);
        let h_r = Self::sample_height_bilinear(heights, width, x + EPSILON, z);
        let h_u = Self::sample_height_bilinear(heights, width, x, z - EPSILON);
        let h_d = Self::sample_height_bilinear(heights, width, x, z + EPSILON);
        Vec2::new((h_r - h_l) / (2.0 * EPSILON), (h_d - h_u) / (2.0 * EPSILON))
    }

    /// Particle-based hydraulic erosion. Droplets spawn at deterministic
    /// positions from the chunk seed, follow the gradient with inertia,
    /// pick up sediment up to capacity and deposit the excess. Bilinear
    /// height and gradient sampling eliminates grid bias.
    pub fn apply_hydraulic_erosion(
        &self,
        heights: &mut [f32],
        width: usize,
        depth: usize,
        offset_x: f32,
        offset_z: f32,
    ) {
        let s = &self.settings;

        let chunk_grid_x = (offset_x / (s.width as f32 * s.cell_size)).floor() as i32;
        let chunk_grid_z = (offset_z / (s.depth as f32 * s.cell_size)).floor() as i32;
        let chunk_seed = worldcore::chunk_seed(
            s.seed,
            worldcore::ChunkCoord::new(chunk_grid_x, chunk_grid_z),
        );
        let mut rng = StdRng::seed_from_u64(chunk_seed as u64);

        let max_x = width as f32 - 3.0;
        let max_z = depth as f32 - 3.0;

        for _ in 0..s.erosion_iterations {
            let mut drop_x = rng.gen_range(2.0..max_x);
            let mut drop_z = rng.gen_range(2.0..max_z);
            let mut dir = Vec2::ZERO;
            let mut speed = 1.0f32;
            let mut water = 1.0f32;
            let mut sediment = 0.0f32;

            for _ in 0..MAX_DROPLET_STEPS {
                if drop_x < 2.0
                    || drop_x >= width as f32 - 2.0
                    || drop_z < 2.0
                    || drop_z >= depth as f32 - 2.0
                {
                    break;
                }

                let h = Self::sample_height_bilinear(heights, width, drop_x, drop_z);
                let grad = Self::sample_gradient_bilinear(heights, width, drop_x, drop_z);

                // Update direction with inertia and renormalise
                dir = dir * s.erosion_inertia - grad * (1.0 - s.erosion_inertia);
                let len = dir.length();
                if len < 1e-4 {
                    break;
                }
                dir /= len;

                let new_x = drop_x + dir.x;
                let new_z = drop_z + dir.y;
                if new_x < 2.0
                    || new_x >= width as f32 - 2.0
                    || new_z < 2.0
                    || new_z >= depth as f32 - 2.0
                {
                    break;
                }

                let new_h = Self::sample_height_bilinear(heights, width, new_x, new_z);
                let delta_h = new_h - h;

                let capacity = (-delta_h).max(0.01) * speed * water * s.erosion_capacity;

                // Erode or deposit at the nearest cell
                let cell_x = drop_x.round() as usize;
                let cell_z = drop_z.round() as usize;
                let idx = cell_z * width + cell_x;

                if sediment > capacity || delta_h > 0.0 {
                    let deposit = if delta_h > 0.0 {
                        delta_h.min(sediment)
                    } else {
                        (sediment - capacity) * s.erosion_deposition
                    };
                    sediment -= deposit;
                    heights[idx] += deposit;
                } else {
                    let erode = ((capacity - sediment) * 0.3).min(-delta_h);
                    sediment += erode;
                    heights[idx] -= erode;
                }

                drop_x = new_x;
                drop_z = new_z;
                speed = (speed * speed + delta_h).max(0.0).sqrt();
                water *= 1.0 - s.erosion_evaporation;

                if water < 0.01 {
                    break;
                }
            }
        }
    }

    /// Soft bases, sharp peaks: scale elevation down linearly with
    /// normalised height, then add a quartic boost at the summits.
    pub fn apply_peak_shaping(&self, heights: &mut [f32], width: usize, depth: usize) {
        let s = &self.settings;
        let min_h = s.base_height;
        let range = s.height_scale;
        if range <= 0.0 {
            return;
        }

        for z in 0..depth {
            for x in 0..width {
                let idx = z * width + x;
                let h = heights[idx];

                let height_norm = ((h - min_h) / range).clamp(0.0, 1.0);

                let shape_factor = 1.0 - 0.4 * height_norm;
                let mut shaped = min_h + (h - min_h) * shape_factor;
                shaped += height_norm.powi(4) * s.peak_boost * range;

                heights[idx] = shaped;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::TerrainIntent;
    use crate::settings::IntentMapper;

    fn generator(seed: u32) -> HeightmapGenerator {
        let mut settings = IntentMapper::derive_settings(&TerrainIntent::default());
        settings.width = 32;
        settings.depth = 32;
        settings.cell_size = 1.0;
        settings.seed = seed;
        HeightmapGenerator::new(settings, Arc::new(SimplexNoise::new(seed)))
    }

    /// Two independent runs of the same chunk are byte-identical.
    #[test]
    fn heightmap_deterministic() {
        let g = generator(42);
        let a = g.generate(64.0, -32.0);
        let b = g.generate(64.0, -32.0);
        assert_eq!(a.as_slice(), b.as_slice());
    }

    /// The height at a shared chunk edge is identical whichever chunk
    /// computes it, thanks to world-space sampling plus the erosion border.
    /// Hydraulic erosion is per-chunk randomness and stays off here.
    #[test]
    fn heightmap_chunk_independent_at_shared_edge() {
        let mut settings = IntentMapper::derive_settings(&TerrainIntent::default());
        settings.width = 32;
        settings.depth = 32;
        settings.cell_size = 1.0;
        settings.seed = 9;
        settings.use_hydraulic_erosion = false;
        let g = HeightmapGenerator::new(settings.clone(), Arc::new(SimplexNoise::new(9)));

        let span = settings.width as f32 * settings.cell_size;
        let left = g.generate(0.0, 0.0);
        let right = g.generate(span, 0.0);

        let w = settings.width as i32;
        for z in 0..=w {
            assert_eq!(
                left.height(w, z),
                right.height(0, z),
                "seam at z = {z}"
            );
        }
    }

    /// With valley deepening disabled, slope erosion preserves total mass.
    #[test]
    fn slope_erosion_conserves_mass() {
        let mut g = generator(7);
        g.settings.valley_depth = 0.0;
        let mut heights: Vec<f32> = (0..64 * 64)
            .map(|i| ((i % 64) as f32 * 0.37).sin() * 5.0 + ((i / 64) as f32 * 0.21).cos() * 3.0)
            .collect();
        let before: f64 = heights.iter().map(|&h| h as f64).sum();
        g.apply_slope_erosion(&mut heights, 64, 64);
        let after: f64 = heights.iter().map(|&h| h as f64).sum();

        let tolerance = 1e-3 * g.settings.height_scale as f64 * (64.0 * 64.0);
        assert!(
            (before - after).abs() < tolerance,
            "mass drifted: {before} -> {after}"
        );
    }

    /// The preview path must never run hydraulic erosion, so a generator
    /// with droplets enabled still previews deterministically equal to a
    /// generator without them.
    #[test]
    fn preview_skips_hydraulic_erosion() {
        let mut with = generator(3);
        with.settings.use_hydraulic_erosion = true;
        let mut without = generator(3);
        without.settings.use_hydraulic_erosion = false;

        let a = with.generate_preview(0.0, 0.0);
        let b = without.generate(0.0, 0.0);
        assert_eq!(a.as_slice(), b.as_slice());
    }

    /// Bilinear world queries interpolate between vertex heights.
    #[test]
    fn world_query_interpolates() {
        let mut hm = Heightmap::new(3, 0.0, 0.0, 1.0);
        hm.set(0, 0, 0.0);
        hm.set(1, 0, 2.0);
        hm.set(0, 1, 0.0);
        hm.set(1, 1, 2.0);
        let mid = hm.height_at_world(0.5, 0.5);
        assert!((mid - 1.0).abs() < 1e-5);
    }
}
