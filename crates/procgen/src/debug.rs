//! Debug colormap textures for pipeline fields.
//!
//! Each view renders one per-cell field into an RGBA8 texture
//! (`width * height * 4` bytes) that the renderer collaborator can upload
//! directly. Views exist for heights, flow accumulation, water types,
//! moisture, temperature, rain shadow, and blended biome / material
//! colours.

use crate::biome::BiomeClassifier;
use crate::climate::ClimateData;
use crate::heightmap::Heightmap;
use crate::hydrology::HydrologyData;
use crate::material::MaterialBlender;
use crate::rivers::WaterType;
use glam::Vec3;

/// RGBA pixel.
#[derive(Debug, Clone, Copy)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: (r.clamp(0.0, 1.0) * 255.0) as u8,
            g: (g.clamp(0.0, 1.0) * 255.0) as u8,
            b: (b.clamp(0.0, 1.0) * 255.0) as u8,
            a: 255,
        }
    }

    pub fn from_vec3(v: Vec3) -> Self {
        Self::from_rgb(v.x, v.y, v.z)
    }
}

/// A debug texture ready for upload.
#[derive(Debug, Clone)]
pub struct DebugTexture {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Pixel>,
}

impl DebugTexture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::from_rgb(0.0, 0.0, 0.0); (width * height) as usize],
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = pixel;
        }
    }

    /// Raw RGBA bytes, row-major, `width * height * 4` long.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            bytes.extend_from_slice(&[p.r, p.g, p.b, p.a]);
        }
        bytes
    }

    /// Build a cells × cells texture from a per-cell colour function.
    fn from_cells(cells: usize, mut color: impl FnMut(i32, i32) -> Pixel) -> Self {
        let mut tex = Self::new(cells as u32, cells as u32);
        for z in 0..cells as u32 {
            for x in 0..cells as u32 {
                tex.set_pixel(x, z, color(x as i32, z as i32));
            }
        }
        tex
    }
}

#[inline]
fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Grayscale heights normalized to the global `[base, base + scale]` range.
pub fn height_view(heightmap: &Heightmap, cells: usize, base: f32, scale: f32) -> DebugTexture {
    let range = if scale > 0.0 { scale } else { 1.0 };
    DebugTexture::from_cells(cells, |x, z| {
        let t = (heightmap.height(x, z) - base) / range;
        Pixel::from_rgb(t, t, t)
    })
}

/// Log-scaled blue ramp over flow accumulation, so single-cell flow stays
/// visible next to thousand-cell rivers.
pub fn flow_accumulation_view(hydrology: &HydrologyData) -> DebugTexture {
    let cells = hydrology.cells();
    let max_accum = hydrology
        .flow_accumulation
        .as_slice()
        .iter()
        .copied()
        .max()
        .unwrap_or(1)
        .max(1) as f32;
    let log_max = max_accum.ln_1p();

    DebugTexture::from_cells(cells, |x, z| {
        let accum = hydrology.flow_accumulation.get_or(x, z, 0) as f32;
        let t = accum.ln_1p() / log_max;
        let color = mix(Vec3::new(0.05, 0.05, 0.1), Vec3::new(0.2, 0.6, 1.0), t);
        Pixel::from_vec3(color)
    })
}

/// Fixed palette per water type.
pub fn water_type_view(hydrology: &HydrologyData) -> DebugTexture {
    let cells = hydrology.cells();
    DebugTexture::from_cells(cells, |x, z| {
        let color = match hydrology.water_type.get_or(x, z, WaterType::None) {
            WaterType::None => Vec3::new(0.25, 0.2, 0.15),
            WaterType::Stream => Vec3::new(0.4, 0.7, 0.9),
            WaterType::River => Vec3::new(0.15, 0.45, 0.85),
            WaterType::Lake => Vec3::new(0.1, 0.6, 0.6),
            WaterType::Ocean => Vec3::new(0.05, 0.15, 0.5),
        };
        Pixel::from_vec3(color)
    })
}

/// Moisture as a dry-tan to deep-blue ramp.
pub fn moisture_view(hydrology: &HydrologyData) -> DebugTexture {
    let cells = hydrology.cells();
    DebugTexture::from_cells(cells, |x, z| {
        let m = hydrology.moisture.get_or(x, z, 0.0);
        Pixel::from_vec3(mix(Vec3::new(0.8, 0.7, 0.4), Vec3::new(0.1, 0.3, 0.9), m))
    })
}

/// Temperature as a diverging blue/white/red ramp over `[-1, 1]`.
pub fn temperature_view(climate: &ClimateData) -> DebugTexture {
    let cells = climate.cells();
    DebugTexture::from_cells(cells, |x, z| {
        let t = climate.temperature.get_or(x, z, 0.0);
        let color = if t < 0.0 {
            mix(Vec3::ONE, Vec3::new(0.1, 0.2, 0.9), -t)
        } else {
            mix(Vec3::ONE, Vec3::new(0.9, 0.15, 0.1), t)
        };
        Pixel::from_vec3(color)
    })
}

/// Rain shadow intensity as grayscale.
pub fn rain_shadow_view(climate: &ClimateData) -> DebugTexture {
    let cells = climate.cells();
    DebugTexture::from_cells(cells, |x, z| {
        let s = climate.rain_shadow.get_or(x, z, 0.0);
        Pixel::from_rgb(s, s, s)
    })
}

/// Weight-blended biome colours.
pub fn biome_view(biomes: &BiomeClassifier) -> DebugTexture {
    let cells = biomes.data().cells();
    DebugTexture::from_cells(cells, |x, z| {
        Pixel::from_vec3(biomes.weights_at(x, z).blended_color())
    })
}

/// Weight-blended material colours.
pub fn material_view(materials: &MaterialBlender) -> DebugTexture {
    let cells = materials.data().cells();
    DebugTexture::from_cells(cells, |x, z| {
        Pixel::from_vec3(materials.weights_at(x, z).blended_color())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Texture byte layout is width * height * 4, row major.
    #[test]
    fn texture_byte_layout() {
        let mut tex = DebugTexture::new(4, 3);
        tex.set_pixel(1, 2, Pixel::from_rgb(1.0, 0.0, 0.0));
        let bytes = tex.to_bytes();
        assert_eq!(bytes.len(), 4 * 3 * 4);
        let idx = (2 * 4 + 1) * 4;
        assert_eq!(&bytes[idx..idx + 4], &[255, 0, 0, 255]);
    }

    /// Height view spans black to white across the global range.
    #[test]
    fn height_view_normalizes() {
        let cells = 4;
        let mut hm = Heightmap::new(cells + 1, 0.0, 0.0, 1.0);
        for z in 0..=cells as i32 {
            for x in 0..=cells as i32 {
                hm.set(x, z, x as f32 * 10.0 / cells as f32);
            }
        }
        let tex = height_view(&hm, cells, 0.0, 10.0);
        let bytes = tex.to_bytes();
        assert_eq!(bytes[0], 0);
        // Last cell in the first row sits at 3/4 of the range
        let last = (cells - 1) * 4;
        assert!(bytes[last] > 180);
    }
}
