//! Per-frame uniform contracts for the renderer collaborator.
//!
//! The core never touches the GPU; it hands these `Pod` blocks to the
//! renderer, which uploads them into a uniform buffer. Layout follows
//! std140-friendly 16-byte alignment.

use bytemuck::{Pod, Zeroable};

/// Maximum point lights in the frame uniform block.
pub const MAX_POINT_LIGHTS: usize = 4;

/// One point light.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PointLight {
    /// xyz = position, w = radius.
    pub position_radius: [f32; 4],
    /// rgb = colour, a = intensity.
    pub color_intensity: [f32; 4],
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position_radius: [0.0, 0.0, 0.0, 0.0],
            color_intensity: [1.0, 1.0, 1.0, 0.0],
        }
    }
}

/// The per-frame uniform block.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// xyz = camera position, w = time in seconds (drives the water
    /// animation shader).
    pub camera_time: [f32; 4],
    /// xyz = direction toward the sun, w unused.
    pub sun_direction: [f32; 4],
    /// rgb = sun colour, a = intensity.
    pub sun_color: [f32; 4],
    /// rgb = ambient colour, a = strength.
    pub ambient: [f32; 4],
    pub point_lights: [PointLight; MAX_POINT_LIGHTS],
    /// Number of active point lights, then fog start/end, padding.
    pub light_count_fog: [f32; 4],
}

impl Default for FrameUniforms {
    fn default() -> Self {
        const IDENTITY: [[f32; 4]; 4] = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        Self {
            view: IDENTITY,
            projection: IDENTITY,
            camera_time: [0.0; 4],
            sun_direction: [0.3, -0.8, 0.5, 0.0],
            sun_color: [1.0, 0.96, 0.9, 1.0],
            ambient: [0.4, 0.45, 0.55, 0.25],
            point_lights: [PointLight::default(); MAX_POINT_LIGHTS],
            light_count_fog: [0.0, 120.0, 400.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The block must stay Pod-uploadable with 16-byte aligned rows.
    #[test]
    fn frame_uniforms_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
    }
}
