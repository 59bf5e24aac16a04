//! Shading parameters of the stroke shader.
//!
//! The strokes are lit by a single directional light combined with an ambient
//! term and a Phong specular highlight. [`StrokeUniforms`] is the block the
//! shader reads, built once per frame from the camera matrices and a [`Light`].

use crate::color::{self, Color};
use bytemuck::{Pod, Zeroable};
use glamx::{Mat4, Vec3};

/// Time added to [`Light::time`] by each [`Light::advance`].
pub const TIME_STEP: f32 = 0.1;

/// A directional light with ambient and specular terms.
///
/// # Examples
/// ```
/// # use arbrush::light::Light;
/// # use glamx::Vec3;
/// let mut light = Light::default().with_direction(Vec3::new(0.0, -1.0, 0.0));
/// light.advance();
/// assert!((light.time - 0.1).abs() < 1.0e-6);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Light {
    /// Color of the light. Alpha is ignored.
    pub color: Color,
    /// Ambient intensity, applied regardless of orientation.
    pub ambient_intensity: f32,
    /// Direction the light comes from.
    pub direction: Vec3,
    /// Diffuse intensity.
    pub diffuse_intensity: f32,
    /// Specular exponent.
    pub shininess: f32,
    /// Specular intensity.
    pub specular_intensity: f32,
    /// Animation time, forwarded to the shader.
    pub time: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: color::WHITE,
            ambient_intensity: 0.1,
            direction: Vec3::Z,
            diffuse_intensity: 0.8,
            shininess: 10.0,
            specular_intensity: 2.0,
            time: 0.0,
        }
    }
}

impl Light {
    /// Sets the light color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the direction the light comes from.
    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the ambient intensity.
    pub fn with_ambient(mut self, ambient: f32) -> Self {
        self.ambient_intensity = ambient;
        self
    }

    /// Advances the animation time by one frame.
    #[inline]
    pub fn advance(&mut self) {
        self.time += TIME_STEP;
    }
}

/// The uniform block of the stroke shader.
///
/// The layout matches `StrokeUniforms` in `stroke.wgsl`: two matrices followed
/// by vec3/f32 pairs, padded to a multiple of 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct StrokeUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub light_color: [f32; 3],
    pub ambient_intensity: f32,
    pub light_direction: [f32; 3],
    pub diffuse_intensity: f32,
    pub shininess: f32,
    pub specular_intensity: f32,
    pub time: f32,
    pub _padding: f32,
}

/// Size in bytes of [`StrokeUniforms`].
pub const STROKE_UNIFORMS_SIZE: usize = std::mem::size_of::<StrokeUniforms>();

impl StrokeUniforms {
    /// Builds the block for one frame.
    pub fn new(view: Mat4, proj: Mat4, light: &Light) -> StrokeUniforms {
        let direction = light.direction.normalize_or_zero();
        StrokeUniforms {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            light_color: [light.color.r, light.color.g, light.color.b],
            ambient_intensity: light.ambient_intensity,
            light_direction: direction.to_array(),
            diffuse_intensity: light.diffuse_intensity,
            shininess: light.shininess,
            specular_intensity: light.specular_intensity,
            time: light.time,
            _padding: 0.0,
        }
    }
}

impl Default for StrokeUniforms {
    fn default() -> Self {
        StrokeUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, &Light::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_layout() {
        assert_eq!(STROKE_UNIFORMS_SIZE, 176);
        assert_eq!(STROKE_UNIFORMS_SIZE % 16, 0);
    }

    #[test]
    fn time_advances_per_frame() {
        let mut light = Light::default();
        for _ in 0..10 {
            light.advance();
        }
        assert!((light.time - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn uniforms_carry_light_and_camera() {
        let view = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let light = Light::default().with_direction(Vec3::new(0.0, 0.0, 5.0));
        let block = StrokeUniforms::new(view, Mat4::IDENTITY, &light);

        assert_eq!(block.view[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(block.light_direction, [0.0, 0.0, 1.0]);
        assert_eq!(block.ambient_intensity, 0.1);
        assert_eq!(block.specular_intensity, 2.0);
    }
}
