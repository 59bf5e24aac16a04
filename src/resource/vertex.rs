//! The vertex record written into GPU-visible storage.

use crate::color::Color;
use bytemuck::{Pod, Zeroable};
use glamx::{Vec2, Vec3};

/// One tube vertex.
///
/// The layout matches the `VertexInput` struct of the stroke shader. Vectors
/// are padded to four components so that the record stays 16-byte aligned.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// World-space position, `w = 1`.
    pub position: [f32; 4],
    /// RGBA color.
    pub color: [f32; 4],
    /// Unit normal, `w = 0`.
    pub normal: [f32; 4],
    /// Texture coordinates: `s` around the ring, `t` along the stroke.
    pub uv: [f32; 2],
    _padding: [f32; 2],
}

/// Size in bytes of one vertex record.
pub const VERTEX_SIZE: usize = std::mem::size_of::<Vertex>();

impl Vertex {
    /// Creates a vertex.
    pub fn new(position: Vec3, normal: Vec3, color: Color, uv: Vec2) -> Self {
        Vertex {
            position: [position.x, position.y, position.z, 1.0],
            color: [color.r, color.g, color.b, color.a],
            normal: [normal.x, normal.y, normal.z, 0.0],
            uv: uv.into(),
            _padding: [0.0; 2],
        }
    }

    /// The position as a 3D vector.
    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }

    /// The normal as a 3D vector.
    #[inline]
    pub fn normal(&self) -> Vec3 {
        Vec3::new(self.normal[0], self.normal[1], self.normal[2])
    }

    /// The vertex buffer layout of this record.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
            0 => Float32x4,
            1 => Float32x4,
            2 => Float32x4,
            3 => Float32x2
        ];

        wgpu::VertexBufferLayout {
            array_stride: VERTEX_SIZE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}
