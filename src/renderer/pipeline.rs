//! The render pipeline drawing stroke tubes.

use crate::context::Context;
use crate::light::STROKE_UNIFORMS_SIZE;
use crate::resource::Vertex;

/// A render pipeline and the layout of its uniform bind group (group 0).
///
/// The host can bring its own pipeline with [`StrokePipeline::from_parts`] as
/// long as it consumes [`Vertex`] records at vertex buffer slot 0 and a
/// [`crate::light::StrokeUniforms`] block at group 0, binding 0.
pub struct StrokePipeline {
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) uniform_layout: wgpu::BindGroupLayout,
}

impl StrokePipeline {
    /// Wraps a pipeline built by the host.
    pub fn from_parts(
        pipeline: wgpu::RenderPipeline,
        uniform_layout: wgpu::BindGroupLayout,
    ) -> StrokePipeline {
        StrokePipeline {
            pipeline,
            uniform_layout,
        }
    }

    /// Builds the lit tube pipeline shipped with this crate.
    ///
    /// # Arguments
    /// * `color_format` - Format of the color attachment
    /// * `depth_format` - Format of the depth attachment, if the pass has one
    pub fn builtin(
        ctxt: &Context,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> StrokePipeline {
        let uniform_layout = ctxt.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stroke_uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(STROKE_UNIFORMS_SIZE as u64),
                },
                count: None,
            }],
        });

        let pipeline_layout = ctxt.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("stroke_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let shader = ctxt.create_shader_module(Some("stroke_shader"), include_str!("stroke.wgsl"));

        let pipeline = ctxt.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("stroke_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                // Ring quads are wound counter-clockwise seen from outside the tube.
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        log::info!("Created builtin stroke pipeline for {:?}.", color_format);

        StrokePipeline {
            pipeline,
            uniform_layout,
        }
    }

    /// The render pipeline.
    #[inline]
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Layout of the uniform bind group.
    #[inline]
    pub fn uniform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_layout
    }
}
