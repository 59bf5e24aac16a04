//! The wgpu renderer for a shared stroke mesh.

use super::frame::{FrameStager, PreparedFrame};
use super::pipeline::StrokePipeline;
use crate::color::Color;
use crate::context::Context;
use crate::error::{FrameError, SetupError};
use crate::light::{Light, STROKE_UNIFORMS_SIZE};
use crate::resource::{
    FrameCompletion, GpuBuffer, UniformRingBuffer, UniformRingConfig, VERTEX_INDEX_FORMAT,
    VERTEX_INDEX_SIZE, VERTEX_SIZE,
};
use crate::stroke::{SharedStrokeMesh, StrokeConfig};
use glamx::Mat4;

/// Draws a [`SharedStrokeMesh`] with at most K frames in flight.
///
/// GPU buffers are allocated once, sized for a full mesh. Each frame:
///
/// 1. [`StrokeRenderer::prepare`] uploads the geometry appended since the
///    previous frame and writes the uniform block into a free slot, blocking
///    while all K slots are in flight;
/// 2. [`StrokeRenderer::encode`] records the draw into a render pass;
/// 3. after submission, [`FrameCompletion::signal`] must run once the GPU is
///    done with the frame. [`StrokeRenderer::render`] does all of this, with
///    the signal hooked to `Queue::on_submitted_work_done`.
pub struct StrokeRenderer {
    ctxt: Context,
    pipeline: StrokePipeline,
    stager: FrameStager<GpuBuffer, GpuBuffer, GpuBuffer>,
    bind_groups: Vec<wgpu::BindGroup>,
}

impl StrokeRenderer {
    /// Allocates the GPU buffers for a mesh built with `config`.
    pub fn new(
        ctxt: &Context,
        pipeline: StrokePipeline,
        config: StrokeConfig,
    ) -> Result<StrokeRenderer, SetupError> {
        Self::with_ring_config(ctxt, pipeline, config, UniformRingConfig::default())
    }

    /// Like [`StrokeRenderer::new`] with a custom number of frames in flight.
    pub fn with_ring_config(
        ctxt: &Context,
        pipeline: StrokePipeline,
        config: StrokeConfig,
        ring: UniformRingConfig,
    ) -> Result<StrokeRenderer, SetupError> {
        config.validate()?;
        ring.validate()?;

        let vertex_bytes = (config.vertex_capacity() * VERTEX_SIZE) as u64;
        let index_bytes = (config.index_capacity() * VERTEX_INDEX_SIZE) as u64;

        let vertex_buffer = ctxt.try_create_buffer(
            "stroke_vertex_buffer",
            vertex_bytes,
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        )?;
        let index_buffer = ctxt.try_create_buffer(
            "stroke_index_buffer",
            index_bytes,
            wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        )?;

        let mut uniform_buffers = Vec::with_capacity(ring.in_flight);
        let mut bind_groups = Vec::with_capacity(ring.in_flight);
        for _ in 0..ring.in_flight {
            let buffer = ctxt.try_create_buffer(
                "stroke_uniform_buffer",
                STROKE_UNIFORMS_SIZE as u64,
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            )?;
            bind_groups.push(ctxt.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("stroke_uniform_bind_group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            }));
            uniform_buffers.push(GpuBuffer::new(ctxt, buffer));
        }

        log::info!(
            "Allocated stroke buffers: {} bytes of vertices, {} bytes of indices, {} uniform slots.",
            vertex_bytes,
            index_bytes,
            ring.in_flight
        );

        let stager = FrameStager::new(
            GpuBuffer::new(ctxt, vertex_buffer),
            GpuBuffer::new(ctxt, index_buffer),
            UniformRingBuffer::new(uniform_buffers)?,
        );

        Ok(StrokeRenderer {
            ctxt: ctxt.clone(),
            pipeline,
            stager,
            bind_groups,
        })
    }

    /// Uploads new geometry and writes this frame's uniforms.
    ///
    /// While K frames are in flight, polls the device until the oldest one
    /// retires, so completion callbacks run even when nothing else polls.
    /// Returns `Ok(None)` when there is nothing to draw.
    pub fn prepare(
        &mut self,
        mesh: &SharedStrokeMesh,
        view: Mat4,
        proj: Mat4,
    ) -> Result<Option<PreparedFrame>, FrameError> {
        let device = self.ctxt.device.clone();
        self.stager.prepare_polling(mesh, view, proj, || {
            if let Err(e) = device.poll(wgpu::PollType::wait_indefinitely()) {
                log::warn!("Device poll failed while waiting for a frame: {e}");
            }
        })
    }

    /// Records the draw of a prepared frame.
    pub fn encode(&self, frame: &PreparedFrame, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline.pipeline);
        pass.set_bind_group(0, &self.bind_groups[frame.slot().index()], &[]);
        pass.set_vertex_buffer(0, self.stager.vertex_storage().buffer().slice(..));
        pass.set_index_buffer(
            self.stager.index_storage().buffer().slice(..),
            VERTEX_INDEX_FORMAT,
        );
        pass.draw_indexed(0..frame.index_count(), 0, 0..1);
    }

    /// Prepares, encodes and submits one frame into `color_view`.
    ///
    /// The completion signal is hooked to the queue. wgpu only runs it when the
    /// device is polled, which the next [`Self::prepare`] does once every slot
    /// is taken. Returns `false` when nothing was drawn.
    pub fn render(
        &mut self,
        mesh: &SharedStrokeMesh,
        view: Mat4,
        proj: Mat4,
        color_view: &wgpu::TextureView,
        depth_view: Option<&wgpu::TextureView>,
        clear: Option<Color>,
    ) -> Result<bool, FrameError> {
        let frame = match self.prepare(mesh, view, proj)? {
            Some(frame) => frame,
            None => return Ok(false),
        };

        let load = match clear {
            Some(bg) => wgpu::LoadOp::Clear(wgpu::Color {
                r: bg.r as f64,
                g: bg.g as f64,
                b: bg.b as f64,
                a: bg.a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut encoder = self.ctxt.create_command_encoder(Some("stroke_encoder"));
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("stroke_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: depth_view.map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.encode(&frame, &mut pass);
        }

        self.ctxt.submit(std::iter::once(encoder.finish()));
        let completion = self.completion_handle();
        self.ctxt
            .queue
            .on_submitted_work_done(move || completion.signal());

        Ok(true)
    }

    /// A handle for the GPU completion callback.
    pub fn completion_handle(&self) -> FrameCompletion {
        self.stager.completion()
    }

    /// The light used for the next frame.
    pub fn light(&self) -> &Light {
        self.stager.light()
    }

    /// Shading parameters, applied from the next frame.
    pub fn light_mut(&mut self) -> &mut Light {
        self.stager.light_mut()
    }

    /// The pipeline this renderer draws with.
    pub fn pipeline(&self) -> &StrokePipeline {
        &self.pipeline
    }

    /// Closes the frame gate; blocked and later `prepare` calls fail.
    pub fn shutdown(&self) {
        self.stager.shutdown();
    }
}
