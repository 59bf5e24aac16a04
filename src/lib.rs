/*!
# arbrush

Incremental tube-stroke meshing for AR drawing, and the plumbing that hands the
geometry to the GPU.

A stroke is a polyline sampled from a tracked pointer. Every new point extends
a tube around the polyline by one ring of vertices and the triangles joining it
to the previous ring. The geometry only ever grows until the drawing is
cleared, so the renderer copies just the new records each frame.

## Overview

* [`stroke::StrokeMesh`] turns points into rings and indices, inside storage
  allocated once from a [`stroke::StrokeConfig`]. Points past capacity are
  dropped.
* [`stroke::SharedStrokeMesh`] shares a mesh between an input thread and a
  render thread behind one lock.
* [`resource::GeometryUploader`] copies the appended vertices and indices into
  GPU buffers.
* [`resource::UniformRingBuffer`] rotates K uniform blocks and blocks the
  render thread while K frames are in flight.
* [`renderer::StrokeRenderer`] ties those together with a wgpu pipeline.
* [`input::BrushController`] smooths the pointer, spaces the points and
  picks radius and color.
* [`recording::FrameRecorder`] streams captured frames to a sink, dropping
  frames rather than stalling.

A frame on the render thread looks like:

```no_run
# use arbrush::prelude::*;
# fn frame(ctxt: &Context, mesh: &SharedStrokeMesh, view: Mat4, proj: Mat4,
#          target: &wgpu::TextureView, depth: &wgpu::TextureView) -> Result<(), Box<dyn std::error::Error>> {
let pipeline = StrokePipeline::builtin(
    ctxt,
    wgpu::TextureFormat::Bgra8Unorm,
    Some(Context::depth_format()),
);
let mut renderer = StrokeRenderer::new(ctxt, pipeline, StrokeConfig::default())?;

renderer.render(mesh, view, proj, target, Some(depth), Some(BLACK))?;
# Ok(())
# }
```

while the input thread calls [`input::BrushController::update`] with a fresh
pointer sample every tick.

Everything logs through the [`log`](https://docs.rs/log) facade.
*/
#![allow(missing_copy_implementations)]
#![allow(clippy::module_inception)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub use glamx;
pub use wgpu;

pub mod color;
pub mod context;
pub mod error;
pub mod input;
pub mod light;
pub mod recording;
pub mod renderer;
pub mod resource;
pub mod stroke;
pub mod sync;

/// Commonly used types.
pub mod prelude {
    pub use crate::color::*;
    pub use crate::context::*;
    pub use crate::error::*;
    pub use crate::input::*;
    pub use crate::light::*;
    pub use crate::recording::*;
    pub use crate::renderer::*;
    pub use crate::resource::*;
    pub use crate::stroke::*;
    pub use crate::sync::FramePermits;
    pub use glamx::{Mat4, Quat, Vec2, Vec3};
}
