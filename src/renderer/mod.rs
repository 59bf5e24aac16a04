//! Drawing the stroke mesh with wgpu.

pub use self::frame::{FrameStager, PreparedFrame};
pub use self::pipeline::StrokePipeline;
pub use self::stroke_renderer::StrokeRenderer;

mod frame;
mod pipeline;
mod stroke_renderer;
