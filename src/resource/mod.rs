//! GPU-visible resources: vertex format, linear storage, geometry upload and
//! the uniform ring.

pub use self::storage::{GpuBuffer, GpuStorage, HostStorage};
pub use self::uniform_ring::{
    FrameCompletion, SlotState, UniformRingBuffer, UniformRingConfig, UniformSlot,
};
pub use self::uploader::{GeometryUploader, UploadStats};
pub use self::vertex::{Vertex, VERTEX_SIZE};
pub use self::vertex_index::{VertexIndex, VERTEX_INDEX_FORMAT, VERTEX_INDEX_SIZE};

mod storage;
mod uniform_ring;
mod uploader;
mod vertex;
pub mod vertex_index;
