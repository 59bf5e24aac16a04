//! GPU-visible linear storage.

use crate::context::Context;
use bytemuck::Pod;

/// A linear byte region the GPU reads from.
///
/// [`GpuBuffer`] is the wgpu implementation; [`HostStorage`] keeps the bytes
/// in RAM, for headless runs and for checking uploads without a device.
pub trait GpuStorage {
    /// Size of the region in bytes.
    fn capacity(&self) -> u64;

    /// Copies `bytes` into the region at byte `offset`.
    ///
    /// The caller guarantees `offset + bytes.len() <= capacity()`.
    fn write(&mut self, offset: u64, bytes: &[u8]);
}

/// A wgpu buffer written through the queue.
///
/// Writes are staged by the queue and land before any command buffer submitted
/// afterwards, so a draw recorded after [`GpuStorage::write`] sees the data.
pub struct GpuBuffer {
    buffer: wgpu::Buffer,
    queue: std::sync::Arc<wgpu::Queue>,
}

impl GpuBuffer {
    /// Wraps an existing buffer. It must have `COPY_DST` usage.
    pub fn new(ctxt: &Context, buffer: wgpu::Buffer) -> GpuBuffer {
        GpuBuffer {
            buffer,
            queue: ctxt.queue.clone(),
        }
    }

    /// The underlying wgpu buffer.
    #[inline]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

impl GpuStorage for GpuBuffer {
    #[inline]
    fn capacity(&self) -> u64 {
        self.buffer.size()
    }

    #[inline]
    fn write(&mut self, offset: u64, bytes: &[u8]) {
        if !bytes.is_empty() {
            self.queue.write_buffer(&self.buffer, offset, bytes);
        }
    }
}

/// Storage kept in RAM.
#[derive(Clone, Debug, Default)]
pub struct HostStorage {
    bytes: Vec<u8>,
    writes: usize,
}

impl HostStorage {
    /// Allocates `capacity` zeroed bytes.
    pub fn new(capacity: usize) -> HostStorage {
        HostStorage {
            bytes: vec![0; capacity],
            writes: 0,
        }
    }

    /// The raw bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of non-empty writes received.
    #[inline]
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Reads the first `count` records of type `T`.
    pub fn read<T: Pod>(&self, count: usize) -> Vec<T> {
        let size = std::mem::size_of::<T>();
        self.bytes[..count * size]
            .chunks_exact(size)
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }
}

impl GpuStorage for HostStorage {
    #[inline]
    fn capacity(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn write(&mut self, offset: u64, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let start = offset as usize;
        self.bytes[start..start + bytes.len()].copy_from_slice(bytes);
        self.writes += 1;
    }
}
