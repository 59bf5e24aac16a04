//! Per-frame staging shared by the wgpu renderer and headless runs.

use crate::error::FrameError;
use crate::light::{Light, StrokeUniforms};
use crate::resource::{
    FrameCompletion, GeometryUploader, GpuStorage, UniformRingBuffer, UniformSlot,
};
use crate::stroke::{MeshSnapshot, SharedStrokeMesh};
use glamx::Mat4;
use std::time::Duration;

/// Longest wait for a uniform slot between two polls in
/// [`FrameStager::prepare_polling`].
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Everything the draw call of one frame needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreparedFrame {
    slot: UniformSlot,
    snapshot: MeshSnapshot,
}

impl PreparedFrame {
    /// The uniform slot written for this frame.
    #[inline]
    pub fn slot(&self) -> UniformSlot {
        self.slot
    }

    /// Number of indices to draw.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.snapshot.index_count as u32
    }

    /// The mesh counts captured while uploading.
    #[inline]
    pub fn snapshot(&self) -> &MeshSnapshot {
        &self.snapshot
    }
}

/// Uploads geometry and fills a uniform slot for each frame.
///
/// `V`, `I` and `U` are the vertex, index and uniform storages: GPU buffers
/// in [`super::StrokeRenderer`], host memory in tests.
pub struct FrameStager<V: GpuStorage, I: GpuStorage, U: GpuStorage> {
    uploader: GeometryUploader,
    vertices: V,
    indices: I,
    uniforms: UniformRingBuffer<U>,
    light: Light,
}

impl<V: GpuStorage, I: GpuStorage, U: GpuStorage> FrameStager<V, I, U> {
    /// Creates a stager over the given storages.
    pub fn new(vertices: V, indices: I, uniforms: UniformRingBuffer<U>) -> Self {
        FrameStager {
            uploader: GeometryUploader::new(),
            vertices,
            indices,
            uniforms,
            light: Light::default(),
        }
    }

    /// Brings the GPU copy of `mesh` up to date and writes the uniform block.
    ///
    /// The upload and the index count snapshot happen under the mesh lock; the
    /// uniform slot is acquired after the lock is released, so a frame waiting
    /// for the GPU never holds back the input thread.
    ///
    /// Blocks while every slot is in flight, so something other than the
    /// calling thread must signal completion. Use [`Self::prepare_polling`]
    /// when completions are delivered by polling on this thread.
    ///
    /// Returns `Ok(None)` when the mesh has nothing to draw. In that case no
    /// slot is taken and no completion signal is expected.
    pub fn prepare(
        &mut self,
        mesh: &SharedStrokeMesh,
        view: Mat4,
        proj: Mat4,
    ) -> Result<Option<PreparedFrame>, FrameError> {
        let snapshot = match self.upload(mesh)? {
            Some(snapshot) => snapshot,
            None => return Ok(None),
        };

        let block = self.next_uniforms(view, proj);
        let slot = self.uniforms.acquire_next(&block)?;

        Ok(Some(PreparedFrame { slot, snapshot }))
    }

    /// Like [`Self::prepare`], but calls `poll` whenever every slot is in
    /// flight, then waits at most [`POLL_INTERVAL`] for a slot before polling
    /// again.
    ///
    /// `poll` is where completion callbacks get a chance to run, e.g.
    /// `wgpu::Device::poll`.
    pub fn prepare_polling<P: FnMut()>(
        &mut self,
        mesh: &SharedStrokeMesh,
        view: Mat4,
        proj: Mat4,
        mut poll: P,
    ) -> Result<Option<PreparedFrame>, FrameError> {
        let snapshot = match self.upload(mesh)? {
            Some(snapshot) => snapshot,
            None => return Ok(None),
        };

        let block = self.next_uniforms(view, proj);
        let mut acquired = self.uniforms.try_acquire_next(&block)?;
        while acquired.is_none() {
            poll();
            acquired = self.uniforms.acquire_next_timeout(&block, POLL_INTERVAL)?;
        }

        Ok(acquired.map(|slot| PreparedFrame { slot, snapshot }))
    }

    fn upload(&mut self, mesh: &SharedStrokeMesh) -> Result<Option<MeshSnapshot>, FrameError> {
        let mesh = mesh.lock();
        self.uploader
            .sync(&mesh, &mut self.vertices, &mut self.indices)?;
        let snapshot = mesh.snapshot();
        Ok(Some(snapshot).filter(|s| s.index_count > 0))
    }

    fn next_uniforms(&mut self, view: Mat4, proj: Mat4) -> StrokeUniforms {
        self.light.advance();
        StrokeUniforms::new(view, proj, &self.light)
    }

    /// A handle for the GPU completion callback.
    pub fn completion(&self) -> FrameCompletion {
        self.uniforms.completion()
    }

    /// Closes the uniform gate.
    pub fn shutdown(&self) {
        self.uniforms.shutdown()
    }

    /// The light used for the next frame.
    pub fn light(&self) -> &Light {
        &self.light
    }

    /// Shading parameters, applied from the next frame.
    pub fn light_mut(&mut self) -> &mut Light {
        &mut self.light
    }

    /// The upload marks.
    pub fn uploader(&self) -> &GeometryUploader {
        &self.uploader
    }

    /// Storage receiving the vertices.
    pub fn vertex_storage(&self) -> &V {
        &self.vertices
    }

    /// Storage receiving the indices.
    pub fn index_storage(&self) -> &I {
        &self.indices
    }

    /// The uniform slots.
    pub fn uniforms(&self) -> &UniformRingBuffer<U> {
        &self.uniforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{
        HostStorage, UniformRingConfig, Vertex, VertexIndex, VERTEX_INDEX_SIZE, VERTEX_SIZE,
    };
    use crate::stroke::{ColorMode, StrokeConfig};
    use glamx::Vec3;

    type HostStager = FrameStager<HostStorage, HostStorage, HostStorage>;

    fn stager(config: &StrokeConfig) -> HostStager {
        FrameStager::new(
            HostStorage::new(config.vertex_capacity() * VERTEX_SIZE),
            HostStorage::new(config.index_capacity() * VERTEX_INDEX_SIZE),
            UniformRingBuffer::in_host_memory(UniformRingConfig::default()).unwrap(),
        )
    }

    #[test]
    fn nothing_to_draw_takes_no_slot() {
        let config = StrokeConfig::new().with_max_points(16);
        let mesh = SharedStrokeMesh::new(config).unwrap();
        let mut stager = stager(&config);

        assert_eq!(stager.prepare(&mesh, Mat4::IDENTITY, Mat4::IDENTITY), Ok(None));

        mesh.add_point(Vec3::ZERO, 0.1, ColorMode::Normal, false);
        assert_eq!(stager.prepare(&mesh, Mat4::IDENTITY, Mat4::IDENTITY), Ok(None));
        assert_eq!(stager.uniforms().available(), 3);
        assert_eq!(stager.light().time, 0.0);
    }

    #[test]
    fn prepared_frame_matches_uploaded_geometry() {
        let config = StrokeConfig::new().with_max_points(16);
        let mesh = SharedStrokeMesh::new(config).unwrap();
        let mut stager = stager(&config);

        for x in 0..3 {
            mesh.add_point(Vec3::new(x as f32, 0.0, 0.0), 0.1, ColorMode::Normal, false);
        }

        let frame = stager
            .prepare(&mesh, Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap()
            .unwrap();
        assert_eq!(frame.index_count(), 96);
        assert_eq!(frame.snapshot().vertex_count, 24);
        assert_eq!(frame.slot().index(), 0);

        let indices = stager.index_storage().read::<VertexIndex>(96);
        assert!(indices.iter().all(|&i| i < 24));
        let vertices = stager.vertex_storage().read::<Vertex>(24);
        assert_eq!(vertices.as_slice(), mesh.lock().vertices());

        let block = stager.uniforms().slot_storage(0).unwrap().read::<StrokeUniforms>(1);
        assert!((block[0].time - 0.1).abs() < 1.0e-6);
    }

    #[test]
    fn polling_prepare_lets_completions_run() {
        let config = StrokeConfig::new().with_max_points(16);
        let mesh = SharedStrokeMesh::new(config).unwrap();
        let mut stager = FrameStager::new(
            HostStorage::new(config.vertex_capacity() * VERTEX_SIZE),
            HostStorage::new(config.index_capacity() * VERTEX_INDEX_SIZE),
            UniformRingBuffer::in_host_memory(UniformRingConfig::default().with_in_flight(1))
                .unwrap(),
        );
        mesh.add_point(Vec3::ZERO, 0.1, ColorMode::Normal, false);
        mesh.add_point(Vec3::X, 0.1, ColorMode::Normal, false);

        // Completions only arrive from the poll hook, as with wgpu callbacks.
        let done = stager.completion();
        let mut polls = 0;
        for _ in 0..5 {
            let frame = stager
                .prepare_polling(&mesh, Mat4::IDENTITY, Mat4::IDENTITY, || {
                    polls += 1;
                    done.signal();
                })
                .unwrap();
            assert_eq!(frame.map(|f| f.slot().index()), Some(0));
        }
        assert_eq!(polls, 4);
    }

    #[test]
    fn shutdown_fails_pending_frames() {
        let config = StrokeConfig::new().with_max_points(16);
        let mesh = SharedStrokeMesh::new(config).unwrap();
        let mut stager = stager(&config);
        mesh.add_point(Vec3::ZERO, 0.1, ColorMode::Normal, false);
        mesh.add_point(Vec3::X, 0.1, ColorMode::Normal, false);

        stager.shutdown();
        assert_eq!(
            stager.prepare(&mesh, Mat4::IDENTITY, Mat4::IDENTITY),
            Err(FrameError::GateClosed(crate::error::GateClosed))
        );
    }
}
