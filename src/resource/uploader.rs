//! Incremental copy of stroke geometry into GPU-visible storage.

use super::storage::GpuStorage;
use super::vertex::VERTEX_SIZE;
use super::vertex_index::VERTEX_INDEX_SIZE;
use crate::error::CapacityExceeded;
use crate::stroke::StrokeMesh;

/// What one [`GeometryUploader::sync`] call copied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadStats {
    /// Vertices copied by this call.
    pub vertices: usize,
    /// Indices copied by this call.
    pub indices: usize,
    /// The marks were rewound because the mesh was cleared.
    pub rewound: bool,
}

/// Mirrors a [`StrokeMesh`] into two GPU storages, copying only what was
/// appended since the previous call.
///
/// The uploader remembers how many vertices and indices it already copied (its
/// high-water marks). A stroke only ever grows between two clears, so the
/// records below the marks are already on the GPU and each call copies the
/// range `[mark, current)` at byte offset `mark * record_size`.
///
/// Call [`GeometryUploader::sync`] while holding the mesh lock, so that the
/// counts and the records read belong to the same state.
#[derive(Clone, Debug, Default)]
pub struct GeometryUploader {
    uploaded_vertices: usize,
    uploaded_indices: usize,
    generation: u64,
}

impl GeometryUploader {
    /// Creates an uploader with nothing copied yet.
    pub fn new() -> GeometryUploader {
        GeometryUploader::default()
    }

    /// Number of vertices already on the GPU.
    #[inline]
    pub fn uploaded_vertices(&self) -> usize {
        self.uploaded_vertices
    }

    /// Number of indices already on the GPU.
    #[inline]
    pub fn uploaded_indices(&self) -> usize {
        self.uploaded_indices
    }

    /// Forgets everything copied so far; the next sync copies the whole mesh.
    pub fn reset(&mut self) {
        self.uploaded_vertices = 0;
        self.uploaded_indices = 0;
    }

    /// Copies the vertices and indices appended since the last call.
    ///
    /// Fails without copying anything if a storage is too small to hold the
    /// mesh.
    pub fn sync<V, I>(
        &mut self,
        mesh: &StrokeMesh,
        vertex_storage: &mut V,
        index_storage: &mut I,
    ) -> Result<UploadStats, CapacityExceeded>
    where
        V: GpuStorage + ?Sized,
        I: GpuStorage + ?Sized,
    {
        let vertices = mesh.vertices();
        let indices = mesh.indices();

        let mut rewound = false;
        if mesh.generation() != self.generation
            || vertices.len() < self.uploaded_vertices
            || indices.len() < self.uploaded_indices
        {
            self.reset();
            self.generation = mesh.generation();
            rewound = true;
        }

        check_fits(vertex_storage, vertices.len() * VERTEX_SIZE)?;
        check_fits(index_storage, indices.len() * VERTEX_INDEX_SIZE)?;

        let new_vertices = &vertices[self.uploaded_vertices..];
        let new_indices = &indices[self.uploaded_indices..];

        // Vertices first: once an index is visible, the vertex it names is too.
        vertex_storage.write(
            (self.uploaded_vertices * VERTEX_SIZE) as u64,
            bytemuck::cast_slice(new_vertices),
        );
        index_storage.write(
            (self.uploaded_indices * VERTEX_INDEX_SIZE) as u64,
            bytemuck::cast_slice(new_indices),
        );

        let stats = UploadStats {
            vertices: new_vertices.len(),
            indices: new_indices.len(),
            rewound,
        };

        self.uploaded_vertices = vertices.len();
        self.uploaded_indices = indices.len();

        if stats.vertices > 0 || stats.indices > 0 {
            log::debug!(
                "Uploaded {} vertices and {} indices (total {} / {}).",
                stats.vertices,
                stats.indices,
                self.uploaded_vertices,
                self.uploaded_indices
            );
        }

        Ok(stats)
    }
}

fn check_fits<S: GpuStorage + ?Sized>(storage: &S, bytes: usize) -> Result<(), CapacityExceeded> {
    let capacity = storage.capacity() as usize;
    if bytes > capacity {
        Err(CapacityExceeded {
            requested: bytes,
            available: capacity,
        })
    } else {
        Ok(())
    }
}
