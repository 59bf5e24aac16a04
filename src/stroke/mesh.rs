//! The stroke mesh: points in, tube geometry out.

use super::arena::FixedArena;
use super::ring;
use super::{ColorMode, StrokeConfig};
use crate::error::SetupError;
use crate::resource::{Vertex, VertexIndex};
use glamx::Vec3;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Outcome of [`StrokeMesh::add_point`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddPoint {
    /// The point was stored but no geometry was emitted yet.
    Recorded,
    /// The point was stored and the tube grew by this many vertices and indices.
    Extended {
        /// Number of vertices appended.
        vertices: usize,
        /// Number of indices appended.
        indices: usize,
    },
    /// The point repeats the previous one and was ignored.
    Ignored,
    /// The mesh is full; the point was dropped.
    Dropped,
}

/// Counts describing the mesh at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshSnapshot {
    /// Number of recorded points.
    pub point_count: usize,
    /// Number of vertices written.
    pub vertex_count: usize,
    /// Number of indices written. Draw `[0, index_count)`.
    pub index_count: usize,
    /// Incremented by every [`StrokeMesh::clear`].
    pub generation: u64,
}

/// A tube mesh grown one point at a time.
///
/// All storage is allocated by [`StrokeMesh::new`] from the [`StrokeConfig`]
/// and reused after [`StrokeMesh::clear`]. Points past `max_points` are
/// dropped without error.
///
/// This type is single-threaded; share it between an input thread and a render
/// thread through [`SharedStrokeMesh`].
pub struct StrokeMesh {
    config: StrokeConfig,
    points: Vec<Vec3>,
    vertices: FixedArena<Vertex>,
    indices: FixedArena<VertexIndex>,
    /// Perpendicular of the last emitted ring; zero when a segment starts.
    prev_perp: Vec3,
    /// The next point starts a new, disconnected segment.
    split_pending: bool,
    generation: u64,
    capacity_warned: bool,
    ring_scratch: Vec<Vertex>,
    index_scratch: Vec<VertexIndex>,
}

impl StrokeMesh {
    /// Allocates an empty mesh.
    pub fn new(config: StrokeConfig) -> Result<StrokeMesh, SetupError> {
        config.validate()?;

        let nsubdiv = config.verts_per_point as usize;
        log::info!(
            "Allocating stroke mesh: {} points, {} vertices, {} indices.",
            config.max_points,
            config.vertex_capacity(),
            config.index_capacity()
        );

        Ok(StrokeMesh {
            points: Vec::with_capacity(config.max_points),
            vertices: FixedArena::with_capacity(config.vertex_capacity()),
            indices: FixedArena::with_capacity(config.index_capacity()),
            prev_perp: Vec3::ZERO,
            split_pending: false,
            generation: 0,
            capacity_warned: false,
            ring_scratch: Vec::with_capacity(2 * nsubdiv),
            index_scratch: Vec::with_capacity(6 * nsubdiv),
            config,
        })
    }

    /// The configuration this mesh was built with.
    #[inline]
    pub fn config(&self) -> &StrokeConfig {
        &self.config
    }

    /// Adds a point to the stroke.
    ///
    /// The first point of a stroke is only recorded. With `split_line` set,
    /// the point is recorded and the *next* point starts a new segment whose
    /// first ring sits around this one. Otherwise a ring is emitted around
    /// `point` (preceded by a start ring around the previous point when a
    /// segment begins) and joined to the previous ring.
    pub fn add_point(
        &mut self,
        point: Vec3,
        radius: f32,
        color_mode: ColorMode,
        split_line: bool,
    ) -> AddPoint {
        if self.points.len() >= self.config.max_points {
            self.warn_capacity();
            return AddPoint::Dropped;
        }

        let prev = match self.points.last() {
            Some(&prev) if (point - prev).length_squared() <= ring::DEGENERATE_EPSILON_SQ => {
                return AddPoint::Ignored
            }
            Some(&prev) => prev,
            None => {
                self.points.push(point);
                return AddPoint::Recorded;
            }
        };

        self.points.push(point);

        if split_line {
            self.split_pending = true;
            return AddPoint::Recorded;
        }

        self.emit_segment(prev, point, radius, &color_mode)
    }

    /// Adds a point with the configured default radius and no split.
    pub fn add_point_default(&mut self, point: Vec3, color_mode: ColorMode) -> AddPoint {
        let radius = self.config.default_radius;
        self.add_point(point, radius, color_mode, false)
    }

    fn emit_segment(
        &mut self,
        prev: Vec3,
        point: Vec3,
        radius: f32,
        color_mode: &ColorMode,
    ) -> AddPoint {
        let nsubdiv = self.config.verts_per_point;
        let point_index = self.points.len() - 1;
        let starts_segment = point_index == 1 || self.split_pending;
        let axis = point - prev;

        let prev_perp = if starts_segment {
            Vec3::ZERO
        } else {
            self.prev_perp
        };
        let perp = ring::propagate_perpendicular(axis, prev_perp, radius);

        self.ring_scratch.clear();
        self.index_scratch.clear();

        if starts_segment {
            ring::push_ring(
                prev,
                axis,
                perp,
                nsubdiv,
                color_mode,
                point_index - 1,
                &mut self.ring_scratch,
            );
        }

        let start = (self.vertices.len() + self.ring_scratch.len()) as VertexIndex;
        ring::push_ring(
            point,
            axis,
            perp,
            nsubdiv,
            color_mode,
            point_index,
            &mut self.ring_scratch,
        );
        ring::push_side_wall_indices(start, nsubdiv, &mut self.index_scratch);

        if self.ring_scratch.len() > self.vertices.remaining()
            || self.index_scratch.len() > self.indices.remaining()
        {
            let _ = self.points.pop();
            self.warn_capacity();
            return AddPoint::Dropped;
        }

        // Both fit, checked above.
        let _ = self.vertices.append(&self.ring_scratch);
        let _ = self.indices.append(&self.index_scratch);

        self.prev_perp = perp;
        self.split_pending = false;

        AddPoint::Extended {
            vertices: self.ring_scratch.len(),
            indices: self.index_scratch.len(),
        }
    }

    fn warn_capacity(&mut self) {
        if !self.capacity_warned {
            self.capacity_warned = true;
            log::warn!(
                "Stroke is full ({} points); further points are dropped.",
                self.points.len()
            );
        }
    }

    /// Empties the stroke. Storage is kept for the next stroke.
    ///
    /// Calling this twice in a row is the same as calling it once, apart from
    /// the generation counter.
    pub fn clear(&mut self) {
        self.points.clear();
        self.vertices.clear();
        self.indices.clear();
        self.prev_perp = Vec3::ZERO;
        self.split_pending = false;
        self.capacity_warned = false;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Current counts.
    #[inline]
    pub fn snapshot(&self) -> MeshSnapshot {
        MeshSnapshot {
            point_count: self.points.len(),
            vertex_count: self.vertices.len(),
            index_count: self.indices.len(),
            generation: self.generation,
        }
    }

    /// The recorded points.
    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// The written vertices.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        self.vertices.as_slice()
    }

    /// The written indices.
    #[inline]
    pub fn indices(&self) -> &[VertexIndex] {
        self.indices.as_slice()
    }

    /// Number of recorded points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Is the stroke empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The most recent point.
    #[inline]
    pub fn last_point(&self) -> Option<Vec3> {
        self.points.last().copied()
    }

    /// Distance between the two most recent points.
    pub fn last_segment_length(&self) -> Option<f32> {
        match self.points.as_slice() {
            [.., a, b] => Some(a.distance(*b)),
            _ => None,
        }
    }

    /// Perpendicular vector of the last emitted ring, zero if none.
    #[inline]
    pub fn perpendicular(&self) -> Vec3 {
        self.prev_perp
    }

    /// The counter bumped by [`StrokeMesh::clear`].
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A [`StrokeMesh`] shared between threads.
///
/// Every operation holds one lock for its whole duration, so a reader sees the
/// mesh either entirely before or entirely after a concurrent
/// [`add_point`](Self::add_point) or [`clear`](Self::clear).
#[derive(Clone)]
pub struct SharedStrokeMesh {
    inner: Arc<Mutex<StrokeMesh>>,
}

impl SharedStrokeMesh {
    /// Allocates an empty shared mesh.
    pub fn new(config: StrokeConfig) -> Result<SharedStrokeMesh, SetupError> {
        Ok(SharedStrokeMesh::from_mesh(StrokeMesh::new(config)?))
    }

    /// Wraps an existing mesh.
    pub fn from_mesh(mesh: StrokeMesh) -> SharedStrokeMesh {
        SharedStrokeMesh {
            inner: Arc::new(Mutex::new(mesh)),
        }
    }

    /// See [`StrokeMesh::add_point`].
    pub fn add_point(
        &self,
        point: Vec3,
        radius: f32,
        color_mode: ColorMode,
        split_line: bool,
    ) -> AddPoint {
        self.inner
            .lock()
            .add_point(point, radius, color_mode, split_line)
    }

    /// See [`StrokeMesh::clear`].
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// See [`StrokeMesh::snapshot`].
    pub fn snapshot(&self) -> MeshSnapshot {
        self.inner.lock().snapshot()
    }

    /// Locks the mesh for a read-or-mutate critical section.
    ///
    /// Keep the guard for as short as possible: the input thread blocks on it.
    pub fn lock(&self) -> MutexGuard<'_, StrokeMesh> {
        self.inner.lock()
    }
}
