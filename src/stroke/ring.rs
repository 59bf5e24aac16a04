//! Ring geometry for tube strokes.
//!
//! A ring is a discretized circle of vertices around a stroke point, oriented
//! by the segment axis and by a perpendicular vector carried from one ring to
//! the next. Propagating that vector, instead of recomputing it from a fixed
//! reference at every point, keeps consecutive rings aligned so the tube does
//! not twist.

use super::ColorMode;
use crate::resource::{Vertex, VertexIndex};
use glamx::{Quat, Vec2, Vec3};

/// Reference direction used to seed the first perpendicular of a segment.
const SEED_REFERENCE: Vec3 = Vec3::ONE;

/// Squared length under which a vector is treated as zero.
pub(crate) const DEGENERATE_EPSILON_SQ: f32 = 1.0e-12;

/// Computes the perpendicular vector of a new ring.
///
/// `prev_perp` is the perpendicular of the previous ring, or `Vec3::ZERO` when
/// a segment starts. The result is orthogonal to `axis` and has length
/// `radius`. `axis` must not be zero.
pub fn propagate_perpendicular(axis: Vec3, prev_perp: Vec3, radius: f32) -> Vec3 {
    if prev_perp != Vec3::ZERO {
        let dir = axis.normalize();
        let projected = prev_perp - dir * prev_perp.dot(dir);

        if projected.length_squared() > DEGENERATE_EPSILON_SQ {
            return projected.normalize() * radius;
        }
    }

    seed_perpendicular(axis) * radius
}

/// A unit vector orthogonal to `axis`, derived from a fixed reference.
fn seed_perpendicular(axis: Vec3) -> Vec3 {
    let seed = axis.cross(SEED_REFERENCE);

    if seed.length_squared() > DEGENERATE_EPSILON_SQ {
        seed.normalize()
    } else {
        // The axis is parallel to the reference.
        axis.normalize().any_orthonormal_vector()
    }
}

/// Pushes `nsubdiv` vertices on a ring around `center`.
///
/// Vertex `i` sits at `center + rotate(perp, axis, i * 2π / nsubdiv)`.
#[inline]
pub fn push_ring(
    center: Vec3,
    axis: Vec3,
    perp: Vec3,
    nsubdiv: u32,
    color_mode: &ColorMode,
    point_index: usize,
    out: &mut Vec<Vertex>,
) {
    let dir = axis.normalize();
    let dtheta = std::f32::consts::TAU / nsubdiv as f32;
    let invsubdiv = 1.0 / nsubdiv as f32;

    for i in 0..nsubdiv {
        let offset = Quat::from_axis_angle(dir, i as f32 * dtheta) * perp;
        let normal = offset.normalize();
        let color = color_mode.vertex_color(normal, point_index);
        let uv = Vec2::new(i as f32 * invsubdiv, point_index as f32);

        out.push(Vertex::new(center + offset, normal, color, uv));
    }
}

/// Pushes the side-wall triangles joining the ring that starts at
/// `start - nsubdiv` to the ring that starts at `start`.
///
/// Each of the `nsubdiv` faces emits two triangles. The last face wraps around
/// to the first vertex of each ring. `start` must be at least `nsubdiv`.
#[inline]
pub fn push_side_wall_indices(start: VertexIndex, nsubdiv: u32, out: &mut Vec<VertexIndex>) {
    debug_assert!(start >= nsubdiv);

    for i in 0..nsubdiv {
        let idx = start + i;
        let next = if i == nsubdiv - 1 { start } else { idx + 1 };

        out.extend_from_slice(&[
            idx,
            idx - nsubdiv,
            next - nsubdiv,
            idx,
            next - nsubdiv,
            next,
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1.0e-5;

    #[test]
    fn seeded_perpendicular_is_orthogonal() {
        let axis = Vec3::new(0.3, -1.0, 2.0);
        let perp = propagate_perpendicular(axis, Vec3::ZERO, 0.25);
        assert!(perp.dot(axis).abs() < EPS);
        assert!((perp.length() - 0.25).abs() < EPS);
    }

    #[test]
    fn seed_survives_axis_parallel_to_reference() {
        let perp = propagate_perpendicular(Vec3::ONE, Vec3::ZERO, 1.0);
        assert!(perp.dot(Vec3::ONE).abs() < EPS);
        assert!((perp.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn propagation_keeps_orientation_on_straight_line() {
        let first = propagate_perpendicular(Vec3::X, Vec3::ZERO, 0.1);
        let second = propagate_perpendicular(Vec3::X, first, 0.1);
        assert!((first - second).length() < EPS);
    }

    #[test]
    fn propagation_reseeds_when_projection_vanishes() {
        let perp = propagate_perpendicular(Vec3::Y, Vec3::Y * 0.5, 0.1);
        assert!(perp.dot(Vec3::Y).abs() < EPS);
        assert!((perp.length() - 0.1).abs() < EPS);
    }

    #[test]
    fn ring_vertices_lie_on_circle() {
        let mut out = Vec::new();
        let center = Vec3::new(1.0, 2.0, 3.0);
        let perp = Vec3::Y * 0.5;
        push_ring(center, Vec3::X, perp, 8, &ColorMode::Normal, 0, &mut out);

        assert_eq!(out.len(), 8);
        for v in &out {
            let offset = v.position() - center;
            assert!((offset.length() - 0.5).abs() < EPS);
            assert!(offset.dot(Vec3::X).abs() < EPS);
            assert!((v.normal() - offset.normalize()).length() < EPS);
        }
        // First vertex is the unrotated perpendicular.
        assert!((out[0].position() - (center + perp)).length() < EPS);
    }

    #[test]
    fn side_wall_wraps_to_ring_start() {
        let mut out = Vec::new();
        push_side_wall_indices(8, 8, &mut out);

        assert_eq!(out.len(), 48);
        assert!(out.iter().all(|&i| i < 16));
        assert_eq!(&out[..6], &[8, 0, 1, 8, 1, 9]);
        assert_eq!(&out[42..], &[15, 7, 0, 15, 0, 8]);
    }
}
