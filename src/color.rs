//! Brush colors.
//!
//! Colors are RGBA with f32 components in the range [0.0, 1.0]. Besides a
//! small palette, this module provides the HSV conversion used by the rainbow
//! brush and the normal-to-color remap used by the normal visualization mode.
//!
//! # Example
//! ```
//! # use arbrush::color;
//! let c = color::hsv(0.0, 1.0, 1.0);
//! assert_eq!(c, color::RED);
//! ```

use glamx::Vec3;

pub use rgb::Rgba;

/// The color type used throughout arbrush. RGBA with f32 components in [0.0, 1.0].
pub type Color = Rgba<f32>;

/// Black (0, 0, 0)
pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

/// White (255, 255, 255)
pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

/// Red (255, 0, 0)
pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

/// Lime (0, 255, 0)
pub const LIME: Color = Color::new(0.0, 1.0, 0.0, 1.0);

/// Blue (0, 0, 255)
pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

/// The default brush color, a warm orange (255, 128, 26).
pub const BRUSH_ORANGE: Color = Color::new(1.0, 0.5, 0.1, 1.0);

/// Transparent color (0, 0, 0, 0).
pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

/// Converts a hue/saturation/value triple to an opaque color.
///
/// `hue` wraps around and is interpreted in turns (1.0 is a full circle);
/// `saturation` and `value` are clamped to [0.0, 1.0].
pub fn hsv(hue: f32, saturation: f32, value: f32) -> Color {
    let h = hue.rem_euclid(1.0) * 6.0;
    let s = saturation.clamp(0.0, 1.0);
    let v = value.clamp(0.0, 1.0);

    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector as u32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    Color::new(r, g, b, 1.0)
}

/// Maps a unit normal from [-1, 1] per axis to a displayable color.
#[inline]
pub fn from_normal(normal: Vec3) -> Color {
    let c = normal * 0.5 + Vec3::splat(0.5);
    Color::new(c.x, c.y, c.z, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color, b: Color) -> bool {
        (a.r - b.r).abs() < 1.0e-5
            && (a.g - b.g).abs() < 1.0e-5
            && (a.b - b.b).abs() < 1.0e-5
            && (a.a - b.a).abs() < 1.0e-5
    }

    #[test]
    fn primary_hues() {
        assert!(close(hsv(0.0, 1.0, 1.0), RED));
        assert!(close(hsv(1.0 / 3.0, 1.0, 1.0), LIME));
        assert!(close(hsv(2.0 / 3.0, 1.0, 1.0), BLUE));
        assert!(close(hsv(1.0, 1.0, 1.0), RED));
    }

    #[test]
    fn zero_saturation_is_gray() {
        let c = hsv(0.42, 0.0, 0.5);
        assert!(close(c, Color::new(0.5, 0.5, 0.5, 1.0)));
    }

    #[test]
    fn normal_remap() {
        assert!(close(from_normal(Vec3::X), Color::new(1.0, 0.5, 0.5, 1.0)));
        assert!(close(from_normal(-Vec3::Z), Color::new(0.5, 0.5, 0.0, 1.0)));
    }
}
