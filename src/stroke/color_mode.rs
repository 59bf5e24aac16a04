use crate::color::{self, Color};
use glamx::Vec3;

/// Number of points over which the rainbow brush runs through all hues.
pub const RAINBOW_PERIOD: f32 = 30.0;

/// How ring vertices are colored.
///
/// The policy is chosen by the caller per point, so one stroke may mix modes.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorMode {
    /// Every vertex gets the same color.
    Solid(Color),
    /// Vertices show their normal, remapped to [0, 1].
    Normal,
    /// The hue cycles with the point index.
    Rainbow,
}

impl Default for ColorMode {
    fn default() -> Self {
        ColorMode::Solid(color::BRUSH_ORANGE)
    }
}

impl ColorMode {
    /// The color of a vertex with the given normal, on the ring of point `point_index`.
    #[inline]
    pub fn vertex_color(&self, normal: Vec3, point_index: usize) -> Color {
        match *self {
            ColorMode::Solid(c) => c,
            ColorMode::Normal => color::from_normal(normal),
            ColorMode::Rainbow => {
                let hue = (point_index as f32 / RAINBOW_PERIOD).rem_euclid(1.0);
                color::hsv(hue, 0.95, 0.95)
            }
        }
    }

    /// The next mode in the Solid → Normal → Rainbow cycle.
    ///
    /// Leaving `Normal` or `Rainbow` goes back to `Solid(current)`.
    pub fn cycle(self, current: Color) -> ColorMode {
        match self {
            ColorMode::Solid(_) => ColorMode::Normal,
            ColorMode::Normal => ColorMode::Rainbow,
            ColorMode::Rainbow => ColorMode::Solid(current),
        }
    }
}
