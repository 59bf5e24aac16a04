use crate::error::SetupError;

/// Sizing of a stroke mesh.
///
/// Storage is allocated once from these values and never grows, so they bound
/// the whole drawing session.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrokeConfig {
    /// Number of vertices in each ring around the stroke axis.
    /// Default: 8
    pub verts_per_point: u32,
    /// Maximum number of points a stroke can hold. Further points are dropped.
    /// Default: 20000
    pub max_points: usize,
    /// Radius used when the caller does not pick one.
    /// Default: 0.01
    pub default_radius: f32,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            verts_per_point: 8,
            max_points: 20_000,
            default_radius: 0.01,
        }
    }
}

impl StrokeConfig {
    /// Creates a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of vertices per ring.
    pub fn with_verts_per_point(mut self, verts_per_point: u32) -> Self {
        self.verts_per_point = verts_per_point;
        self
    }

    /// Sets the maximum number of points.
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Sets the default radius.
    pub fn with_default_radius(mut self, radius: f32) -> Self {
        self.default_radius = radius;
        self
    }

    /// Checks that the values describe a usable mesh.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.verts_per_point < 3 {
            return Err(SetupError::InvalidConfig(format!(
                "verts_per_point must be at least 3, got {}",
                self.verts_per_point
            )));
        }
        if self.max_points < 2 {
            return Err(SetupError::InvalidConfig(format!(
                "max_points must be at least 2, got {}",
                self.max_points
            )));
        }
        if self.vertex_capacity() > u32::MAX as usize {
            return Err(SetupError::InvalidConfig(format!(
                "{} vertices do not fit 32-bit indices",
                self.vertex_capacity()
            )));
        }
        Ok(())
    }

    /// Number of vertex slots the mesh storage holds.
    ///
    /// Every point owns at most one ring: a split point becomes the start ring
    /// of the following segment.
    #[inline]
    pub fn vertex_capacity(&self) -> usize {
        self.verts_per_point as usize * self.max_points
    }

    /// Number of index slots the mesh storage holds.
    ///
    /// Each point after the first of a segment adds `6 * verts_per_point`
    /// indices.
    #[inline]
    pub fn index_capacity(&self) -> usize {
        6 * self.verts_per_point as usize * self.max_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacities() {
        let config = StrokeConfig::default();
        assert_eq!(config.vertex_capacity(), 160_000);
        assert_eq!(config.index_capacity(), 960_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_rings() {
        let config = StrokeConfig::new().with_verts_per_point(2);
        assert!(matches!(
            config.validate(),
            Err(SetupError::InvalidConfig(_))
        ));
        assert!(StrokeConfig::new().with_max_points(1).validate().is_err());
    }
}
