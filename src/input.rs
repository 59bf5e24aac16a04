//! Turning a tracked pointer into stroke points.
//!
//! The host samples a pointer position once per frame (typically a point a few
//! centimeters in front of the camera) and feeds it to a [`BrushController`]
//! together with the state of the draw button. The controller smooths the
//! motion, spaces the points, picks a radius from the drawing speed and
//! appends to the shared mesh.

use crate::color::{self, Color};
use crate::stroke::{AddPoint, ColorMode, SharedStrokeMesh};
use glamx::{Mat4, Vec3};

/// Distance in front of the camera at which [`PointerSample::ahead_of`] places
/// the pointer.
pub const DEFAULT_REACH: f32 = 0.12;

/// One pointer reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    /// World-space pointer position.
    pub position: Vec3,
    /// Camera-to-world transform at sampling time.
    pub camera: Mat4,
    /// `false` when tracking is lost; such samples only feed the smoothing.
    pub valid: bool,
}

impl PointerSample {
    /// A sample with no tracking.
    pub fn invalid() -> PointerSample {
        PointerSample {
            position: Vec3::ZERO,
            camera: Mat4::IDENTITY,
            valid: false,
        }
    }

    /// The point `reach` units along the camera's forward axis (-Z).
    pub fn ahead_of(camera: Mat4, reach: f32) -> PointerSample {
        let eye = camera.w_axis.truncate();
        let forward = -camera.z_axis.truncate().normalize_or_zero();
        PointerSample {
            position: eye + forward * reach,
            camera,
            valid: true,
        }
    }
}

/// Something that yields one pointer sample per frame, e.g. an AR session.
pub trait PoseSource {
    /// The current pointer.
    fn sample(&mut self) -> PointerSample;
}

impl<F: FnMut() -> PointerSample> PoseSource for F {
    fn sample(&mut self) -> PointerSample {
        self()
    }
}

/// Tuning of a [`BrushController`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrushConfig {
    /// Fraction of the gap to the raw pointer closed each tick.
    pub smoothing: f32,
    /// A point closer than this to the previous one is skipped.
    pub min_spacing: f32,
    /// Radius at the start of a segment.
    pub min_radius: f32,
    /// Radius growth is capped at `min_radius + max_radius_gain`.
    pub max_radius_gain: f32,
    /// Segment length giving a radius gain of `radius_scale`.
    pub reference_length: f32,
    pub radius_scale: f32,
    /// Fraction of the gap to the target radius closed per point.
    pub radius_easing: f32,
    /// Point count is logged every this many ticks. Zero disables it.
    pub log_interval: u64,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.4,
            min_spacing: 0.001,
            min_radius: 0.001,
            max_radius_gain: 0.015,
            reference_length: 0.005,
            radius_scale: 0.005,
            radius_easing: 0.075,
            log_interval: 100,
        }
    }
}

impl BrushConfig {
    /// The radius a segment of length `len` pulls towards.
    pub fn target_radius(&self, len: f32) -> f32 {
        let ratio = len / self.reference_length;
        self.min_radius + (self.radius_scale * ratio * ratio).min(self.max_radius_gain)
    }
}

/// Per-frame brush state: smoothing, spacing, radius easing and coloring.
#[derive(Clone, Debug)]
pub struct BrushController {
    config: BrushConfig,
    pressed: bool,
    split_pending: bool,
    smoothed: Option<Vec3>,
    radius: f32,
    color: Color,
    color_mode: ColorMode,
    ticks: u64,
}

impl Default for BrushController {
    fn default() -> Self {
        Self::new(BrushConfig::default())
    }
}

impl BrushController {
    pub fn new(config: BrushConfig) -> BrushController {
        BrushController {
            config,
            pressed: false,
            split_pending: false,
            smoothed: None,
            radius: config.min_radius,
            color: color::BRUSH_ORANGE,
            color_mode: ColorMode::Rainbow,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &BrushConfig {
        &self.config
    }

    /// Starts drawing. The next point begins a new segment.
    pub fn press(&mut self) {
        self.pressed = true;
        self.split_pending = true;
        self.smoothed = None;
    }

    /// Stops drawing.
    pub fn release(&mut self) {
        self.pressed = false;
    }

    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// The radius used for the last point.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// The smoothed pointer position, once a sample has been seen.
    #[inline]
    pub fn smoothed_position(&self) -> Option<Vec3> {
        self.smoothed
    }

    #[inline]
    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Moves to the next coloring mode: Solid, Normal, Rainbow, Solid...
    pub fn toggle_color_mode(&mut self) -> ColorMode {
        self.color_mode = self.color_mode.cycle(self.color);
        log::debug!("Brush color mode: {:?}", self.color_mode);
        self.color_mode
    }

    /// Sets the solid brush color and switches to it.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.color_mode = ColorMode::Solid(color);
    }

    /// Clears the drawing. A held button starts a fresh segment.
    pub fn clear(&mut self, mesh: &SharedStrokeMesh) {
        mesh.clear();
        self.split_pending = true;
        self.radius = self.config.min_radius;
    }

    /// Samples `source` and runs one tick.
    pub fn tick<P: PoseSource + ?Sized>(
        &mut self,
        mesh: &SharedStrokeMesh,
        source: &mut P,
    ) -> Option<AddPoint> {
        let sample = source.sample();
        self.update(mesh, sample)
    }

    /// Runs one tick with `sample`.
    ///
    /// Returns the outcome of the point added this tick, if any.
    pub fn update(&mut self, mesh: &SharedStrokeMesh, sample: PointerSample) -> Option<AddPoint> {
        let smoothed = {
            let avg = self.smoothed.get_or_insert(sample.position);
            *avg -= (*avg - sample.position) * self.config.smoothing;
            *avg
        };

        let outcome = if self.pressed && sample.valid {
            let mut mesh = mesh.lock();
            let far_enough = mesh
                .last_point()
                .map_or(true, |last| last.distance(sample.position) > self.config.min_spacing);

            if far_enough {
                let target = match mesh.last_segment_length() {
                    Some(len) if !self.split_pending => self.config.target_radius(len),
                    _ => {
                        self.radius = self.config.min_radius;
                        self.config.min_radius
                    }
                };
                self.radius -= (self.radius - target) * self.config.radius_easing;

                let outcome =
                    mesh.add_point(smoothed, self.radius, self.color_mode, self.split_pending);
                self.split_pending = false;
                Some(outcome)
            } else {
                None
            }
        } else {
            None
        };

        if self.config.log_interval > 0 && self.ticks % self.config.log_interval == 0 {
            log::debug!("{} points", mesh.snapshot().point_count);
        }
        self.ticks += 1;

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::StrokeConfig;

    fn at(x: f32) -> PointerSample {
        PointerSample {
            position: Vec3::new(x, 0.0, 0.0),
            camera: Mat4::IDENTITY,
            valid: true,
        }
    }

    fn mesh() -> SharedStrokeMesh {
        SharedStrokeMesh::new(StrokeConfig::new().with_max_points(1000)).unwrap()
    }

    #[test]
    fn released_brush_draws_nothing() {
        let mesh = mesh();
        let mut brush = BrushController::default();
        assert_eq!(brush.update(&mesh, at(0.0)), None);
        assert_eq!(brush.update(&mesh, at(1.0)), None);
        assert!(mesh.lock().is_empty());
    }

    #[test]
    fn pointer_is_smoothed() {
        let mesh = mesh();
        let mut brush = BrushController::default();
        brush.press();
        brush.update(&mesh, at(0.0));
        brush.update(&mesh, at(1.0));

        let points = mesh.lock().points().to_vec();
        assert_eq!(points[0], Vec3::ZERO);
        assert!((points[1].x - 0.4).abs() < 1.0e-6);
    }

    #[test]
    fn close_samples_are_skipped() {
        let mesh = mesh();
        let mut brush = BrushController::default();
        brush.press();
        assert_eq!(brush.update(&mesh, at(0.0)), Some(AddPoint::Recorded));
        assert_eq!(brush.update(&mesh, at(0.0005)), None);
        assert_eq!(mesh.snapshot().point_count, 1);
    }

    #[test]
    fn invalid_samples_add_nothing() {
        let mesh = mesh();
        let mut brush = BrushController::default();
        brush.press();
        assert_eq!(brush.update(&mesh, PointerSample::invalid()), None);
        assert!(mesh.lock().is_empty());
    }

    #[test]
    fn radius_grows_with_speed_and_stays_bounded() {
        let mesh = mesh();
        let mut brush = BrushController::default();
        brush.press();
        for i in 0..200 {
            brush.update(&mesh, at(i as f32 * 0.05));
        }
        let config = *brush.config();
        assert!(brush.radius() > config.min_radius);
        assert!(brush.radius() <= config.min_radius + config.max_radius_gain + 1.0e-6);
    }

    #[test]
    fn target_radius_curve() {
        let config = BrushConfig::default();
        assert_eq!(config.target_radius(0.0), 0.001);
        assert!((config.target_radius(0.005) - 0.006).abs() < 1.0e-6);
        assert!((config.target_radius(1.0) - 0.016).abs() < 1.0e-6);
    }

    #[test]
    fn each_press_starts_a_segment() {
        let mesh = mesh();
        let mut brush = BrushController::default();

        brush.press();
        brush.update(&mesh, at(0.0));
        assert!(matches!(
            brush.update(&mesh, at(0.1)),
            Some(AddPoint::Extended { .. })
        ));
        brush.release();

        brush.press();
        assert_eq!(brush.update(&mesh, at(0.5)), Some(AddPoint::Recorded));
        assert_eq!(brush.radius(), 0.001);
    }

    #[test]
    fn color_modes_cycle() {
        let mut brush = BrushController::default();
        brush.set_color(color::RED);
        assert_eq!(brush.toggle_color_mode(), ColorMode::Normal);
        assert_eq!(brush.toggle_color_mode(), ColorMode::Rainbow);
        assert_eq!(brush.toggle_color_mode(), ColorMode::Solid(color::RED));
    }

    #[test]
    fn pose_source_closure() {
        let mesh = mesh();
        let mut brush = BrushController::default();
        let mut x = 0.0;
        let mut source = || {
            x += 0.01;
            at(x)
        };
        brush.press();
        for _ in 0..5 {
            brush.tick(&mesh, &mut source);
        }
        assert_eq!(mesh.snapshot().point_count, 5);
    }

    #[test]
    fn ahead_of_camera() {
        let camera = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let sample = PointerSample::ahead_of(camera, DEFAULT_REACH);
        assert!(sample.valid);
        assert!((sample.position - Vec3::new(0.0, 1.0, -0.12)).length() < 1.0e-6);
    }
}
