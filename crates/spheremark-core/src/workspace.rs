//! Workspace state machine: two-stage measurement workflow.
//!
//! The workspace owns the view frame, the loaded image, and the marked-point
//! stack, and advances once per rendered frame via [`Workspace::update`].
//! Lifecycle per loaded image:
//!
//! 1. **Adjustment** — pan intents move the image offset, zoom intents change
//!    the scale; a confirm intent bakes the zoom into the image's effective
//!    size and transitions to Measurement.
//! 2. **Measurement** — pan intents move the view point; points are pushed
//!    and popped at the tail, stored in the unscaled logical frame, and
//!    rejected when they fall outside the measurement disk.
//!
//! The transition is one-way; only loading a new image returns the workspace
//! to Adjustment.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::geometry::{DrawPoint, Point2d};
use crate::render::{angle_label, pair_angle_deg, BoundaryCircle, ImagePlacement, PairSegment, RenderModel};
use crate::view::ViewFrame;
use crate::MeasureError;

// ── Stage ──────────────────────────────────────────────────────────────────

/// Workflow phase. Transitions are monotonic: Adjustment → Measurement only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Positioning and scaling the source image behind the disk.
    Adjustment,
    /// Placing points and reading angles.
    Measurement,
}

// ── Input intents ──────────────────────────────────────────────────────────

/// Navigation constants. Wrapped in a config so front ends can retune key
/// repeat feel without touching workspace logic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NavConfig {
    /// Scale factor applied per zoom-in step (raised to the multiplier).
    pub zoom_in_step: f64,
    /// Scale factor applied per zoom-out step (raised to the multiplier).
    pub zoom_out_step: f64,
    /// Pan/zoom multiplier while the fast modifier is held.
    pub fast_multiplier: f64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            zoom_in_step: 1.01,
            zoom_out_step: 0.99,
            fast_multiplier: 5.0,
        }
    }
}

/// Zoom direction held during the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZoomIntent {
    #[default]
    None,
    In,
    Out,
}

/// Discrete event observed since the previous frame.
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Confirm image alignment; no-op unless an image is loaded during
    /// Adjustment.
    ConfirmAlignment,
    /// Mark a point at the given screen pixel.
    AddPoint { pixel: Point2d },
    /// Pop the most recent point, if any.
    RemoveLastPoint,
    /// Replace the loaded image and restart the workflow.
    LoadImage(RgbaImage),
}

/// Per-frame input snapshot, assembled by the (external) input layer.
///
/// Continuous state (pan direction, zoom direction, fast modifier) is applied
/// before the discrete events, in a fixed order within one update.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Pan direction in logical units per frame; zero means no pan.
    pub pan: Point2d,
    /// Held zoom direction.
    pub zoom: ZoomIntent,
    /// Fast modifier (the original binds this to Shift).
    pub fast: bool,
    /// Discrete events since the last frame, in arrival order.
    pub events: Vec<InputEvent>,
}

// ── Workspace ──────────────────────────────────────────────────────────────

/// Measurement workspace: view frame, loaded image, marked points, stage.
///
/// Single-threaded and frame-driven: the owner calls [`Workspace::update`]
/// once per rendered frame and reads back a [`RenderModel`]. Every intent is
/// atomic; rejected intents leave the state untouched.
#[derive(Debug)]
pub struct Workspace {
    frame: ViewFrame,
    config: NavConfig,
    image: Option<RgbaImage>,
    points: Vec<DrawPoint>,
    stage: Stage,
}

impl Workspace {
    /// Create a workspace for a widget at `(left, top)` with the given size.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::with_config(left, top, width, height, NavConfig::default())
    }

    /// Create with custom navigation constants.
    pub fn with_config(left: f64, top: f64, width: f64, height: f64, config: NavConfig) -> Self {
        Self {
            frame: ViewFrame::new(left, top, width, height),
            config,
            image: None,
            points: Vec::new(),
            stage: Stage::Adjustment,
        }
    }

    /// Current workflow stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// View frame (read-only).
    pub fn frame(&self) -> &ViewFrame {
        &self.frame
    }

    /// Marked points in insertion order, unscaled logical frame.
    pub fn points(&self) -> &[DrawPoint] {
        &self.points
    }

    /// The loaded bitmap, immutable once set until replaced.
    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// Load a new image: clears marked points, resets the view frame, and
    /// restarts the workflow at Adjustment.
    pub fn load_image(&mut self, image: RgbaImage) {
        self.image = Some(image);
        self.points.clear();
        self.frame.reset();
        self.stage = Stage::Adjustment;
    }

    /// Confirm alignment: bake the current zoom into the image's effective
    /// size and transition to Measurement. No-op without a loaded image or
    /// outside Adjustment.
    pub fn confirm_alignment(&mut self) {
        if self.stage != Stage::Adjustment || self.image.is_none() {
            return;
        }
        self.frame.bake_zoom();
        self.stage = Stage::Measurement;
    }

    /// Pan: moves the image offset during Adjustment, the view point during
    /// Measurement.
    pub fn pan(&mut self, delta: Point2d, multiplier: f64) {
        match self.stage {
            Stage::Adjustment => self.frame.pan_image(delta, multiplier),
            Stage::Measurement => self.frame.pan_view(delta, multiplier),
        }
    }

    /// Zoom in by one step raised to the multiplier.
    pub fn zoom_in(&mut self, multiplier: f64) -> Result<(), MeasureError> {
        self.frame.change_scale(self.config.zoom_in_step.powf(multiplier))
    }

    /// Zoom out by one step raised to the multiplier.
    pub fn zoom_out(&mut self, multiplier: f64) -> Result<(), MeasureError> {
        self.frame.change_scale(self.config.zoom_out_step.powf(multiplier))
    }

    /// Apply an exact zoom factor, pivot-preserving. Used by front ends that
    /// compute their own deltas (scroll wheels, scripted alignment).
    pub fn change_scale(&mut self, delta: f64) -> Result<(), MeasureError> {
        self.frame.change_scale(delta)
    }

    /// Mark a point at a screen pixel.
    ///
    /// The pixel is mapped to the unscaled logical frame (so later zoom does
    /// not move stored points relative to the image) and appended, but only
    /// when its distance from the origin is within the disk radius
    /// (inclusive). Out-of-disk points are rejected without touching state.
    /// Point editing belongs to Measurement; during Adjustment this is a
    /// no-op.
    pub fn add_point_at(&mut self, pixel: Point2d) -> Result<(), MeasureError> {
        if self.stage != Stage::Measurement {
            return Ok(());
        }
        let local = self.frame.to_local(pixel) - self.frame.view_point - self.frame.center();
        let point = DrawPoint::from_cartesian(local) * (1.0 / self.frame.scale());
        if point.distance > self.frame.radius() {
            return Err(MeasureError::OutOfRange {
                distance: point.distance,
                radius: self.frame.radius(),
            });
        }
        self.points.push(point);
        Ok(())
    }

    /// Pop the most recent point. Returns `None` (and does nothing) when the
    /// stack is empty or the stage is not Measurement.
    pub fn remove_last_point(&mut self) -> Option<DrawPoint> {
        if self.stage != Stage::Measurement {
            return None;
        }
        self.points.pop()
    }

    /// Advance one frame: continuous pan/zoom first, then discrete events in
    /// arrival order. Rejected intents are logged and dropped; nothing here
    /// is fatal.
    pub fn update(&mut self, input: FrameInput) {
        let multiplier = if input.fast {
            self.config.fast_multiplier
        } else {
            1.0
        };

        if input.pan != Point2d::default() {
            self.pan(input.pan, multiplier);
        }
        let zoomed = match input.zoom {
            ZoomIntent::None => Ok(()),
            ZoomIntent::In => self.zoom_in(multiplier),
            ZoomIntent::Out => self.zoom_out(multiplier),
        };
        if let Err(err) = zoomed {
            tracing::warn!("zoom rejected: {err}");
        }

        for event in input.events {
            match event {
                InputEvent::ConfirmAlignment => self.confirm_alignment(),
                InputEvent::AddPoint { pixel } => {
                    if let Err(err) = self.add_point_at(pixel) {
                        tracing::warn!("{err}");
                    }
                }
                InputEvent::RemoveLastPoint => {
                    self.remove_last_point();
                }
                InputEvent::LoadImage(image) => self.load_image(image),
            }
        }
    }

    /// Produce the drawing description for the current state. Pure: no
    /// mutation, callable any number of times per frame.
    pub fn render_model(&self) -> RenderModel {
        let pov = self.frame.pivot();
        let scale = self.frame.scale();
        let radius = self.frame.radius();

        let image = self.image.as_ref().map(|img| {
            let image_scale = self.frame.image_scale();
            ImagePlacement {
                position: (pov + self.frame.image_offset * image_scale).to_array(),
                scale: image_scale,
                size_px: [img.width(), img.height()],
            }
        });

        // During Adjustment the disk stays at its native size; once measuring,
        // it zooms with the scene.
        let boundary = BoundaryCircle {
            center: pov.to_array(),
            radius: match self.stage {
                Stage::Adjustment => radius,
                Stage::Measurement => radius * scale,
            },
        };

        let markers = self
            .points
            .iter()
            .map(|&p| (pov + (p * scale).to_cartesian()).to_array())
            .collect();

        let pairs = self
            .points
            .chunks_exact(2)
            .map(|pair| {
                let (a, b) = (pair[0], pair[1]);
                let angle_deg = pair_angle_deg(a, b, radius);
                PairSegment {
                    start: (pov + (a * scale).to_cartesian()).to_array(),
                    end: (pov + (b * scale).to_cartesian()).to_array(),
                    label_pos: (pov + ((a + b) * (0.5 * scale)).to_cartesian()).to_array(),
                    angle_deg,
                    label: angle_deg.map(angle_label),
                }
            })
            .collect();

        RenderModel {
            image,
            boundary,
            pivot: pov.to_array(),
            markers,
            pairs,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // 200x200 widget at the origin: center (100, 100), disk radius 100.
    fn workspace() -> Workspace {
        Workspace::new(0.0, 0.0, 200.0, 200.0)
    }

    fn measuring_workspace() -> Workspace {
        let mut w = workspace();
        w.load_image(RgbaImage::new(64, 48));
        w.confirm_alignment();
        w
    }

    #[test]
    fn starts_in_adjustment_without_image() {
        let w = workspace();
        assert_eq!(w.stage(), Stage::Adjustment);
        assert!(w.image().is_none());
        assert!(w.points().is_empty());
    }

    #[test]
    fn confirm_without_image_is_a_noop() {
        let mut w = workspace();
        w.confirm_alignment();
        assert_eq!(w.stage(), Stage::Adjustment);
    }

    #[test]
    fn stage_transition_is_one_way() {
        let mut w = workspace();
        w.load_image(RgbaImage::new(8, 8));
        w.confirm_alignment();
        assert_eq!(w.stage(), Stage::Measurement);

        // A second confirm does not leave Measurement, and nothing short of
        // a new image load returns to Adjustment.
        w.confirm_alignment();
        assert_eq!(w.stage(), Stage::Measurement);
    }

    #[test]
    fn loading_a_new_image_restarts_the_workflow() {
        let mut w = measuring_workspace();
        w.add_point_at(Point2d::new(150.0, 100.0)).unwrap();
        assert_eq!(w.points().len(), 1);

        w.load_image(RgbaImage::new(32, 32));
        assert_eq!(w.stage(), Stage::Adjustment);
        assert!(w.points().is_empty());
        assert_eq!(w.frame().scale(), 1.0);
        assert_eq!(w.frame().view_point, Point2d::default());
    }

    #[test]
    fn confirm_bakes_zoom_and_resets_scale() {
        let mut w = workspace();
        w.load_image(RgbaImage::new(8, 8));
        w.zoom_in(10.0).unwrap();
        let aligned_scale = w.frame().scale();
        w.confirm_alignment();
        assert_eq!(w.frame().scale(), 1.0);
        assert_relative_eq!(w.frame().image_scale(), aligned_scale, epsilon = 1e-12);
    }

    #[test]
    fn pan_targets_image_offset_during_adjustment() {
        let mut w = workspace();
        w.load_image(RgbaImage::new(8, 8));
        w.pan(Point2d::new(3.0, -2.0), 5.0);
        assert_eq!(w.frame().image_offset, Point2d::new(15.0, -10.0));
        assert_eq!(w.frame().view_point, Point2d::default());
    }

    #[test]
    fn pan_targets_view_point_during_measurement() {
        let mut w = measuring_workspace();
        w.pan(Point2d::new(3.0, -2.0), 5.0);
        assert_eq!(w.frame().view_point, Point2d::new(15.0, -10.0));
        assert_eq!(w.frame().image_offset, Point2d::default());
    }

    #[test]
    fn add_point_inside_disk_is_stored() {
        let mut w = measuring_workspace();
        w.add_point_at(Point2d::new(150.0, 100.0)).unwrap();
        assert_eq!(w.points().len(), 1);
        assert_relative_eq!(w.points()[0].distance, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn add_point_on_boundary_is_accepted() {
        let mut w = measuring_workspace();
        // Exactly on the disk rim: distance == radius, inclusive bound.
        w.add_point_at(Point2d::new(200.0, 100.0)).unwrap();
        assert_eq!(w.points().len(), 1);
        assert_relative_eq!(w.points()[0].distance, 100.0, epsilon = 1e-12);
    }

    #[test]
    fn add_point_outside_disk_is_rejected() {
        let mut w = measuring_workspace();
        let err = w.add_point_at(Point2d::new(201.0, 100.0)).unwrap_err();
        assert!(matches!(err, MeasureError::OutOfRange { .. }));
        assert!(w.points().is_empty());
    }

    #[test]
    fn add_point_during_adjustment_is_a_noop() {
        let mut w = workspace();
        w.load_image(RgbaImage::new(8, 8));
        w.add_point_at(Point2d::new(150.0, 100.0)).unwrap();
        assert!(w.points().is_empty());
    }

    #[test]
    fn points_are_stored_in_the_unscaled_frame() {
        let mut w = measuring_workspace();
        w.frame.change_scale(2.0).unwrap();
        w.add_point_at(Point2d::new(150.0, 100.0)).unwrap();
        // Screen distance 50 at scale 2 stores as 25 logical units.
        assert_relative_eq!(w.points()[0].distance, 25.0, epsilon = 1e-12);

        // The marker renders back at the captured screen position.
        let model = w.render_model();
        assert_relative_eq!(model.markers[0][0], 150.0, epsilon = 1e-9);
        assert_relative_eq!(model.markers[0][1], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn remove_pops_the_tail_and_tolerates_empty() {
        let mut w = measuring_workspace();
        assert!(w.remove_last_point().is_none());
        assert!(w.points().is_empty());

        w.add_point_at(Point2d::new(150.0, 100.0)).unwrap();
        w.add_point_at(Point2d::new(100.0, 150.0)).unwrap();
        let popped = w.remove_last_point().unwrap();
        assert_relative_eq!(popped.distance, 50.0, epsilon = 1e-12);
        assert_eq!(w.points().len(), 1);
    }

    #[test]
    fn update_applies_pan_before_discrete_events() {
        let mut w = measuring_workspace();
        w.update(FrameInput {
            pan: Point2d::new(10.0, 0.0),
            events: vec![InputEvent::AddPoint {
                pixel: Point2d::new(160.0, 100.0),
            }],
            ..Default::default()
        });
        // The pan moved the view point to (10, 0) first, so the pixel lands
        // 50 logical units from the origin, not 60.
        assert_relative_eq!(w.points()[0].distance, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn update_applies_fast_zoom_steps() {
        let mut w = measuring_workspace();
        w.update(FrameInput {
            zoom: ZoomIntent::In,
            fast: true,
            ..Default::default()
        });
        assert_relative_eq!(w.frame().scale(), 1.01_f64.powf(5.0), epsilon = 1e-12);

        w.update(FrameInput {
            zoom: ZoomIntent::Out,
            fast: false,
            ..Default::default()
        });
        assert_relative_eq!(
            w.frame().scale(),
            1.01_f64.powf(5.0) * 0.99,
            epsilon = 1e-12
        );
    }

    #[test]
    fn update_routes_load_and_confirm_events() {
        let mut w = workspace();
        w.update(FrameInput {
            events: vec![
                InputEvent::LoadImage(RgbaImage::new(16, 16)),
                InputEvent::ConfirmAlignment,
            ],
            ..Default::default()
        });
        assert_eq!(w.stage(), Stage::Measurement);
        assert!(w.image().is_some());
    }

    #[test]
    fn render_model_without_image_has_no_placement() {
        let w = workspace();
        let model = w.render_model();
        assert!(model.image.is_none());
        assert_eq!(model.boundary.center, [100.0, 100.0]);
        assert_eq!(model.boundary.radius, 100.0);
        assert_eq!(model.pivot, [100.0, 100.0]);
    }

    #[test]
    fn boundary_radius_scales_only_while_measuring() {
        let mut w = workspace();
        w.load_image(RgbaImage::new(8, 8));
        w.frame.change_scale(2.0).unwrap();
        assert_eq!(w.render_model().boundary.radius, 100.0);

        w.confirm_alignment();
        w.frame.change_scale(2.0).unwrap();
        assert_relative_eq!(w.render_model().boundary.radius, 200.0, epsilon = 1e-12);
    }

    #[test]
    fn image_placement_follows_offset_and_baked_zoom() {
        let mut w = workspace();
        w.load_image(RgbaImage::new(64, 48));
        w.pan(Point2d::new(1.0, 2.0), 10.0); // image_offset = (10, 20)
        w.frame.change_scale(1.5).unwrap();
        w.confirm_alignment();

        let model = w.render_model();
        let placement = model.image.unwrap();
        assert_eq!(placement.size_px, [64, 48]);
        assert_relative_eq!(placement.scale, 1.5, epsilon = 1e-12);
        // pivot (100,100) + image_offset * image_scale
        assert_relative_eq!(placement.position[0], 115.0, epsilon = 1e-9);
        assert_relative_eq!(placement.position[1], 130.0, epsilon = 1e-9);
    }

    #[test]
    fn pairs_group_consecutively_and_skip_odd_trailing_point() {
        let mut w = measuring_workspace();
        w.add_point_at(Point2d::new(200.0, 100.0)).unwrap(); // (100, 0)
        w.add_point_at(Point2d::new(0.0, 100.0)).unwrap(); // (-100, 0)
        w.add_point_at(Point2d::new(100.0, 150.0)).unwrap(); // unpaired

        let model = w.render_model();
        assert_eq!(model.markers.len(), 3);
        assert_eq!(model.pairs.len(), 1);

        let pair = &model.pairs[0];
        assert_relative_eq!(pair.start[0], 200.0, epsilon = 1e-9);
        assert_relative_eq!(pair.end[0], 0.0, epsilon = 1e-9);
        // Midpoint of two opposite rim points is the pivot.
        assert_relative_eq!(pair.label_pos[0], 100.0, epsilon = 1e-9);
        assert_relative_eq!(pair.label_pos[1], 100.0, epsilon = 1e-9);
        // Opposite rim points subtend half the sphere.
        assert_relative_eq!(pair.angle_deg.unwrap(), 180.0, epsilon = 1e-6);
        assert_eq!(pair.label.as_deref(), Some("180.00°"));
    }

    #[test]
    fn pair_angle_uses_unscaled_coordinates() {
        let mut w = measuring_workspace();
        w.add_point_at(Point2d::new(100.0, 100.0)).unwrap(); // center
        w.add_point_at(Point2d::new(200.0, 100.0)).unwrap(); // rim

        let before = w.render_model().pairs[0].angle_deg.unwrap();
        w.frame.change_scale(3.0).unwrap();
        let after = w.render_model().pairs[0].angle_deg.unwrap();

        // Zooming the view must not change the measured angle.
        assert_relative_eq!(before, 90.0, epsilon = 1e-9);
        assert_relative_eq!(after, before, epsilon = 1e-12);
    }
}
