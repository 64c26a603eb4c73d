//! View frame: widget-pixel ↔ logical-scene coordinate mapping.
//!
//! The logical scene is centered on a pivot — the widget's geometric center
//! displaced by a user-controlled view point — and zoomed by a single
//! multiplicative scale. Zoom is pivot-preserving: rescaling the view point
//! through its polar form keeps whatever the pivot points at fixed on screen.

use crate::geometry::{DrawPoint, Point2d};
use crate::MeasureError;

/// Coordinate frame of the measurement widget.
///
/// Pan and offset adjustment are linear and unbounded; off-screen states are
/// legal. The scale is kept strictly positive.
#[derive(Debug, Clone)]
pub struct ViewFrame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    center: Point2d,
    radius: f64,
    /// Pan offset of the scene pivot.
    pub view_point: Point2d,
    /// Image placement offset, adjusted during alignment.
    pub image_offset: Point2d,
    scale: f64,
    /// Alignment zoom folded into the image's effective size at confirm
    /// time; the bitmap itself is never resampled.
    baked_zoom: f64,
}

impl ViewFrame {
    /// Create a frame for a widget at `(left, top)` with the given size.
    ///
    /// The measurement disk radius is half the minimum widget dimension.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
            center: Point2d::new(width / 2.0, height / 2.0),
            radius: width.min(height) / 2.0,
            view_point: Point2d::default(),
            image_offset: Point2d::default(),
            scale: 1.0,
            baked_zoom: 0.0,
        }
    }

    /// Widget width in pixels.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Widget height in pixels.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Geometric center of the widget, in widget-local coordinates.
    pub fn center(&self) -> Point2d {
        self.center
    }

    /// Measurement disk radius (half the minimum widget dimension).
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Current zoom factor. Strictly positive.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Effective image scale: current zoom plus the baked alignment zoom.
    pub fn image_scale(&self) -> f64 {
        self.scale + self.baked_zoom
    }

    /// Map a screen pixel into widget-local coordinates.
    pub fn to_local(&self, pixel: Point2d) -> Point2d {
        Point2d::new(pixel.x - self.left, pixel.y - self.top)
    }

    /// Screen position of the logical origin: view point plus widget center.
    pub fn pivot(&self) -> Point2d {
        self.view_point + self.center
    }

    /// Pan the view point. The step scales with the current zoom so screen
    /// motion stays constant across zoom levels.
    pub fn pan_view(&mut self, delta: Point2d, multiplier: f64) {
        self.view_point = self.view_point + delta * (self.scale * multiplier);
    }

    /// Pan the image offset (alignment stage).
    pub fn pan_image(&mut self, delta: Point2d, multiplier: f64) {
        self.image_offset = self.image_offset + delta * multiplier;
    }

    /// Multiply the zoom factor by `delta`, keeping the pivot fixed.
    ///
    /// The view point is rescaled through its polar form (angle preserved,
    /// distance multiplied), and the baked image zoom is renormalized so the
    /// image placement keeps its visual position. Non-positive or non-finite
    /// deltas are rejected with the state unchanged.
    pub fn change_scale(&mut self, delta: f64) -> Result<(), MeasureError> {
        if !delta.is_finite() || delta <= 0.0 {
            return Err(MeasureError::InvalidScale { delta });
        }
        self.view_point = (DrawPoint::from_cartesian(self.view_point) * delta).to_cartesian();
        self.scale *= delta;
        self.baked_zoom *= delta;
        Ok(())
    }

    /// Freeze the current zoom into the image's effective size and reset the
    /// scale to 1.0. Called once when alignment is confirmed; the on-screen
    /// image appearance is unchanged.
    pub fn bake_zoom(&mut self) {
        self.baked_zoom = self.scale - 1.0;
        self.scale = 1.0;
    }

    /// Return pan, zoom, and baked zoom to their initial state. Used when a
    /// new image is loaded.
    pub fn reset(&mut self) {
        self.view_point = Point2d::default();
        self.image_offset = Point2d::default();
        self.scale = 1.0;
        self.baked_zoom = 0.0;
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
