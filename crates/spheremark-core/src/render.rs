//! Render model: 2D drawing instructions produced by the workspace.
//!
//! The model is a plain serializable description — positions are widget-local
//! pixels, already transformed through the view frame. The rendering layer
//! draws it without touching measurement state; the CLI serializes it as-is.

use serde::{Deserialize, Serialize};

use crate::geometry::{angle_between, DrawPoint, Point3d};

/// Placement of the loaded image, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePlacement {
    /// Top-left corner in widget-local pixels.
    pub position: [f64; 2],
    /// Effective scale factor to apply to the bitmap.
    pub scale: f64,
    /// Source bitmap size [width, height] in pixels.
    pub size_px: [u32; 2],
}

/// The measurement disk boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryCircle {
    /// Center in widget-local pixels.
    pub center: [f64; 2],
    /// Radius in widget-local pixels.
    pub radius: f64,
}

/// A measured point pair: connecting line plus angle label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSegment {
    /// Line start in widget-local pixels.
    pub start: [f64; 2],
    /// Line end in widget-local pixels.
    pub end: [f64; 2],
    /// Label anchor at the pair midpoint.
    pub label_pos: [f64; 2],
    /// Angular separation in degrees; `None` when the back-projection is
    /// degenerate and no angle can be shown.
    pub angle_deg: Option<f64>,
    /// Display text, e.g. `"127.78°"`; `None` together with `angle_deg`.
    pub label: Option<String>,
}

/// Complete per-frame drawing description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderModel {
    /// Image placement, absent until an image is loaded.
    pub image: Option<ImagePlacement>,
    /// Disk boundary circle.
    pub boundary: BoundaryCircle,
    /// Pivot marker position (screen position of the logical origin).
    pub pivot: [f64; 2],
    /// Marker positions for every stored point, in insertion order.
    pub markers: Vec<[f64; 2]>,
    /// One segment per completed pair; an odd trailing point produces none.
    pub pairs: Vec<PairSegment>,
}

/// Angular separation of two stored points, in degrees.
///
/// Both points are taken in the unscaled logical frame, mapped into the unit
/// disk of the given radius, back-projected onto the near hemisphere, and
/// measured with [`angle_between`]. Returns `None` when either back-projected
/// vector is degenerate (cannot be normalized).
pub fn pair_angle_deg(a: DrawPoint, b: DrawPoint, radius: f64) -> Option<f64> {
    let pa = Point3d::from_disk(a.to_cartesian(), radius).normalized()?;
    let pb = Point3d::from_disk(b.to_cartesian(), radius).normalized()?;
    Some(angle_between(pa, pb).to_degrees())
}

/// Two-decimal degree label, e.g. `"127.78°"`.
pub fn angle_label(angle_deg: f64) -> String {
    format!("{:.2}°", angle_deg)
}

// ── Tests ──────────────────────────────────────────────────────────────────
