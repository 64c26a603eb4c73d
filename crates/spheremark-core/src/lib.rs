//! spheremark-core — angular measurement on hemispherical (fisheye) images.
//!
//! An operator loads a flat image of a hemispherical view, aligns it behind a
//! fixed measurement disk, then marks point pairs on it; for each pair the
//! crate recovers the true angular separation of the physical directions the
//! points represent, as if they lay on a unit sphere. The workflow stages are:
//!
//! 1. **Adjustment** – position and zoom the source image behind the disk.
//! 2. **Measurement** – pan/zoom the view, mark point pairs, read angles.
//!
//! The coordinate chain is: widget pixels → logical centered view
//! ([`ViewFrame`]) → normalized unit disk → unit sphere ([`Point3d`]), with
//! [`angle_between`] closing the loop.
//!
//! Rendering, raw input polling, and image decoding live outside this crate:
//! callers feed a [`FrameInput`] snapshot into [`Workspace::update`] once per
//! frame and consume the [`RenderModel`] it produces.

pub mod geometry;
pub mod render;
pub mod view;
pub mod workspace;

pub use geometry::{angle_between, DrawPoint, Point2d, Point3d};
pub use render::{BoundaryCircle, ImagePlacement, PairSegment, RenderModel};
pub use view::ViewFrame;
pub use workspace::{FrameInput, InputEvent, NavConfig, Stage, Workspace, ZoomIntent};

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors surfaced by measurement intents. All are advisory and leave the
/// workspace state unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureError {
    /// An add-point intent landed outside the measurement disk.
    OutOfRange { distance: f64, radius: f64 },
    /// A zoom intent would drive the scale to zero, negative, or non-finite.
    InvalidScale { delta: f64 },
}

impl std::fmt::Display for MeasureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { distance, radius } => {
                write!(
                    f,
                    "point out of range: distance {:.3} exceeds disk radius {:.3}",
                    distance, radius
                )
            }
            Self::InvalidScale { delta } => {
                write!(f, "invalid scale factor: {}", delta)
            }
        }
    }
}

impl std::error::Error for MeasureError {}
