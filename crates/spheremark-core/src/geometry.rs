//! Geometry primitives for hemispherical measurement.
//!
//! Three value types cover the coordinate spaces the measurement pipeline
//! moves through:
//!
//! - [`Point2d`] — Cartesian point in the y-down logical plane.
//! - [`DrawPoint`] — the same plane in polar form, with the angle measured
//!   counter-clockwise from +x in a y-up convention (screen overlays keep the
//!   y-down plane, so `angle = atan2(-y, x)`).
//! - [`Point3d`] — a direction on the unit sphere, obtained from a disk point
//!   by orthographic back-projection onto the near hemisphere.

use serde::{Deserialize, Serialize};

// ── 2D Cartesian ───────────────────────────────────────────────────────────

/// Cartesian point in the y-down logical plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2d {
    pub x: f64,
    pub y: f64,
}

impl Point2d {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point2d) -> f64 {
        (self - other).norm()
    }

    /// Plain `[x, y]` form for render-model output.
    pub fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Vector magnitude.
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn normalized(self) -> Option<Point2d> {
        let n = self.norm();
        if n <= 0.0 || !n.is_finite() {
            return None;
        }
        Some(Point2d::new(self.x / n, self.y / n))
    }
}

impl std::ops::Add for Point2d {
    type Output = Point2d;

    fn add(self, rhs: Point2d) -> Point2d {
        Point2d::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point2d {
    type Output = Point2d;

    fn sub(self, rhs: Point2d) -> Point2d {
        Point2d::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Neg for Point2d {
    type Output = Point2d;

    fn neg(self) -> Point2d {
        Point2d::new(-self.x, -self.y)
    }
}

impl std::ops::Mul<f64> for Point2d {
    type Output = Point2d;

    fn mul(self, s: f64) -> Point2d {
        Point2d::new(self.x * s, self.y * s)
    }
}

// ── 2D polar ───────────────────────────────────────────────────────────────

/// Polar point around the logical origin.
///
/// `angle` follows the y-up mathematical convention while the underlying
/// plane stays y-down, so conversion negates the y coordinate both ways.
/// Scalar multiplication scales `distance` and leaves `angle` untouched,
/// which is what makes zoom a pure radial operation on stored points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawPoint {
    /// Radians counter-clockwise from +x (y-up convention).
    pub angle: f64,
    /// Distance from the origin.
    pub distance: f64,
}

impl DrawPoint {
    pub fn new(angle: f64, distance: f64) -> Self {
        Self { angle, distance }
    }

    /// Convert from a Cartesian point in the y-down plane.
    pub fn from_cartesian(p: Point2d) -> Self {
        Self {
            angle: (-p.y).atan2(p.x),
            distance: p.x.hypot(p.y),
        }
    }

    /// Project back to the y-down Cartesian plane.
    pub fn to_cartesian(self) -> Point2d {
        Point2d::new(
            self.distance * self.angle.cos(),
            -self.distance * self.angle.sin(),
        )
    }
}

// Addition and subtraction go through the Cartesian plane; summing polar
// components directly would be wrong for anything not collinear.
impl std::ops::Add for DrawPoint {
    type Output = DrawPoint;

    fn add(self, rhs: DrawPoint) -> DrawPoint {
        DrawPoint::from_cartesian(self.to_cartesian() + rhs.to_cartesian())
    }
}

impl std::ops::Sub for DrawPoint {
    type Output = DrawPoint;

    fn sub(self, rhs: DrawPoint) -> DrawPoint {
        DrawPoint::from_cartesian(self.to_cartesian() - rhs.to_cartesian())
    }
}

impl std::ops::Mul<f64> for DrawPoint {
    type Output = DrawPoint;

    fn mul(self, s: f64) -> DrawPoint {
        DrawPoint::new(self.angle, self.distance * s)
    }
}

// ── Unit sphere ────────────────────────────────────────────────────────────

/// Direction in 3D space, nominally on the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3d {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Back-project a disk point onto the near hemisphere of the unit sphere.
    ///
    /// `p` must lie inside the disk of the given radius (callers enforce the
    /// bound at capture time). At the rim, floating-point drift can push
    /// `u² + v²` marginally past 1; the z term clamps to 0 instead of
    /// producing NaN.
    pub fn from_disk(p: Point2d, radius: f64) -> Self {
        let u = p.x / radius;
        let v = p.y / radius;
        Self {
            x: u,
            y: v,
            z: (1.0 - u * u - v * v).max(0.0).sqrt(),
        }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point3d) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Vector magnitude.
    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn dot(self, other: Point3d) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn normalized(self) -> Option<Point3d> {
        let n = self.norm();
        if n <= 0.0 || !n.is_finite() {
            return None;
        }
        Some(Point3d::new(self.x / n, self.y / n, self.z / n))
    }
}

// ── Angular distance ───────────────────────────────────────────────────────

/// Angle in radians between two unit-length directions, in [0, π].
///
/// Uses the chord form `2·asin(‖a − b‖ / 2)`, which is better conditioned
/// near small angles than `acos(a·b)`; the two agree to floating-point
/// rounding for all valid inputs. Inputs must be normalized.
pub fn angle_between(a: Point3d, b: Point3d) -> f64 {
    2.0 * (a.distance(b) / 2.0).clamp(0.0, 1.0).asin()
}

// ── Tests ──────────────────────────────────────────────────────────────────
