#![warn(missing_docs)]

//! Math types for the lensedge CAM core.
//!
//! Thin wrappers around nalgebra providing the few geometric primitives
//! the path builder and stock simulator share: points, vectors, planar
//! rotation, and numerically safe helpers for the voxel kernels.

use nalgebra::{Vector2, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in the machine's radial/axial plane.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in the machine's radial/axial plane.
pub type Vec2 = Vector2<f64>;

/// Rotate the planar coordinates `(x, y)` about the origin by `angle` radians.
pub fn rotate_xy(x: f64, y: f64, angle: f64) -> (f64, f64) {
    let (s, c) = angle.sin_cos();
    (x * c - y * s, x * s + y * c)
}

/// Square root clamped against negative operands from floating-point error.
///
/// `|V|^2 - h^2` can dip a few ulps below zero when a cell sits exactly on
/// the tool axis; the clamp keeps the radial distance at 0 instead of NaN.
pub fn sqrt_clamped(value: f64) -> f64 {
    value.max(0.0).sqrt()
}

/// Linear interpolation between `a` and `b` at parameter `t` in [0, 1].
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
