//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with single precision coordinates
pub type Point3f = Point3<f32>;

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with single precision components
pub type Vector3f = Vector3<f32>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Squared Euclidean distance between two points
#[inline]
pub fn squared_distance(a: &Point3d, b: &Point3d) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    dx * dx + dy * dy + dz * dz
}

/// Widen a single precision point, as stored by most mesh files
#[inline]
pub fn widen(point: &Point3f) -> Point3d {
    Point3d::new(point.x as f64, point.y as f64, point.z as f64)
}
