//! Centroid and centroid size of point sets
//!
//! Centroid size is the standard scale descriptor of geometric
//! morphometrics: the square root of the summed squared Euclidean distances
//! of every point from the centroid of its set.

use morphocrate_core::{squared_distance, Error, Point3d, PointSet, Result};

/// Neumaier-compensated running sum.
///
/// Dense surface meshes contribute hundreds of thousands of terms, so the
/// rounding error of each addition is carried along and folded back in.
#[derive(Debug, Default, Clone, Copy)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    #[inline]
    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    #[inline]
    fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Compute the arithmetic mean position of a point set.
///
/// # Errors
/// Returns [`Error::EmptyInput`] when the set holds no points.
pub fn centroid(points: &PointSet) -> Result<Point3d> {
    if points.is_empty() {
        return Err(Error::EmptyInput(
            "centroid of a point set with no points".to_string(),
        ));
    }

    let mut sums = [CompensatedSum::default(); 3];
    for p in points {
        sums[0].add(p.x);
        sums[1].add(p.y);
        sums[2].add(p.z);
    }

    let n = points.len() as f64;
    Ok(Point3d::new(
        sums[0].total() / n,
        sums[1].total() / n,
        sums[2].total() / n,
    ))
}

/// Compute the centroid size of a point set.
///
/// The squared distances are summed in full before the square root is taken.
/// The result is zero only when every point coincides.
///
/// # Errors
/// Returns [`Error::EmptyInput`] when the set holds no points.
pub fn centroid_size(points: &PointSet) -> Result<f64> {
    let c = centroid(points)?;

    let mut total = CompensatedSum::default();
    for p in points {
        total.add(squared_distance(p, &c));
    }

    // Compensation can push an all-zero sum a hair below zero.
    Ok(total.total().max(0.0).sqrt())
}

/// Extension trait exposing the shape statistics on point sets
pub trait ShapeStatistics {
    /// Arithmetic mean position, see [`centroid`]
    fn centroid(&self) -> Result<Point3d>;

    /// Root sum of squared distances from the centroid, see [`centroid_size`]
    fn centroid_size(&self) -> Result<f64>;
}

impl ShapeStatistics for PointSet {
    fn centroid(&self) -> Result<Point3d> {
        centroid(self)
    }

    fn centroid_size(&self) -> Result<f64> {
        centroid_size(self)
    }
}
