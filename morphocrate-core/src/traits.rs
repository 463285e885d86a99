//! Core traits for morphocrate

use crate::point::Point3d;

/// Trait for nearest neighbor search functionality.
///
/// Results are `(index, distance)` pairs, sorted by ascending distance.
pub trait NearestNeighborSearch {
    /// Find the single closest point, `None` when the index holds no points
    fn find_nearest(&self, query: &Point3d) -> Option<(usize, f64)> {
        self.find_k_nearest(query, 1).into_iter().next()
    }

    /// Find the k nearest neighbors to a query point
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)>;
    
    /// Find all neighbors within a given radius
    fn find_radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)>;
}
