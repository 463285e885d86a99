//! # Morphocrate Algorithms
//!
//! The shape-statistic engine and the geometric queries built on it.
//!
//! This crate computes centroids and centroid sizes of point sets, applies
//! them across ordered batches of meshes, and maps atlas control points onto
//! mesh surfaces with a KD-tree point locator.

pub mod centroid;
pub mod batch;
pub mod nearest_neighbor;
pub mod control_points;

// Re-export commonly used items
pub use centroid::*;
pub use batch::*;
pub use nearest_neighbor::*;
pub use control_points::*;
