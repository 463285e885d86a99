//! Per-mesh shape statistic records

use serde::{Deserialize, Serialize};

/// The centroid size measured for one mesh.
///
/// A batch result is an ordered `Vec` of these, one per processed mesh,
/// in the order the meshes were processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidSizeRecord {
    /// Mesh identifier, normally the source file name
    pub identifier: String,
    /// Root sum of squared distances from the centroid, never negative
    pub centroid_size: f64,
}

impl CentroidSizeRecord {
    pub fn new(identifier: impl Into<String>, centroid_size: f64) -> Self {
        Self {
            identifier: identifier.into(),
            centroid_size,
        }
    }
}
