//! Core data structures and traits for morphocrate
//! 
//! This crate provides the fundamental types shared by the shape-statistic
//! engine and the mesh I/O layer: points, point sets, triangle meshes,
//! transforms, centroid-size records and the common error type.

pub mod point;
pub mod point_cloud;
pub mod mesh;
pub mod record;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use mesh::*;
pub use record::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
