//! Mesh data structures and functionality

use crate::point::*;
use crate::point_cloud::PointSet;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices and faces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3d>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3d>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3d>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Add a polygon, splitting it into a triangle fan around its first vertex.
    ///
    /// Polygons with fewer than three vertices are ignored.
    pub fn add_polygon(&mut self, indices: &[usize]) {
        if indices.len() < 3 {
            return;
        }
        for i in 1..indices.len() - 1 {
            self.faces.push([indices[0], indices[i], indices[i + 1]]);
        }
    }

    /// Check that every face references an existing vertex
    pub fn faces_in_bounds(&self) -> bool {
        let n = self.vertices.len();
        self.faces.iter().all(|face| face.iter().all(|&i| i < n))
    }

    /// Set vertex normals; ignored unless there is one per vertex
    pub fn set_normals(&mut self, normals: Vec<Vector3d>) {
        if normals.len() == self.vertices.len() {
            self.normals = Some(normals);
        }
    }

    /// Copy the vertex positions into a point set
    pub fn to_point_set(&self) -> PointSet {
        PointSet::from_points(self.vertices.clone())
    }

    /// Consume the mesh, keeping only its vertex positions
    pub fn into_point_set(self) -> PointSet {
        PointSet::from_points(self.vertices)
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(1.0, 1.0, 0.0),
                Point3d::new(0.0, 1.0, 0.0),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_polygon_fan() {
        let mut mesh = quad();
        mesh.add_polygon(&[0, 1, 2, 3]);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
        assert!(mesh.faces_in_bounds());
    }

    #[test]
    fn test_degenerate_polygon_ignored() {
        let mut mesh = quad();
        mesh.add_polygon(&[0, 1]);
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn test_normals_require_matching_count() {
        let mut mesh = quad();
        mesh.set_normals(vec![Vector3d::z(); 2]);
        assert!(mesh.normals.is_none());
        mesh.set_normals(vec![Vector3d::z(); 4]);
        assert!(mesh.normals.is_some());
    }

    #[test]
    fn test_into_point_set_keeps_order() {
        let cloud = quad().into_point_set();
        assert_eq!(cloud.len(), 4);
        assert_eq!(cloud[3], Point3d::new(0.0, 1.0, 0.0));
    }
}
