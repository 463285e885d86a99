//! Mapping atlas control points onto mesh surfaces
//!
//! Control points estimated by a deformation atlas float freely in space.
//! For display they are snapped onto the template mesh: each one is replaced
//! by the closest mesh vertex.

use crate::nearest_neighbor::KdTree;
use log::debug;
use morphocrate_core::{Error, NearestNeighborSearch, Point3d, Result};

/// A control point after snapping, with where it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedControlPoint {
    pub original: Point3d,
    pub vertex_index: usize,
    pub position: Point3d,
    pub distance: f64,
}

/// Snap every control point to its nearest vertex and keep the details
///
/// # Errors
/// Returns [`Error::EmptyInput`] when `vertices` is empty.
pub fn map_control_points_detailed(
    vertices: &[Point3d],
    control_points: &[Point3d],
) -> Result<Vec<MappedControlPoint>> {
    if control_points.is_empty() {
        return Ok(Vec::new());
    }

    let locator = KdTree::new(vertices)
        .map_err(|_| Error::EmptyInput("mesh has no vertices to map control points onto".to_string()))?;

    let mapped = control_points
        .iter()
        .map(|cp| {
            locator
                .find_nearest(cp)
                .map(|(vertex_index, distance)| MappedControlPoint {
                    original: *cp,
                    vertex_index,
                    position: vertices[vertex_index],
                    distance,
                })
                .ok_or_else(|| Error::Algorithm("point locator returned no vertex".to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Mapped {} control points onto {} vertices",
        mapped.len(),
        vertices.len()
    );

    Ok(mapped)
}

/// Snap every control point to its nearest mesh vertex, preserving order
pub fn map_control_points(vertices: &[Point3d], control_points: &[Point3d]) -> Result<Vec<Point3d>> {
    Ok(map_control_points_detailed(vertices, control_points)?
        .into_iter()
        .map(|m| m.position)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nearest_neighbor::BruteForceSearch;

    fn tetra() -> Vec<Point3d> {
        vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(10.0, 0.0, 0.0),
            Point3d::new(0.0, 10.0, 0.0),
            Point3d::new(0.0, 0.0, 10.0),
        ]
    }

    #[test]
    fn test_points_snap_to_closest_vertex() {
        let control = vec![
            Point3d::new(9.0, 1.0, 0.0),
            Point3d::new(0.5, 0.5, 0.5),
            Point3d::new(-1.0, 2.0, 12.0),
        ];
        let mapped = map_control_points(&tetra(), &control).unwrap();
        assert_eq!(
            mapped,
            vec![
                Point3d::new(10.0, 0.0, 0.0),
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(0.0, 0.0, 10.0),
            ]
        );
    }

    #[test]
    fn test_detailed_mapping_reports_index_and_distance() {
        let mapped = map_control_points_detailed(&tetra(), &[Point3d::new(0.0, 13.0, 4.0)]).unwrap();
        assert_eq!(mapped[0].vertex_index, 2);
        assert!((mapped[0].distance - 5.0).abs() < 1e-12);
        assert_eq!(mapped[0].original, Point3d::new(0.0, 13.0, 4.0));
    }

    #[test]
    fn test_vertex_on_control_point() {
        let mapped = map_control_points(&tetra(), &[Point3d::new(10.0, 0.0, 0.0)]).unwrap();
        assert_eq!(mapped[0], Point3d::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_grid_mesh_matches_brute_force() {
        let mut vertices = Vec::new();
        for i in 0..20 {
            for j in 0..20 {
                for k in 0..20 {
                    vertices.push(Point3d::new(i as f64, j as f64, k as f64));
                }
            }
        }
        let control = vec![
            Point3d::new(3.2, 7.9, 11.4),
            Point3d::new(-4.0, 10.1, 25.0),
            Point3d::new(19.6, 0.3, 9.7),
        ];
        let mapped = map_control_points(&vertices, &control).unwrap();

        let brute = BruteForceSearch::new(&vertices);
        for (cp, snapped) in control.iter().zip(&mapped) {
            let (idx, _) = brute.find_nearest(cp).unwrap();
            assert_eq!(*snapped, vertices[idx]);
        }
        assert_eq!(mapped[0], Point3d::new(3.0, 8.0, 11.0));
    }

    #[test]
    fn test_all_vertices_coincident() {
        let vertices = vec![Point3d::new(1.0, 1.0, 1.0); 64];
        let mapped = map_control_points_detailed(&vertices, &[Point3d::origin(), Point3d::new(1.0, 1.0, 4.0)]).unwrap();
        assert!(mapped.iter().all(|m| m.position == Point3d::new(1.0, 1.0, 1.0)));
        assert!((mapped[1].distance - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(map_control_points(&tetra(), &[]).unwrap().is_empty());
        assert!(matches!(
            map_control_points(&[], &[Point3d::origin()]),
            Err(Error::EmptyInput(_))
        ));
    }
}
