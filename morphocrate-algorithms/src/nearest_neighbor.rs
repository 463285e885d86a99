//! Nearest neighbor search implementations

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use morphocrate_core::{squared_distance, Error, NearestNeighborSearch, Point3d, Result};

/// KD-tree point locator backed by `kiddo`
///
/// The tree holds each distinct position once; coincident points share an
/// entry and resolve to the lowest of their indices first. Grid-aligned and
/// fully coincident vertex sets are accepted.
pub struct KdTree {
    tree: ImmutableKdTree<f64, 3>,
    /// Point indices grouped by position, lowest index first in each group
    order: Vec<usize>,
    /// Start of each position's group in `order`, plus a final end marker
    starts: Vec<usize>,
}

impl KdTree {
    /// Build a tree over the given points; item indices follow slice order.
    ///
    /// # Errors
    /// Returns [`Error::EmptyInput`] for an empty slice.
    pub fn new(points: &[Point3d]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptyInput(
                "cannot build a KD-tree over zero points".to_string(),
            ));
        }

        let position = |i: usize| [points[i].x, points[i].y, points[i].z];
        let mut order: Vec<usize> = (0..points.len()).collect();
        order.sort_by(|&a, &b| {
            let (pa, pb) = (position(a), position(b));
            pa[0].total_cmp(&pb[0])
                .then(pa[1].total_cmp(&pb[1]))
                .then(pa[2].total_cmp(&pb[2]))
                .then(a.cmp(&b))
        });

        let mut entries: Vec<[f64; 3]> = Vec::new();
        let mut starts = Vec::new();
        for (slot, &idx) in order.iter().enumerate() {
            let p = position(idx);
            let same = entries.last().is_some_and(|last: &[f64; 3]| {
                last.iter().zip(&p).all(|(a, b)| a.total_cmp(b).is_eq())
            });
            if !same {
                entries.push(p);
                starts.push(slot);
            }
        }
        starts.push(order.len());

        let tree = ImmutableKdTree::new_from_slice(&entries);

        Ok(Self { tree, order, starts })
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of distinct positions in the tree
    pub fn distinct_positions(&self) -> usize {
        self.starts.len() - 1
    }

    fn group(&self, entry: u64) -> &[usize] {
        let entry = entry as usize;
        &self.order[self.starts[entry]..self.starts[entry + 1]]
    }
}

impl NearestNeighborSearch for KdTree {
    fn find_nearest(&self, query: &Point3d) -> Option<(usize, f64)> {
        let nearest = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[query.x, query.y, query.z]);
        let idx = *self.group(nearest.item).first()?;
        Some((idx, nearest.distance.sqrt()))
    }

    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)> {
        if k == 0 {
            return Vec::new();
        }
        // k distinct positions always cover at least k points
        let mut neighbors: Vec<(usize, f64)> = self
            .tree
            .nearest_n::<SquaredEuclidean>(&[query.x, query.y, query.z], k.min(self.distinct_positions()))
            .into_iter()
            .flat_map(|nn| {
                let distance = nn.distance.sqrt();
                self.group(nn.item).iter().map(move |&idx| (idx, distance))
            })
            .collect();
        neighbors.truncate(k);
        neighbors
    }

    fn find_radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)> {
        if radius < 0.0 {
            return Vec::new();
        }
        self.tree
            .within::<SquaredEuclidean>(&[query.x, query.y, query.z], radius * radius)
            .into_iter()
            .flat_map(|nn| {
                let distance = nn.distance.sqrt();
                self.group(nn.item).iter().map(move |&idx| (idx, distance))
            })
            .collect()
    }
}

/// Simple brute force nearest neighbor search for small datasets
pub struct BruteForceSearch {
    points: Vec<Point3d>,
}

impl BruteForceSearch {
    pub fn new(points: &[Point3d]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }
}

impl NearestNeighborSearch for BruteForceSearch {
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)> {
        let mut distances: Vec<(usize, f64)> = self.points
            .iter()
            .enumerate()
            .map(|(idx, point)| (idx, squared_distance(point, query).sqrt()))
            .collect();

        // Sort by distance and take k nearest
        distances.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        distances.truncate(k);
        distances
    }

    fn find_radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)> {
        let radius_squared = radius * radius;
        let mut neighbors: Vec<(usize, f64)> = self.points
            .iter()
            .enumerate()
            .filter_map(|(idx, point)| {
                let distance_squared = squared_distance(point, query);
                if radius >= 0.0 && distance_squared <= radius_squared {
                    Some((idx, distance_squared.sqrt()))
                } else {
                    None
                }
            })
            .collect();
        neighbors.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn square() -> Vec<Point3d> {
        vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_empty_tree_is_rejected() {
        assert!(matches!(KdTree::new(&[]), Err(Error::EmptyInput(_))));
    }

    #[test]
    fn test_find_nearest() {
        let tree = KdTree::new(&square()).unwrap();
        let (idx, dist) = tree.find_nearest(&Point3d::new(0.9, 1.2, 0.0)).unwrap();
        assert_eq!(idx, 3);
        assert!((dist - (0.01f64 + 0.04).sqrt()).abs() < 1e-12);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_k_nearest_sorted_and_capped() {
        let tree = KdTree::new(&square()).unwrap();
        let result = tree.find_k_nearest(&Point3d::new(0.1, 0.0, 0.0), 10);
        assert_eq!(result.len(), 4);
        assert_eq!(result[0].0, 0);
        for pair in result.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
        assert!(tree.find_k_nearest(&Point3d::origin(), 0).is_empty());
    }

    #[test]
    fn test_radius_neighbors() {
        let tree = KdTree::new(&square()).unwrap();
        let query = Point3d::new(0.5, 0.5, 0.0);
        let neighbors = tree.find_radius_neighbors(&query, 1.0);
        assert_eq!(neighbors.len(), 4);
        for (_, distance) in &neighbors {
            assert!(*distance <= 1.0);
        }
        assert!(tree.find_radius_neighbors(&query, 0.1).is_empty());
    }

    fn integer_grid(n: usize) -> Vec<Point3d> {
        let mut points = Vec::with_capacity(n * n * n);
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    points.push(Point3d::new(i as f64, j as f64, k as f64));
                }
            }
        }
        points
    }

    #[test]
    fn test_integer_grid_matches_brute_force() {
        let points = integer_grid(20);
        let tree = KdTree::new(&points).unwrap();
        let brute = BruteForceSearch::new(&points);
        assert_eq!(tree.len(), 8000);

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let query = Point3d::new(rng.gen_range(-2.0..21.0), rng.gen_range(-2.0..21.0), rng.gen_range(-2.0..21.0));
            let (tree_idx, tree_dist) = tree.find_nearest(&query).unwrap();
            let (_, brute_dist) = brute.find_nearest(&query).unwrap();
            assert!((tree_dist - brute_dist).abs() < 1e-9);
            assert!((squared_distance(&points[tree_idx], &query).sqrt() - brute_dist).abs() < 1e-9);
        }

        let on_grid = tree.find_radius_neighbors(&Point3d::new(5.0, 5.0, 5.0), 1.2);
        assert_eq!(on_grid.len(), 7);
    }

    #[test]
    fn test_coincident_points() {
        let points = vec![Point3d::new(2.0, -1.0, 4.0); 100];
        let tree = KdTree::new(&points).unwrap();

        assert_eq!(tree.len(), 100);
        assert_eq!(tree.distinct_positions(), 1);
        let (idx, dist) = tree.find_nearest(&Point3d::new(2.0, -1.0, 5.0)).unwrap();
        assert_eq!(idx, 0);
        assert!((dist - 1.0).abs() < 1e-12);
        assert_eq!(tree.find_k_nearest(&Point3d::origin(), 10).len(), 10);
        assert_eq!(tree.find_radius_neighbors(&Point3d::new(2.0, -1.0, 4.2), 0.5).len(), 100);
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        let points: Vec<Point3d> = (0..2000)
            .map(|_| Point3d::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)))
            .collect();
        let tree = KdTree::new(&points).unwrap();
        let brute = BruteForceSearch::new(&points);

        for _ in 0..100 {
            let query = Point3d::new(rng.gen_range(-60.0..60.0), rng.gen_range(-60.0..60.0), rng.gen_range(-60.0..60.0));
            let (tree_idx, tree_dist) = tree.find_nearest(&query).unwrap();
            let (brute_idx, brute_dist) = brute.find_nearest(&query).unwrap();
            assert!((tree_dist - brute_dist).abs() < 1e-9);
            assert_eq!(tree_idx, brute_idx);
        }
    }
}
