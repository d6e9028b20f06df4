//! Region-query backends shared by the clustering algorithms.
//!
//! DBSCAN and ST-DBSCAN need "all points within `eps` of here"; HDBSCAN needs
//! "distance to the k-th nearest neighbour". Both are answered by either a
//! brute-force scan or a k-d tree, selected explicitly or by input size.

use crate::distance::{get_dist_func, DistanceMetric};
use num_traits::Float;

/// Below this many samples a brute-force scan beats building a k-d tree.
pub(crate) const BRUTE_FORCE_N_SAMPLES_LIMIT: usize = 500;

/// The nearest neighbour algorithm options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NnAlgorithm {
    /// Selects the backend based on the size of the input data.
    Auto,
    /// Scans every point for each query. Fine for small datasets.
    BruteForce,
    /// K-dimensional tree. Scales to the full-year, city-wide runs.
    KdTree,
}

pub(crate) struct RegionQuery<'a, T: Float> {
    data: &'a [Vec<T>],
    dist_func: fn(&[T], &[T]) -> T,
    tree: Option<kdtree::KdTree<T, usize, &'a Vec<T>>>,
}

impl<'a, T: Float> RegionQuery<'a, T> {
    pub(crate) fn new(data: &'a [Vec<T>], metric: DistanceMetric, algo: &NnAlgorithm) -> Self {
        let dist_func = get_dist_func::<T>(&metric);
        let use_tree = match algo {
            NnAlgorithm::BruteForce => false,
            NnAlgorithm::KdTree => true,
            NnAlgorithm::Auto => data.len() > BRUTE_FORCE_N_SAMPLES_LIMIT,
        };
        let tree = (use_tree && !data.is_empty()).then(|| {
            let mut tree = kdtree::KdTree::new(data[0].len());
            data.iter()
                .enumerate()
                .for_each(|(n, datapoint)| tree.add(datapoint, n).expect("failed to add to KdTree"));
            tree
        });
        RegionQuery {
            data,
            dist_func,
            tree,
        }
    }

    /// Indices of all points within `eps` of point `idx`, the query point
    /// itself included.
    pub(crate) fn neighbours_within(&self, idx: usize, eps: T) -> Vec<usize> {
        match &self.tree {
            Some(tree) => tree
                .within(&self.data[idx], eps, &self.dist_func)
                .expect("failed to query KdTree")
                .into_iter()
                .map(|(_dist, &n)| n)
                .collect(),
            None => {
                let point = &self.data[idx];
                self.data
                    .iter()
                    .enumerate()
                    .filter(|(_, other)| (self.dist_func)(point, other) <= eps)
                    .map(|(n, _)| n)
                    .collect()
            }
        }
    }

    /// Distance from each point to its k-th nearest neighbour (the point
    /// itself counts as the first). HDBSCAN's core distance.
    pub(crate) fn core_distances(&self, k: usize) -> Vec<T> {
        match &self.tree {
            Some(tree) => self
                .data
                .iter()
                .map(|datapoint| {
                    tree.nearest(datapoint, k, &self.dist_func)
                        .expect("failed to query KdTree")
                        .into_iter()
                        .map(|(dist, _n)| dist)
                        .last()
                        .expect("nearest returned no neighbours")
                })
                .collect(),
            None => self
                .data
                .iter()
                .map(|point| {
                    let mut dists: Vec<T> = self
                        .data
                        .iter()
                        .map(|other| (self.dist_func)(point, other))
                        .collect();
                    dists.sort_by(|a, b| a.partial_cmp(b).expect("invalid float"));
                    dists[(k - 1).min(dists.len() - 1)]
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![5.0, 5.0],
        ]
    }

    #[test]
    fn backends_agree_on_region_queries() {
        let data = grid();
        let brute = RegionQuery::new(&data, DistanceMetric::Euclidean, &NnAlgorithm::BruteForce);
        let tree = RegionQuery::new(&data, DistanceMetric::Euclidean, &NnAlgorithm::KdTree);
        for idx in 0..data.len() {
            let mut a = brute.neighbours_within(idx, 0.2);
            let mut b = tree.neighbours_within(idx, 0.2);
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn query_includes_self() {
        let data = grid();
        let query = RegionQuery::new(&data, DistanceMetric::Euclidean, &NnAlgorithm::BruteForce);
        assert!(query.neighbours_within(3, 0.2).contains(&3));
    }

    #[test]
    fn core_distances_match_across_backends() {
        let data = grid();
        let brute = RegionQuery::new(&data, DistanceMetric::Euclidean, &NnAlgorithm::BruteForce);
        let tree = RegionQuery::new(&data, DistanceMetric::Euclidean, &NnAlgorithm::KdTree);
        let a = brute.core_distances(2);
        let b = tree.core_distances(2);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
    }
}
