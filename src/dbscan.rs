//! DBSCAN over spatial points.
//!
//! A point is a core point if at least `min_samples` points (itself included)
//! lie within `eps`. Clusters are maximal sets of density-connected core
//! points plus the border points reachable from them; everything else is
//! noise. The baseline clusterer: typically one run per offense category,
//! city-wide, over a full year of records.

use crate::assignment::{ClusterAssignment, NOISE};
use crate::error::Result;
use crate::neighbourhood::RegionQuery;
use crate::params::DbscanParams;
use crate::validation::validate_points;
use num_traits::Float;

// Internal label for points no cluster has reached yet. Noise can later be
// promoted to a border point; unclassified points always get a final label.
pub(crate) const UNCLASSIFIED: i32 = -2;

/// The DBSCAN clustering algorithm. Generic over floating point types.
///
/// # Examples
/// ```
/// use stclust::{Dbscan, DbscanParams, DistanceMetric};
///
/// let data: Vec<Vec<f64>> = vec![
///     vec![1.0, 1.0],
///     vec![1.1, 1.0],
///     vec![1.0, 1.1],
///     vec![5.0, 5.0],
///     vec![5.1, 5.0],
///     vec![5.0, 5.1],
///     vec![9.9, 1.1],
/// ];
/// let params = DbscanParams::builder()
///     .eps(0.3)
///     .min_samples(3)
///     .dist_metric(DistanceMetric::Euclidean)
///     .build()
///     .unwrap();
/// let assignment = Dbscan::new(&data, params).cluster().unwrap();
/// assert_eq!(assignment.cluster_count(), 2);
/// assert_eq!(assignment.labels()[6], -1);
/// ```
pub struct Dbscan<'a, T> {
    data: &'a [Vec<T>],
    params: DbscanParams,
}

impl<'a, T: Float> Dbscan<'a, T> {
    /// Creates a DBSCAN model over `data`, a slice of equally-dimensioned
    /// coordinate vectors. With the Haversine metric those must be
    /// (lat, lon) pairs in degrees.
    pub fn new(data: &'a [Vec<T>], params: DbscanParams) -> Self {
        Dbscan { data, params }
    }

    /// As [`Dbscan::new`] with default parameters.
    pub fn default_params(data: &'a [Vec<T>]) -> Self {
        Dbscan::new(data, DbscanParams::default_params())
    }

    /// Runs the clustering. Inputs with fewer than `min_samples` points
    /// (including none at all) produce an all-noise assignment rather than
    /// an error; only structurally invalid data is rejected.
    pub fn cluster(&self) -> Result<ClusterAssignment> {
        validate_points(self.data, self.params.dist_metric)?;
        if self.data.len() < self.params.min_samples {
            return Ok(ClusterAssignment::all_noise(self.data.len()));
        }

        let eps = T::from(self.params.eps).expect("eps fits any float");
        let query = RegionQuery::new(self.data, self.params.dist_metric, &self.params.nn_algo);

        let mut labels = vec![UNCLASSIFIED; self.data.len()];
        let mut visited = vec![false; self.data.len()];
        let mut cluster_id = 0;

        for point_idx in 0..self.data.len() {
            if visited[point_idx] {
                continue;
            }
            visited[point_idx] = true;

            let neighbours = query.neighbours_within(point_idx, eps);
            if neighbours.len() < self.params.min_samples {
                labels[point_idx] = NOISE;
                continue;
            }

            expand_cluster(
                |idx| query.neighbours_within(idx, eps),
                self.params.min_samples,
                point_idx,
                &neighbours,
                &mut labels,
                &mut visited,
                cluster_id,
            );
            cluster_id += 1;
        }

        Ok(ClusterAssignment::new(labels))
    }
}

/// Iterative density-reachability expansion from a core point. The
/// neighbourhood function is abstract so the spatio-temporal variant can
/// apply its conjunctive dual-threshold criterion through the same code.
pub(crate) fn expand_cluster<F>(
    neighbours_of: F,
    min_samples: usize,
    point_idx: usize,
    neighbours: &[usize],
    labels: &mut [i32],
    visited: &mut [bool],
    cluster_id: i32,
) where
    F: Fn(usize) -> Vec<usize>,
{
    labels[point_idx] = cluster_id;
    let mut to_process: Vec<usize> = neighbours.to_vec();

    while let Some(neighbour_idx) = to_process.pop() {
        // Labels are assigned before the visited check so that a point
        // previously marked noise can still be promoted to a border point.
        if labels[neighbour_idx] == UNCLASSIFIED || labels[neighbour_idx] == NOISE {
            labels[neighbour_idx] = cluster_id;
        }
        if visited[neighbour_idx] {
            continue;
        }
        visited[neighbour_idx] = true;

        let next_neighbours = neighbours_of(neighbour_idx);
        if next_neighbours.len() >= min_samples {
            for n in next_neighbours {
                if !visited[n] {
                    to_process.push(n);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMetric;
    use crate::neighbourhood::NnAlgorithm;

    fn euclidean_params(eps: f64, min_samples: usize) -> DbscanParams {
        DbscanParams::builder()
            .eps(eps)
            .min_samples(min_samples)
            .dist_metric(DistanceMetric::Euclidean)
            .build()
            .unwrap()
    }

    #[test]
    fn two_clusters_and_noise() {
        let data = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![0.1, 0.1],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![5.0, 5.1],
            vec![100.0, 100.0],
        ];
        let assignment = Dbscan::new(&data, euclidean_params(0.3, 3)).cluster().unwrap();
        assert_eq!(assignment.cluster_count(), 2);
        assert_eq!(assignment.labels()[7], NOISE);
        assert_eq!(assignment.labels()[0], assignment.labels()[3]);
        assert_ne!(assignment.labels()[0], assignment.labels()[4]);
    }

    #[test]
    fn every_point_gets_exactly_one_label() {
        let data: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 7) as f64 * 0.05, (i % 5) as f64 * 0.05])
            .collect();
        let assignment = Dbscan::new(&data, euclidean_params(0.2, 4)).cluster().unwrap();
        assert_eq!(assignment.len(), data.len());
        assert!(assignment.labels().iter().all(|&l| l >= NOISE));
    }

    #[test]
    fn degenerate_input_is_all_noise_not_error() {
        let data = vec![vec![1.0, 1.0], vec![1.1, 1.0]];
        let assignment = Dbscan::new(&data, euclidean_params(0.5, 5)).cluster().unwrap();
        assert_eq!(assignment.noise_count(), 2);

        let empty: Vec<Vec<f64>> = Vec::new();
        let assignment = Dbscan::new(&empty, euclidean_params(0.5, 5)).cluster().unwrap();
        assert!(assignment.is_empty());
    }

    #[test]
    fn chain_of_points_connects_into_one_cluster() {
        let data: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64 * 0.3, 0.0]).collect();
        let assignment = Dbscan::new(&data, euclidean_params(0.5, 2)).cluster().unwrap();
        assert_eq!(assignment.cluster_count(), 1);
        assert_eq!(assignment.noise_count(), 0);
    }

    #[test]
    fn repeat_runs_produce_the_same_partition() {
        let data: Vec<Vec<f64>> = (0..60)
            .map(|i| {
                let cluster = (i / 20) as f64;
                vec![cluster * 3.0 + (i % 20) as f64 * 0.01, cluster]
            })
            .collect();
        let params = euclidean_params(0.3, 4);
        let first = Dbscan::new(&data, params.clone()).cluster().unwrap();
        let second = Dbscan::new(&data, params).cluster().unwrap();
        assert!(first.same_partition(&second));
    }

    #[test]
    fn backends_produce_the_same_partition() {
        let data: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![(i / 10) as f64 * 4.0 + (i % 10) as f64 * 0.05, 0.0])
            .collect();
        let brute = DbscanParams::builder()
            .eps(0.2)
            .min_samples(3)
            .dist_metric(DistanceMetric::Euclidean)
            .nn_algorithm(NnAlgorithm::BruteForce)
            .build()
            .unwrap();
        let tree = DbscanParams::builder()
            .eps(0.2)
            .min_samples(3)
            .dist_metric(DistanceMetric::Euclidean)
            .nn_algorithm(NnAlgorithm::KdTree)
            .build()
            .unwrap();
        let a = Dbscan::new(&data, brute).cluster().unwrap();
        let b = Dbscan::new(&data, tree).cluster().unwrap();
        assert!(a.same_partition(&b));
    }

    #[test]
    fn haversine_clusters_city_blocks() {
        // Two knots of arrests ~700m apart in Manhattan; eps of 250m keeps
        // them separate.
        let data = vec![
            vec![40.7549, -73.9840],
            vec![40.7552, -73.9838],
            vec![40.7547, -73.9843],
            vec![40.7610, -73.9800],
            vec![40.7612, -73.9797],
            vec![40.7608, -73.9803],
        ];
        let params = DbscanParams::builder()
            .eps(0.25)
            .min_samples(2)
            .dist_metric(DistanceMetric::Haversine)
            .build()
            .unwrap();
        let assignment = Dbscan::new(&data, params).cluster().unwrap();
        assert_eq!(assignment.cluster_count(), 2);
    }
}
