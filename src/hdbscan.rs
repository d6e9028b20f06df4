//! Hierarchical DBSCAN.
//!
//! Instead of a fixed `eps`, HDBSCAN builds a minimum spanning tree over
//! mutual-reachability distances, condenses it into a hierarchy of candidate
//! clusters across all density thresholds and keeps the ones that persist the
//! longest. A robustness check against DBSCAN's sensitivity to the `eps`
//! choice: each extracted cluster carries a
//! persistence score, so hotspots can be ranked by confidence rather than by
//! a single arbitrarily-chosen density threshold.

use crate::assignment::{ClusterAssignment, NOISE};
use crate::error::Result;
use crate::neighbourhood::RegionQuery;
use crate::params::HdbscanParams;
use crate::validation::validate_points;
use num_traits::Float;
use std::collections::{HashMap, VecDeque};

use crate::union_find::UnionFind;

#[derive(Debug, Clone)]
struct MstEdge<T> {
    left: usize,
    right: usize,
    distance: T,
}

struct SltNode<T> {
    left_child: usize,
    right_child: usize,
    distance: T,
    size: usize,
}

struct CondensedNode<T> {
    node_id: usize,
    parent_id: usize,
    lambda_birth: T,
    size: usize,
}

type CondensedTree<T> = Vec<CondensedNode<T>>;

/// Labels plus a persistence (stability) score per extracted cluster,
/// indexed by cluster label.
#[derive(Debug, Clone, PartialEq)]
pub struct HdbscanResult {
    pub assignment: ClusterAssignment,
    pub persistence: Vec<f64>,
}

/// The HDBSCAN clustering algorithm. Generic over floating point types.
///
/// # Examples
/// ```
/// use stclust::{DistanceMetric, Hdbscan, HdbscanParams};
///
/// let data: Vec<Vec<f64>> = vec![
///     vec![1.5, 2.2],
///     vec![1.0, 1.1],
///     vec![1.2, 1.4],
///     vec![0.8, 1.0],
///     vec![1.1, 1.0],
///     vec![3.7, 4.0],
///     vec![3.9, 3.9],
///     vec![3.6, 4.1],
///     vec![3.8, 3.9],
///     vec![4.0, 4.1],
///     vec![10.0, 10.0],
/// ];
/// let params = HdbscanParams::builder()
///     .min_cluster_size(3)
///     .dist_metric(DistanceMetric::Euclidean)
///     .build()
///     .unwrap();
/// let result = Hdbscan::new(&data, params).cluster().unwrap();
/// assert_eq!(result.assignment.cluster_count(), 2);
/// assert_eq!(result.assignment.labels()[10], -1);
/// assert_eq!(result.persistence.len(), 2);
/// ```
pub struct Hdbscan<'a, T> {
    data: &'a [Vec<T>],
    n_samples: usize,
    params: HdbscanParams,
}

impl<'a, T: Float> Hdbscan<'a, T> {
    pub fn new(data: &'a [Vec<T>], params: HdbscanParams) -> Self {
        Hdbscan {
            data,
            n_samples: data.len(),
            params,
        }
    }

    /// As [`Hdbscan::new`] with default parameters.
    pub fn default_params(data: &'a [Vec<T>]) -> Self {
        Hdbscan::new(data, HdbscanParams::default_params())
    }

    /// Runs the clustering. Inputs too small to ever form a cluster yield an
    /// all-noise result rather than an error.
    pub fn cluster(&self) -> Result<HdbscanResult> {
        validate_points(self.data, self.params.dist_metric)?;
        if self.n_samples < self.params.min_cluster_size.max(self.params.min_samples) {
            return Ok(HdbscanResult {
                assignment: ClusterAssignment::all_noise(self.n_samples),
                persistence: Vec::new(),
            });
        }

        let query = RegionQuery::new(self.data, self.params.dist_metric, &self.params.nn_algo);
        let core_distances = query.core_distances(self.params.min_samples);
        let min_spanning_tree = self.prims_min_spanning_tree(&core_distances);
        let single_linkage_tree = self.make_single_linkage_tree(&min_spanning_tree);
        let condensed_tree = self.condense_tree(&single_linkage_tree);
        let winning_clusters = self.extract_most_persistent_clusters(&condensed_tree);
        Ok(self.label_data(&winning_clusters, &condensed_tree))
    }

    fn prims_min_spanning_tree(&self, core_distances: &[T]) -> Vec<MstEdge<T>> {
        let mut in_tree = vec![false; self.n_samples];
        let mut distances = vec![T::infinity(); self.n_samples];
        distances[0] = T::zero();

        let mut mst = Vec::with_capacity(self.n_samples - 1);
        let mut left = 0;

        for _ in 1..self.n_samples {
            in_tree[left] = true;
            let mut current_min = T::infinity();
            let mut right = 0;

            for candidate in 0..self.n_samples {
                if in_tree[candidate] {
                    continue;
                }
                let mrd = self.mutual_reachability_dist(left, candidate, core_distances);
                if mrd < distances[candidate] {
                    distances[candidate] = mrd;
                }
                if distances[candidate] < current_min {
                    right = candidate;
                    current_min = distances[candidate];
                }
            }
            mst.push(MstEdge {
                left,
                right,
                distance: current_min,
            });
            left = right;
        }
        mst.sort_by(|a, b| a.distance.partial_cmp(&b.distance).expect("invalid floats"));
        mst
    }

    fn mutual_reachability_dist(&self, a: usize, b: usize, core_distances: &[T]) -> T {
        let dist_a_b = self
            .params
            .dist_metric
            .calc_dist(&self.data[a], &self.data[b]);
        core_distances[a].max(core_distances[b]).max(dist_a_b)
    }

    fn make_single_linkage_tree(&self, min_spanning_tree: &[MstEdge<T>]) -> Vec<SltNode<T>> {
        let mut single_linkage_tree = Vec::with_capacity(self.n_samples - 1);
        let mut union_find = UnionFind::new(self.n_samples);

        for edge in min_spanning_tree.iter().take(self.n_samples - 1) {
            let left_child = union_find.find(edge.left);
            let right_child = union_find.find(edge.right);
            let size = union_find.size_of(left_child) + union_find.size_of(right_child);

            single_linkage_tree.push(SltNode {
                left_child,
                right_child,
                distance: edge.distance,
                size,
            });
            union_find.union(left_child, right_child);
        }
        single_linkage_tree
    }

    fn condense_tree(&self, single_linkage_tree: &[SltNode<T>]) -> CondensedTree<T> {
        let top_node = (self.n_samples - 1) * 2;
        let node_ids = self.find_single_linkage_children(single_linkage_tree, top_node);

        let mut new_node_ids = vec![0_usize; top_node + 1];
        new_node_ids[top_node] = self.n_samples;
        let mut next_parent_id = self.n_samples + 1;

        let mut visited = vec![false; node_ids.len()];
        let mut condensed_tree = Vec::new();

        for node_id in node_ids {
            if visited[node_id] || self.is_individual_sample(node_id) {
                continue;
            }

            let node = &single_linkage_tree[node_id - self.n_samples];
            let lambda_birth = self.calc_lambda(node.distance);
            let left_size = self.extract_cluster_size(node.left_child, single_linkage_tree);
            let right_size = self.extract_cluster_size(node.right_child, single_linkage_tree);

            let is_left_a_cluster = left_size >= self.params.min_cluster_size;
            let is_right_a_cluster = right_size >= self.params.min_cluster_size;

            match (is_left_a_cluster, is_right_a_cluster) {
                (true, true) => {
                    for (child_id, child_size) in
                        [(node.left_child, left_size), (node.right_child, right_size)]
                    {
                        new_node_ids[child_id] = next_parent_id;
                        next_parent_id += 1;
                        condensed_tree.push(CondensedNode {
                            node_id: new_node_ids[child_id],
                            parent_id: new_node_ids[node_id],
                            lambda_birth,
                            size: child_size,
                        });
                    }
                }
                (false, false) => {
                    for child_id in [node.left_child, node.right_child] {
                        self.add_fallen_points_to_tree(
                            child_id,
                            new_node_ids[node_id],
                            single_linkage_tree,
                            &mut condensed_tree,
                            &mut visited,
                            lambda_birth,
                        );
                    }
                }
                (false, true) => {
                    new_node_ids[node.right_child] = new_node_ids[node_id];
                    self.add_fallen_points_to_tree(
                        node.left_child,
                        new_node_ids[node_id],
                        single_linkage_tree,
                        &mut condensed_tree,
                        &mut visited,
                        lambda_birth,
                    );
                }
                (true, false) => {
                    new_node_ids[node.left_child] = new_node_ids[node_id];
                    self.add_fallen_points_to_tree(
                        node.right_child,
                        new_node_ids[node_id],
                        single_linkage_tree,
                        &mut condensed_tree,
                        &mut visited,
                        lambda_birth,
                    );
                }
            }
        }
        condensed_tree
    }

    fn find_single_linkage_children(
        &self,
        single_linkage_tree: &[SltNode<T>],
        root: usize,
    ) -> Vec<usize> {
        let mut process_queue = VecDeque::from([root]);
        let mut child_nodes = Vec::new();

        while let Some(mut node_id) = process_queue.pop_front() {
            child_nodes.push(node_id);
            if self.is_individual_sample(node_id) {
                continue;
            }
            node_id -= self.n_samples;
            process_queue.push_back(single_linkage_tree[node_id].left_child);
            process_queue.push_back(single_linkage_tree[node_id].right_child);
        }
        child_nodes
    }

    fn is_individual_sample(&self, node_id: usize) -> bool {
        node_id < self.n_samples
    }

    fn calc_lambda(&self, dist: T) -> T {
        if dist > T::zero() {
            T::one() / dist
        } else {
            T::infinity()
        }
    }

    fn extract_cluster_size(&self, node_id: usize, single_linkage_tree: &[SltNode<T>]) -> usize {
        if self.is_individual_sample(node_id) {
            1
        } else {
            single_linkage_tree[node_id - self.n_samples].size
        }
    }

    /// Points shed from a cluster below `min_cluster_size` stay attached to
    /// the surviving parent, recorded with the lambda at which they fell out.
    fn add_fallen_points_to_tree(
        &self,
        node_id: usize,
        new_node_id: usize,
        single_linkage_tree: &[SltNode<T>],
        condensed_tree: &mut CondensedTree<T>,
        visited: &mut [bool],
        lambda_birth: T,
    ) {
        for child_id in self.find_single_linkage_children(single_linkage_tree, node_id) {
            if self.is_individual_sample(child_id) {
                condensed_tree.push(CondensedNode {
                    node_id: child_id,
                    parent_id: new_node_id,
                    lambda_birth,
                    size: 1,
                });
            }
            visited[child_id] = true;
        }
    }

    /// Bottom-up stability competition: a cluster wins if it is more stable
    /// than the sum of its immediate child clusters (and not over the size
    /// cap); otherwise its children inherit and the combined stability
    /// propagates upwards. The root pseudo-cluster never competes.
    fn extract_most_persistent_clusters(&self, condensed_tree: &CondensedTree<T>) -> Vec<usize> {
        let lower = self.n_samples + 1;
        let upper = lower + condensed_tree.len().saturating_sub(self.n_samples);

        let mut stabilities: HashMap<usize, T> = (lower..upper)
            .map(|cluster_id| (cluster_id, self.calc_stability(cluster_id, condensed_tree)))
            .collect();
        let mut selected: HashMap<usize, bool> =
            stabilities.keys().map(|&id| (id, false)).collect();

        for cluster_id in (lower..upper).rev() {
            let stability = *stabilities
                .get(&cluster_id)
                .expect("stability exists for every candidate");
            let combined_child_stability = self
                .immediate_child_clusters(cluster_id, condensed_tree)
                .iter()
                .map(|node| *stabilities.get(&node.node_id).unwrap_or(&T::zero()))
                .fold(T::zero(), std::ops::Add::add);

            if stability > combined_child_stability
                && !self.is_cluster_too_big(cluster_id, condensed_tree)
            {
                selected.insert(cluster_id, true);
                // Deselect any descendant that had already won
                for node_id in self.find_child_clusters(cluster_id, condensed_tree) {
                    if selected.get(&node_id) == Some(&true) {
                        selected.insert(node_id, false);
                    }
                }
            } else {
                stabilities.insert(cluster_id, combined_child_stability);
            }
        }

        let mut winners: Vec<usize> = selected
            .into_iter()
            .filter(|(_, keep)| *keep)
            .map(|(id, _)| id)
            .collect();
        winners.sort_unstable();
        winners
    }

    fn calc_stability(&self, cluster_id: usize, condensed_tree: &CondensedTree<T>) -> T {
        let lambda_birth = self.extract_lambda_birth(cluster_id, condensed_tree);
        condensed_tree
            .iter()
            .filter(|node| node.parent_id == cluster_id)
            .map(|node| (node.lambda_birth - lambda_birth) * T::from(node.size).unwrap_or(T::one()))
            .fold(T::zero(), std::ops::Add::add)
    }

    fn extract_lambda_birth(&self, cluster_id: usize, condensed_tree: &CondensedTree<T>) -> T {
        if cluster_id == self.n_samples {
            T::zero()
        } else {
            condensed_tree
                .iter()
                .find(|node| node.node_id == cluster_id)
                .map(|node| node.lambda_birth)
                .unwrap_or(T::zero())
        }
    }

    fn immediate_child_clusters<'b>(
        &self,
        cluster_id: usize,
        condensed_tree: &'b CondensedTree<T>,
    ) -> Vec<&'b CondensedNode<T>> {
        condensed_tree
            .iter()
            .filter(|node| node.parent_id == cluster_id)
            .filter(|node| !self.is_individual_sample(node.node_id))
            .collect()
    }

    fn is_cluster_too_big(&self, cluster_id: usize, condensed_tree: &CondensedTree<T>) -> bool {
        condensed_tree
            .iter()
            .find(|node| node.node_id == cluster_id)
            .map(|node| node.size)
            .unwrap_or(1)
            > self.params.max_cluster_size
    }

    fn label_data(
        &self,
        winning_clusters: &[usize],
        condensed_tree: &CondensedTree<T>,
    ) -> HdbscanResult {
        // All points are noise until a winning cluster claims them
        let mut labels = vec![NOISE; self.n_samples];
        let mut persistence = Vec::with_capacity(winning_clusters.len());

        for (current_label, &cluster_id) in winning_clusters.iter().enumerate() {
            for point_id in self.find_child_samples(cluster_id, condensed_tree) {
                labels[point_id] = current_label as i32;
            }
            persistence.push(
                self.calc_stability(cluster_id, condensed_tree)
                    .to_f64()
                    .unwrap_or(0.0),
            );
        }

        HdbscanResult {
            assignment: ClusterAssignment::new(labels),
            persistence,
        }
    }

    fn find_child_clusters(
        &self,
        root_node_id: usize,
        condensed_tree: &CondensedTree<T>,
    ) -> Vec<usize> {
        let mut process_queue = VecDeque::from([root_node_id]);
        let mut child_clusters = Vec::new();

        while let Some(current) = process_queue.pop_front() {
            for node in condensed_tree {
                if self.is_individual_sample(node.node_id) {
                    continue;
                }
                if node.parent_id == current {
                    child_clusters.push(node.node_id);
                    process_queue.push_back(node.node_id);
                }
            }
        }
        child_clusters
    }

    fn find_child_samples(
        &self,
        root_node_id: usize,
        condensed_tree: &CondensedTree<T>,
    ) -> Vec<usize> {
        let mut process_queue = VecDeque::from([root_node_id]);
        let mut child_samples = Vec::new();

        while let Some(current) = process_queue.pop_front() {
            for node in condensed_tree {
                if node.parent_id != current {
                    continue;
                }
                if self.is_individual_sample(node.node_id) {
                    child_samples.push(node.node_id);
                } else {
                    process_queue.push_back(node.node_id);
                }
            }
        }
        child_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMetric;
    use std::collections::HashSet;

    fn two_blob_data() -> Vec<Vec<f64>> {
        vec![
            vec![1.5, 2.2],
            vec![1.0, 1.1],
            vec![1.2, 1.4],
            vec![0.8, 1.0],
            vec![1.1, 1.0],
            vec![3.7, 4.0],
            vec![3.9, 3.9],
            vec![3.6, 4.1],
            vec![3.8, 3.9],
            vec![4.0, 4.1],
            vec![10.0, 10.0],
        ]
    }

    fn euclidean_params(min_cluster_size: usize) -> HdbscanParams {
        HdbscanParams::builder()
            .min_cluster_size(min_cluster_size)
            .dist_metric(DistanceMetric::Euclidean)
            .build()
            .unwrap()
    }

    #[test]
    fn finds_two_clusters_and_noise() {
        let data = two_blob_data();
        let result = Hdbscan::new(&data, euclidean_params(3)).cluster().unwrap();
        let labels = result.assignment.labels();
        // First five points form one cluster
        assert_eq!(1, labels[..5].iter().collect::<HashSet<_>>().len());
        // Next five points are a second cluster
        assert_eq!(1, labels[5..10].iter().collect::<HashSet<_>>().len());
        // The final point is noise
        assert_eq!(NOISE, labels[10]);
    }

    #[test]
    fn persistence_scores_align_with_labels() {
        let data = two_blob_data();
        let result = Hdbscan::new(&data, euclidean_params(3)).cluster().unwrap();
        assert_eq!(result.persistence.len(), result.assignment.cluster_count());
        assert!(result.persistence.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn tighter_cluster_is_more_persistent() {
        // One dense knot, one loose spread. The knot should win on stability.
        let mut data = Vec::new();
        for i in 0..6 {
            data.push(vec![1.0 + i as f64 * 0.01, 1.0]);
        }
        for i in 0..6 {
            data.push(vec![20.0 + i as f64 * 0.4, 1.0]);
        }
        let result = Hdbscan::new(&data, euclidean_params(3)).cluster().unwrap();
        assert_eq!(result.assignment.cluster_count(), 2);
        let tight_label = result.assignment.labels()[0] as usize;
        let loose_label = result.assignment.labels()[6] as usize;
        assert!(result.persistence[tight_label] > result.persistence[loose_label]);
    }

    #[test]
    fn degenerate_input_is_all_noise_not_error() {
        let data = vec![vec![1.0, 1.0], vec![1.1, 1.0]];
        let result = Hdbscan::new(&data, euclidean_params(3)).cluster().unwrap();
        assert_eq!(result.assignment.noise_count(), 2);
        assert!(result.persistence.is_empty());

        let empty: Vec<Vec<f64>> = Vec::new();
        let result = Hdbscan::new(&empty, euclidean_params(3)).cluster().unwrap();
        assert!(result.assignment.is_empty());
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let data = vec![vec![1.5, 2.2], vec![1.0, 1.1], vec![1.2]];
        let result = Hdbscan::new(&data, euclidean_params(2)).cluster();
        assert!(matches!(
            result,
            Err(crate::error::Error::DimensionMismatch(_))
        ));
    }

    #[test]
    fn repeat_runs_produce_the_same_partition() {
        let data = two_blob_data();
        let first = Hdbscan::new(&data, euclidean_params(3)).cluster().unwrap();
        let second = Hdbscan::new(&data, euclidean_params(3)).cluster().unwrap();
        assert!(first.assignment.same_partition(&second.assignment));
        assert_eq!(first.persistence, second.persistence);
    }
}
