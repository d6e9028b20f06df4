use std::collections::{HashMap, HashSet};

/// Label marking a point as noise, i.e. not density-reachable from any
/// cluster.
pub const NOISE: i32 = -1;

/// The output of a clustering run: one label per input point, in input order.
///
/// Labels `0..n` identify clusters; [`NOISE`] marks unclustered points. Label
/// numbering is arbitrary, but the induced partition is deterministic for a
/// given input and parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    labels: Vec<i32>,
}

impl ClusterAssignment {
    pub(crate) fn new(labels: Vec<i32>) -> Self {
        ClusterAssignment { labels }
    }

    /// An assignment in which every one of `n` points is noise. The shape of
    /// every degenerate-input result.
    pub(crate) fn all_noise(n: usize) -> Self {
        ClusterAssignment {
            labels: vec![NOISE; n],
        }
    }

    /// One label per input point.
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Number of points covered by this assignment.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of distinct non-noise clusters.
    pub fn cluster_count(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&l| l != NOISE)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Number of points labelled as noise.
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }

    /// Indices of the points belonging to cluster `label`.
    pub fn members(&self, label: i32) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == label)
            .map(|(i, _)| i)
            .collect()
    }

    /// The distinct cluster labels present, in ascending order.
    pub fn cluster_labels(&self) -> Vec<i32> {
        let mut labels: Vec<i32> = self
            .labels
            .iter()
            .copied()
            .filter(|&l| l != NOISE)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        labels.sort_unstable();
        labels
    }

    /// Whether two assignments induce the same partition of the same points,
    /// ignoring the arbitrary numbering of cluster labels. Noise must match
    /// exactly.
    pub fn same_partition(&self, other: &ClusterAssignment) -> bool {
        if self.labels.len() != other.labels.len() {
            return false;
        }
        let mut fwd: HashMap<i32, i32> = HashMap::new();
        let mut bwd: HashMap<i32, i32> = HashMap::new();
        for (&a, &b) in self.labels.iter().zip(other.labels.iter()) {
            if (a == NOISE) != (b == NOISE) {
                return false;
            }
            if a == NOISE {
                continue;
            }
            if *fwd.entry(a).or_insert(b) != b || *bwd.entry(b).or_insert(a) != a {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        let assignment = ClusterAssignment::new(vec![0, 0, 1, NOISE, 1, 2]);
        assert_eq!(assignment.len(), 6);
        assert_eq!(assignment.cluster_count(), 3);
        assert_eq!(assignment.noise_count(), 1);
        assert_eq!(assignment.members(1), vec![2, 4]);
        assert_eq!(assignment.cluster_labels(), vec![0, 1, 2]);
    }

    #[test]
    fn all_noise_has_no_clusters() {
        let assignment = ClusterAssignment::all_noise(4);
        assert_eq!(assignment.cluster_count(), 0);
        assert_eq!(assignment.noise_count(), 4);
    }

    #[test]
    fn partition_equality_ignores_label_numbering() {
        let a = ClusterAssignment::new(vec![0, 0, 1, 1, NOISE]);
        let b = ClusterAssignment::new(vec![1, 1, 0, 0, NOISE]);
        let c = ClusterAssignment::new(vec![0, 0, 0, 1, NOISE]);
        assert!(a.same_partition(&b));
        assert!(!a.same_partition(&c));
    }

    #[test]
    fn partition_equality_respects_noise() {
        let a = ClusterAssignment::new(vec![0, NOISE]);
        let b = ClusterAssignment::new(vec![0, 0]);
        assert!(!a.same_partition(&b));
    }
}
