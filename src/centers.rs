use crate::error::{Error, Result};
use num_traits::Float;

/// Element-wise mean of each cluster's points. The output is indexed by
/// cluster label: the centroid of cluster `0` comes first. Noise points do
/// not contribute. Labels are assumed to be contiguous from zero, which is
/// what every clusterer in this crate produces.
///
/// Errors with [`Error::DimensionMismatch`] when `labels` does not cover
/// `data` one to one.
pub fn cluster_centroids<T: Float>(data: &[Vec<T>], labels: &[i32]) -> Result<Vec<Vec<T>>> {
    if data.len() != labels.len() {
        return Err(Error::DimensionMismatch(format!(
            "{} labels for {} points",
            labels.len(),
            data.len()
        )));
    }
    let n_clusters = labels
        .iter()
        .filter(|&&l| l != crate::assignment::NOISE)
        .map(|&l| l as usize + 1)
        .max()
        .unwrap_or(0);
    if n_clusters == 0 {
        return Ok(Vec::new());
    }

    let n_dims = data[0].len();
    let mut sums = vec![vec![T::zero(); n_dims]; n_clusters];
    let mut counts = vec![T::zero(); n_clusters];

    for (point, &label) in data.iter().zip(labels.iter()) {
        if label == crate::assignment::NOISE {
            continue;
        }
        let cluster = label as usize;
        counts[cluster] = counts[cluster] + T::one();
        for (sum, &element) in sums[cluster].iter_mut().zip(point.iter()) {
            *sum = *sum + element;
        }
    }

    Ok(sums
        .into_iter()
        .zip(counts)
        .map(|(sum, count)| sum.into_iter().map(|s| s / count).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroids_ignore_noise() {
        let data = vec![
            vec![1.0, 1.0],
            vec![3.0, 3.0],
            vec![10.0, 10.0],
            vec![0.0, 4.0],
        ];
        let labels = vec![0, 0, -1, 1];
        let centroids = cluster_centroids(&data, &labels).unwrap();
        assert_eq!(centroids.len(), 2);
        assert_eq!(centroids[0], vec![2.0, 2.0]);
        assert_eq!(centroids[1], vec![0.0, 4.0]);
    }

    #[test]
    fn no_clusters_no_centroids() {
        let data = vec![vec![1.0, 1.0]];
        let labels = vec![-1];
        assert!(cluster_centroids(&data, &labels).unwrap().is_empty());
    }

    #[test]
    fn mismatched_labels_are_rejected() {
        let data = vec![vec![1.0, 1.0], vec![3.0, 3.0]];
        let labels = vec![0];
        assert!(matches!(
            cluster_centroids(&data, &labels),
            Err(Error::DimensionMismatch(_))
        ));
    }
}
